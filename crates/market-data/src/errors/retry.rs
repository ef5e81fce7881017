/// Classification for retry policy.
///
/// Used by the watcher to decide whether a failed fetch should be left on the
/// task channel for redelivery or dropped for good.
///
/// # Behavior Summary
///
/// | Class | Acknowledge task? | Redelivered? |
/// |-------|-------------------|--------------|
/// | `Never` | Yes | No |
/// | `WithBackoff` | No | Yes, after the delivery lease expires |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad URL, unparsable document, or a product that no
    /// longer exists upstream. The request is fundamentally invalid.
    Never,

    /// Transient failure such as a timeout, rate limiting or an upstream 5xx.
    /// The channel owns the redelivery timing.
    WithBackoff,
}
