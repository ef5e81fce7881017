//! Price provider trait definition.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::FetchedPrice;

/// Trait for price oracles.
///
/// Implementations must be safe to call concurrently from the watcher pool
/// and the periodic sweep. They must not apply their own retry loop: a
/// transient failure is reported as such and the caller decides whether the
/// task is redelivered.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use pricepulse_market_data::{FetchedPrice, MarketDataError, PriceProvider};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl PriceProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     async fn fetch_current_price(&self, url: &str) -> Result<FetchedPrice, MarketDataError> {
///         // ...
///     }
/// }
/// ```
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Used in logs and error messages.
    fn id(&self) -> &'static str;

    /// Fetch the current price of the product at `url`.
    async fn fetch_current_price(&self, url: &str) -> Result<FetchedPrice, MarketDataError>;
}
