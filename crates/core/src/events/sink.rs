//! Sink through which services report domain events.

use std::sync::{Arc, Mutex};

use super::DomainEvent;

/// Receives domain events after a mutation has been committed.
///
/// `emit()` runs on the caller's task, so implementations must not block.
/// Delivery is best-effort and never fails the mutation that produced it.
pub trait DomainEventSink: Send + Sync {
    fn emit(&self, event: DomainEvent);
}

/// Records every event in memory so tests can assert on what was raised.
#[derive(Clone, Default)]
pub struct MockDomainEventSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl MockDomainEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Only the target-reached alerts, in emission order.
    pub fn alerts(&self) -> Vec<DomainEvent> {
        self.events().into_iter().filter(|e| e.is_alert()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events
            .lock()
            .map(|events| events.is_empty())
            .unwrap_or(true)
    }
}

impl DomainEventSink for MockDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
