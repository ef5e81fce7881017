//! Domain events bridge for the web server.
//!
//! The core emits tracking, price-change and price-target events through
//! [`DomainEventSink`]. The server has no push transport, so alerts are
//! written to the log where an operator or log shipper picks them up.

use pricepulse_core::events::{DomainEvent, DomainEventSink};

#[derive(Clone, Default)]
pub struct LoggingEventSink;

impl LoggingEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl DomainEventSink for LoggingEventSink {
    fn emit(&self, event: DomainEvent) {
        match &event {
            DomainEvent::PriceTargetReached {
                product_id,
                url,
                price,
                target_price,
            } => {
                tracing::warn!(
                    product_id = *product_id,
                    url = %url,
                    price = %price,
                    target_price = %target_price,
                    "Price target reached"
                );
            }
            DomainEvent::PriceChanged {
                product_id,
                old_price,
                new_price,
            } => {
                tracing::info!(
                    product_id = *product_id,
                    old_price = %old_price,
                    new_price = %new_price,
                    "Price changed"
                );
            }
            DomainEvent::ProductTracked { product_id, url, .. } => {
                tracing::debug!(product_id = *product_id, url = %url, "Product tracked");
            }
        }
    }
}
