//! Domain event types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Domain events emitted by core services after successful mutations.
///
/// Emission is a side effect only: no domain operation depends on a sink
/// accepting the event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A product was registered for tracking.
    ProductTracked {
        product_id: i64,
        url: String,
        target_price: Decimal,
    },

    /// A reconcile stored a new current price.
    PriceChanged {
        product_id: i64,
        old_price: Decimal,
        new_price: Decimal,
    },

    /// The current price is at or below the product's target price.
    PriceTargetReached {
        product_id: i64,
        url: String,
        price: Decimal,
        target_price: Decimal,
    },
}

impl DomainEvent {
    pub fn product_tracked(product_id: i64, url: impl Into<String>, target_price: Decimal) -> Self {
        Self::ProductTracked {
            product_id,
            url: url.into(),
            target_price,
        }
    }

    pub fn price_changed(product_id: i64, old_price: Decimal, new_price: Decimal) -> Self {
        Self::PriceChanged {
            product_id,
            old_price,
            new_price,
        }
    }

    pub fn price_target_reached(
        product_id: i64,
        url: impl Into<String>,
        price: Decimal,
        target_price: Decimal,
    ) -> Self {
        Self::PriceTargetReached {
            product_id,
            url: url.into(),
            price,
            target_price,
        }
    }

    /// Product the event refers to.
    pub fn product_id(&self) -> i64 {
        match self {
            Self::ProductTracked { product_id, .. }
            | Self::PriceChanged { product_id, .. }
            | Self::PriceTargetReached { product_id, .. } => *product_id,
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Self::PriceTargetReached { .. })
    }
}
