//! Provider that always reports the same price.
//!
//! Useful for local runs where product URLs do not serve a price document.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::FetchedPrice;
use crate::provider::PriceProvider;

const PROVIDER_ID: &str = "FIXED";

/// Price reported when no explicit price is configured.
pub const DEFAULT_FIXED_PRICE: Decimal = Decimal::from_parts(9999, 0, 0, false, 2);

pub struct FixedPriceProvider {
    price: Decimal,
}

impl FixedPriceProvider {
    pub fn new(price: Decimal) -> Self {
        Self { price }
    }
}

impl Default for FixedPriceProvider {
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_PRICE)
    }
}

#[async_trait]
impl PriceProvider for FixedPriceProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_current_price(&self, url: &str) -> Result<FetchedPrice, MarketDataError> {
        if url.trim().is_empty() {
            return Err(MarketDataError::InvalidUrl(url.to_string()));
        }
        log::debug!("{} answering {} for {}", PROVIDER_ID, self.price, url);
        Ok(FetchedPrice::new(self.price))
    }
}
