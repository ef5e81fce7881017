use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price observed for a product URL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchedPrice {
    /// Current price in the product's currency.
    pub price: Decimal,

    /// Product title, when the upstream reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl FetchedPrice {
    pub fn new(price: Decimal) -> Self {
        Self { price, title: None }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
