use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::products::Product;

/// Key-value cache in front of the product store.
///
/// Entries are derived data: every write applies the 24h expiry and the store
/// wins on any disagreement. Callers treat every error as a miss.
#[async_trait]
pub trait ProductCacheTrait: Send + Sync {
    async fn set_price(&self, product_id: i64, price: Decimal) -> Result<()>;
    async fn get_price(&self, product_id: i64) -> Result<Option<Decimal>>;
    async fn get(&self, product_id: i64) -> Result<Option<Product>>;
    async fn set_product(&self, product: &Product) -> Result<()>;
    /// Removes both the price and the product entry.
    async fn delete(&self, product_id: i64) -> Result<()>;
}
