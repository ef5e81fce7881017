use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::products::products_model::{NewProduct, Product, SweepSummary, TrackedProduct};

/// Trait for product repository operations.
///
/// Reads are synchronous (pooled connections); writes are async because they
/// are serialized through a single writer.
#[async_trait]
pub trait ProductRepositoryTrait: Send + Sync {
    /// Inserts a product and returns it with its assigned id and timestamps.
    async fn create(&self, new_product: NewProduct) -> Result<Product>;
    fn get_by_id(&self, product_id: i64) -> Result<Product>;
    /// Sets the current price and bumps `updated_at`. NotFound when no row.
    async fn update_price(&self, product_id: i64, price: Decimal) -> Result<()>;
    fn get_all(&self) -> Result<Vec<Product>>;
    /// Products with `id > after_id`, ordered by id, at most `limit` rows.
    fn list_page(&self, after_id: i64, limit: i64) -> Result<Vec<Product>>;
    async fn update_title(&self, product_id: i64, title: &str) -> Result<()>;
    async fn update_target_price(&self, product_id: i64, target_price: Decimal) -> Result<Product>;
}

/// Trait for product service operations
#[async_trait]
pub trait ProductServiceTrait: Send + Sync {
    async fn track_product(&self, url: &str, target_price: Decimal) -> Result<TrackedProduct>;
    async fn create(&self, new_product: NewProduct) -> Result<Product>;
    async fn get_by_id(&self, product_id: i64) -> Result<Product>;
    async fn check_prices(&self) -> Result<SweepSummary>;
    async fn update_target_price(&self, product_id: i64, target_price: Decimal) -> Result<Product>;
    fn list_products(&self, after_id: i64, limit: i64) -> Result<Vec<Product>>;
}
