use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use moka::future::Cache;
use pricepulse_core::cache::{price_key, product_key, ProductCacheTrait};
use pricepulse_core::constants::CACHE_TTL;
use pricepulse_core::errors::{Error, Result};
use pricepulse_core::products::Product;
use rust_decimal::Decimal;

/// Entry cap across both key families (two entries per product).
pub const DEFAULT_MAX_CAPACITY: u64 = 20_000;

/// [`ProductCacheTrait`] backed by a `moka` cache with a fixed TTL.
///
/// Prices are stored as decimal strings and products as JSON. An entry that
/// no longer decodes is treated as a miss and evicted.
pub struct MemoryProductCache {
    cache: Cache<String, String>,
}

impl MemoryProductCache {
    pub fn new() -> Self {
        Self::with_settings(CACHE_TTL, DEFAULT_MAX_CAPACITY)
    }

    pub fn with_settings(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }

    /// Applies pending evictions, expired entries included.
    pub async fn purge_expired(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Approximate number of live entries; exact after [`Self::purge_expired`].
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    async fn evict(&self, key: &str, reason: &str) {
        warn!("Evicting cache entry '{}': {}", key, reason);
        self.cache.invalidate(key).await;
    }
}

impl Default for MemoryProductCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductCacheTrait for MemoryProductCache {
    async fn set_price(&self, product_id: i64, price: Decimal) -> Result<()> {
        self.cache
            .insert(price_key(product_id), price.to_string())
            .await;
        Ok(())
    }

    async fn get_price(&self, product_id: i64) -> Result<Option<Decimal>> {
        let key = price_key(product_id);
        let Some(raw) = self.cache.get(key.as_str()).await else {
            return Ok(None);
        };
        match Decimal::from_str(&raw) {
            Ok(price) => Ok(Some(price)),
            Err(e) => {
                self.evict(&key, &e.to_string()).await;
                Ok(None)
            }
        }
    }

    async fn get(&self, product_id: i64) -> Result<Option<Product>> {
        let key = product_key(product_id);
        let Some(raw) = self.cache.get(key.as_str()).await else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(product) => Ok(Some(product)),
            Err(e) => {
                self.evict(&key, &e.to_string()).await;
                Ok(None)
            }
        }
    }

    async fn set_product(&self, product: &Product) -> Result<()> {
        let json = serde_json::to_string(product)
            .map_err(|e| Error::Cache(format!("Failed to encode product {}: {}", product.id, e)))?;
        self.cache.insert(product_key(product.id), json).await;
        Ok(())
    }

    async fn delete(&self, product_id: i64) -> Result<()> {
        self.cache.invalidate(price_key(product_id).as_str()).await;
        self.cache.invalidate(product_key(product_id).as_str()).await;
        Ok(())
    }
}
