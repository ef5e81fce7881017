//! Cache contract for the cache-aside read path.

mod cache_traits;

pub use cache_traits::ProductCacheTrait;

use crate::constants::{PRICE_KEY_PREFIX, PRODUCT_KEY_PREFIX};

/// Key holding the last-known price of a product.
pub fn price_key(product_id: i64) -> String {
    format!("{}:{}", PRICE_KEY_PREFIX, product_id)
}

/// Key holding the full product record.
pub fn product_key(product_id: i64) -> String {
    format!("{}:{}", PRODUCT_KEY_PREFIX, product_id)
}
