use std::time::Duration;

/// Title stored for a product until a fetch reports its real title.
pub const PLACEHOLDER_TITLE: &str = "Pending...";

/// Expiry applied to every cache entry.
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache key prefix for the last-known price of a product.
pub const PRICE_KEY_PREFIX: &str = "product_price";

/// Cache key prefix for a full product record.
pub const PRODUCT_KEY_PREFIX: &str = "product";

/// Default topic carrying price-check tasks.
pub const DEFAULT_TASK_TOPIC: &str = "product_updates";

/// Default consumer group of the watcher.
pub const DEFAULT_CONSUMER_GROUP: &str = "watcher-group";

/// Upper bound for a single page of products.
pub const MAX_PAGE_SIZE: i64 = 500;
