//! In-process cache adapter.
//!
//! [`MemoryProductCache`] implements the core cache contract on a `moka`
//! cache. Values are serialized and keys follow the `product_price:{id}` /
//! `product:{id}` layout, so the adapter reads like the remote caches it
//! stands in for.

mod product_cache;

pub use product_cache::{MemoryProductCache, DEFAULT_MAX_CAPACITY};
