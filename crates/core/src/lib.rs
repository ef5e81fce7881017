//! PricePulse Core - Domain entities, services, and traits.
//!
//! This crate contains the price-check pipeline: the task producer, the
//! watcher that consumes check-price tasks, the reconciler both of them share,
//! and the product service with its cache-aside read path.
//! It is database-agnostic and defines traits that are implemented
//! by the `storage-sqlite` and `cache` crates.

pub mod cache;
pub mod constants;
pub mod errors;
pub mod events;
pub mod products;
pub mod tasks;
pub mod utils;
pub mod watcher;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
