//! Price provider abstractions and implementations.
//!
//! This module contains:
//! - The `PriceProvider` trait that all oracles implement
//! - `HttpPriceProvider`, which reads a JSON price document from the product URL
//! - `FixedPriceProvider`, which always answers with the same price

mod traits;

pub mod fixed;
pub mod http;

pub use fixed::FixedPriceProvider;
pub use http::HttpPriceProvider;
pub use traits::PriceProvider;
