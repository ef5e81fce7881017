//! PricePulse Market Data Crate
//!
//! This crate provides the price oracle used by the price-check pipeline:
//! given a product URL, return the product's current price.
//!
//! # Overview
//!
//! - [`provider::PriceProvider`] is the oracle contract the core depends on.
//! - [`provider::http::HttpPriceProvider`] reads a JSON price document from the
//!   product URL.
//! - [`provider::fixed::FixedPriceProvider`] always returns a configured price
//!   and is meant for local development and demos.
//!
//! Timeouts are applied by the caller so the same provider can be used with
//! different per-call budgets (watcher vs. sweep).
//!
//! # Errors
//!
//! Every failure is a [`errors::MarketDataError`], classified by
//! [`errors::RetryClass`] into terminal failures and transient ones that the
//! task channel may redeliver.

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::FetchedPrice;
pub use provider::PriceProvider;
