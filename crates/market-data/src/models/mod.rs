//! Data models returned by price providers.

mod price;

pub use price::FetchedPrice;
