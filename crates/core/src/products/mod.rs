//! Products module - domain models, services, and traits.

mod products_model;
mod products_service;
mod products_traits;


pub use products_model::{NewProduct, Product, SweepSummary, TrackedProduct};
pub use products_service::ProductService;
pub use products_traits::{ProductRepositoryTrait, ProductServiceTrait};
