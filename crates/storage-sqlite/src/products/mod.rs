//! SQLite storage implementation for products.

mod model;
mod repository;

pub use model::{NewProductDB, ProductDB};
pub use repository::ProductRepository;
