//! SQLite storage implementation for PricePulse.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository and channel traits defined in `pricepulse-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The product store
//! - The durable task channel (topic log with per-group delivery leases)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//! The core crate is database-agnostic and works with traits.
//!
//! ```text
//!        core (domain)
//!              │
//!              ▼
//!    storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod products;
pub mod task_queue;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use products::ProductRepository;
pub use task_queue::SqliteTaskChannel;

// Re-export from pricepulse-core for convenience
pub use pricepulse_core::errors::{DatabaseError, Error, Result};
