//! SQLite-backed task channel.
//!
//! Messages live in `task_messages`. Per consumer group progress lives in
//! `task_deliveries`, one row per (message, group) created on first delivery.
//! A message is visible to a group while it is not acked and not under an
//! unexpired lease.

mod model;
mod repository;

pub use model::{NewTaskMessageDB, TaskDeliveryDB, TaskMessageDB};
pub use repository::SqliteTaskChannel;
