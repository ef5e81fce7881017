use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;
use crate::tasks::tasks_model::TaskDelivery;

/// At-least-once task broker.
///
/// Messages are appended to a topic. Every consumer group sees every message;
/// within a group, a polled message is leased to one consumer and becomes
/// visible again when the lease expires without an ack.
#[async_trait]
pub trait TaskChannelTrait: Send + Sync {
    /// Appends a message and returns its id.
    async fn enqueue(&self, topic: &str, partition_key: &str, payload: &str) -> Result<i64>;

    /// Claims up to `max` visible messages of `topic` for `consumer_id`.
    async fn poll(
        &self,
        topic: &str,
        group: &str,
        consumer_id: &str,
        max: usize,
    ) -> Result<Vec<TaskDelivery>>;

    /// Marks a delivery as done for `group`. Acking twice is not an error.
    async fn ack(&self, group: &str, delivery: &TaskDelivery) -> Result<()>;

    /// Ends every lease held by `consumer_id`, making those messages visible
    /// to the group again. Returns the number of leases released.
    async fn release_consumer(&self, group: &str, consumer_id: &str) -> Result<usize>;

    /// Deletes messages older than `retention`. Returns the number removed.
    async fn purge_expired(&self, retention: Duration) -> Result<usize>;
}

/// Publishes check-price tasks.
#[async_trait]
pub trait TaskProducerTrait: Send + Sync {
    /// Makes exactly one enqueue attempt for `product_id`.
    async fn publish(&self, product_id: i64) -> Result<()>;
}
