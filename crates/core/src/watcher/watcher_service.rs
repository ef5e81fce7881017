//! Long-running consumer of check-price tasks.
//!
//! Per delivery: decode, look up, fetch, reconcile. Every path ends in one of
//! three outcomes:
//!
//! | Outcome | Acked | Cause |
//! |---|---|---|
//! | `Reconciled` | yes | price compared and written if changed |
//! | `Dropped` | yes | malformed payload, unknown action, missing product, permanent fetch error, redelivery cap |
//! | `Retried` | no | store, cache or oracle temporarily unavailable |
//!
//! Retried deliveries become visible again once their lease expires.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::watch;

use super::reconciler::{PriceReconciler, ReconcileOutcome};
use super::watcher_config::WatcherConfig;
use crate::errors::{ErrorKind, Result};
use crate::tasks::{CheckPriceTask, TaskAction, TaskChannelTrait, TaskDelivery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Reconciled(ReconcileOutcome),
    Dropped { reason: String },
    Retried { reason: String },
}

impl TaskOutcome {
    fn dropped(reason: impl Into<String>) -> Self {
        TaskOutcome::Dropped {
            reason: reason.into(),
        }
    }

    pub fn should_ack(&self) -> bool {
        !matches!(self, TaskOutcome::Retried { .. })
    }
}

pub struct Watcher {
    channel: Arc<dyn TaskChannelTrait>,
    reconciler: Arc<PriceReconciler>,
    config: WatcherConfig,
}

impl Watcher {
    pub fn new(
        channel: Arc<dyn TaskChannelTrait>,
        reconciler: Arc<PriceReconciler>,
        config: WatcherConfig,
    ) -> Self {
        Self {
            channel,
            reconciler,
            config,
        }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Runs until `shutdown` turns true or its sender is dropped.
    ///
    /// An in-flight batch is finished before returning. Leases this consumer
    /// still holds are released on the way out.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Watcher {} consuming '{}' as group '{}'",
            self.config.consumer_id, self.config.topic, self.config.group
        );
        let backoff = self.config.poll_backoff;
        let mut interval = backoff.min;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let found_tasks = match self.poll_once().await {
                Ok(processed) => processed > 0,
                Err(e) => {
                    error!("Watcher poll failed: {}", e);
                    false
                }
            };

            if found_tasks {
                interval = backoff.min;
                continue;
            }

            interval = backoff.next_interval(interval, false);
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        match self
            .channel
            .release_consumer(&self.config.group, &self.config.consumer_id)
            .await
        {
            Ok(released) => info!(
                "Watcher {} stopped, released {} lease(s)",
                self.config.consumer_id, released
            ),
            Err(e) => warn!(
                "Watcher {} stopped, failed to release leases: {}",
                self.config.consumer_id, e
            ),
        }
    }

    /// Claims one batch and processes it with bounded concurrency.
    /// Returns the number of deliveries handled.
    pub async fn poll_once(&self) -> Result<usize> {
        let deliveries = self
            .channel
            .poll(
                &self.config.topic,
                &self.config.group,
                &self.config.consumer_id,
                self.config.batch_size,
            )
            .await?;
        let count = deliveries.len();
        if count == 0 {
            return Ok(0);
        }
        debug!("Watcher claimed {} task(s)", count);

        stream::iter(deliveries)
            .for_each_concurrent(self.config.concurrency.max(1), |delivery| async move {
                self.process_delivery(&delivery).await;
            })
            .await;

        self.reconciler.locks().prune_idle();
        Ok(count)
    }

    /// Handles one delivery and acks it unless it should be redelivered.
    pub async fn process_delivery(&self, delivery: &TaskDelivery) -> TaskOutcome {
        let outcome = self.handle(delivery).await;

        match &outcome {
            TaskOutcome::Reconciled(_) => {}
            TaskOutcome::Dropped { reason } => {
                warn!("Dropping task {}: {}", delivery.message_id, reason)
            }
            TaskOutcome::Retried { reason } => {
                warn!(
                    "Leaving task {} for redelivery (attempt {}): {}",
                    delivery.message_id, delivery.delivery_count, reason
                )
            }
        }

        if outcome.should_ack() {
            if let Err(e) = self.channel.ack(&self.config.group, delivery).await {
                // The lease will expire and the task comes back; reconciling
                // it again is harmless.
                error!("Failed to ack task {}: {}", delivery.message_id, e);
            }
        }
        outcome
    }

    async fn handle(&self, delivery: &TaskDelivery) -> TaskOutcome {
        if delivery.delivery_count > self.config.max_deliveries {
            return TaskOutcome::dropped(format!(
                "delivered {} times, limit is {}",
                delivery.delivery_count, self.config.max_deliveries
            ));
        }

        let task = match CheckPriceTask::decode(&delivery.payload) {
            Ok(task) => task,
            Err(e) => return TaskOutcome::dropped(e.to_string()),
        };

        if let TaskAction::Unknown(tag) = &task.action {
            return TaskOutcome::dropped(format!("unknown action '{}'", tag));
        }

        match self.reconciler.check_product_id(task.product_id).await {
            Ok(outcome) => TaskOutcome::Reconciled(outcome),
            Err(e) => match e.kind() {
                ErrorKind::TransientIo => TaskOutcome::Retried {
                    reason: format!("product {}: {}", task.product_id, e),
                },
                _ => TaskOutcome::dropped(format!("product {}: {}", task.product_id, e)),
            },
        }
    }
}

/// Spawns `watcher.run` on the runtime.
pub fn spawn_watcher(
    watcher: Arc<Watcher>,
    shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move { watcher.run(shutdown).await })
}
