use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text, Timestamp};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

use pricepulse_core::errors::{Error, Result};
use pricepulse_core::tasks::{TaskChannelTrait, TaskDelivery};

use super::model::{CountRow, NewTaskMessageDB, TaskDeliveryDB, VisibleMessageRow};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{task_deliveries, task_messages};

const VISIBLE_MESSAGES_SQL: &str = "
    SELECT m.id, m.topic, m.partition_key, m.payload, m.enqueued_at,
           COALESCE(d.delivery_count, 0) AS delivery_count
    FROM task_messages m
    LEFT JOIN task_deliveries d
           ON d.message_id = m.id AND d.consumer_group = ?
    WHERE m.topic = ?
      AND d.acked_at IS NULL
      AND (d.leased_until IS NULL OR d.leased_until <= ?)
    ORDER BY m.id
    LIMIT ?";

const PENDING_COUNT_SQL: &str = "
    SELECT COUNT(*) AS count
    FROM task_messages m
    LEFT JOIN task_deliveries d
           ON d.message_id = m.id AND d.consumer_group = ?
    WHERE m.topic = ?
      AND d.acked_at IS NULL";

/// Durable [`TaskChannelTrait`] on SQLite.
///
/// Every state change goes through the writer actor, so a poll's
/// select-then-lease runs in one immediate transaction and two consumers can
/// never lease the same message for the same group.
pub struct SqliteTaskChannel {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
    lease: Duration,
}

fn to_chrono(duration: Duration) -> Result<chrono::Duration> {
    chrono::Duration::from_std(duration)
        .map_err(|e| Error::Unexpected(format!("Duration out of range: {}", e)))
}

impl SqliteTaskChannel {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
        lease: Duration,
    ) -> Self {
        SqliteTaskChannel {
            pool,
            writer,
            lease,
        }
    }

    pub fn lease(&self) -> Duration {
        self.lease
    }

    /// Number of messages of `topic` that `group` has not acked yet.
    pub fn pending(&self, topic: &str, group: &str) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let row = sql_query(PENDING_COUNT_SQL)
            .bind::<Text, _>(group.to_string())
            .bind::<Text, _>(topic.to_string())
            .get_result::<CountRow>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(row.count)
    }
}

#[async_trait]
impl TaskChannelTrait for SqliteTaskChannel {
    async fn enqueue(&self, topic: &str, partition_key: &str, payload: &str) -> Result<i64> {
        let row = NewTaskMessageDB {
            topic: topic.to_string(),
            partition_key: partition_key.to_string(),
            payload: payload.to_string(),
            enqueued_at: Utc::now().naive_utc(),
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<i64> {
                let message_id = diesel::insert_into(task_messages::table)
                    .values(&row)
                    .returning(task_messages::id)
                    .get_result::<i64>(conn)
                    .map_err(StorageError::from)?;
                Ok(message_id)
            })
            .await
    }

    async fn poll(
        &self,
        topic: &str,
        group: &str,
        consumer_id: &str,
        max: usize,
    ) -> Result<Vec<TaskDelivery>> {
        if max == 0 {
            return Ok(Vec::new());
        }
        let topic = topic.to_string();
        let group = group.to_string();
        let consumer_id = consumer_id.to_string();
        let limit = i64::try_from(max).unwrap_or(i64::MAX);
        let lease = to_chrono(self.lease)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Vec<TaskDelivery>> {
                let now = Utc::now().naive_utc();
                let leased_until: NaiveDateTime = now + lease;

                let visible = sql_query(VISIBLE_MESSAGES_SQL)
                    .bind::<Text, _>(group.clone())
                    .bind::<Text, _>(topic.clone())
                    .bind::<Timestamp, _>(now)
                    .bind::<BigInt, _>(limit)
                    .load::<VisibleMessageRow>(conn)
                    .map_err(StorageError::from)?;

                let mut deliveries = Vec::with_capacity(visible.len());
                for row in visible {
                    let delivery = row.into_delivery();
                    let lease_row = TaskDeliveryDB {
                        message_id: delivery.message_id,
                        consumer_group: group.clone(),
                        consumer_id: Some(consumer_id.clone()),
                        delivery_count: i32::try_from(delivery.delivery_count)
                            .unwrap_or(i32::MAX),
                        leased_until: Some(leased_until),
                        acked_at: None,
                    };
                    diesel::insert_into(task_deliveries::table)
                        .values(&lease_row)
                        .on_conflict((
                            task_deliveries::message_id,
                            task_deliveries::consumer_group,
                        ))
                        .do_update()
                        .set((
                            task_deliveries::consumer_id.eq(lease_row.consumer_id.clone()),
                            task_deliveries::delivery_count.eq(lease_row.delivery_count),
                            task_deliveries::leased_until.eq(lease_row.leased_until),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    deliveries.push(delivery);
                }

                if !deliveries.is_empty() {
                    debug!(
                        "Leased {} message(s) of '{}' to {} in group '{}'",
                        deliveries.len(),
                        topic,
                        consumer_id,
                        group
                    );
                }
                Ok(deliveries)
            })
            .await
    }

    async fn ack(&self, group: &str, delivery: &TaskDelivery) -> Result<()> {
        let group = group.to_string();
        let message_id = delivery.message_id;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(
                    task_deliveries::table
                        .filter(task_deliveries::message_id.eq(message_id))
                        .filter(task_deliveries::consumer_group.eq(&group))
                        .filter(task_deliveries::acked_at.is_null()),
                )
                .set((
                    task_deliveries::acked_at.eq(Some(Utc::now().naive_utc())),
                    task_deliveries::leased_until.eq(None::<NaiveDateTime>),
                    task_deliveries::consumer_id.eq(None::<String>),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn release_consumer(&self, group: &str, consumer_id: &str) -> Result<usize> {
        let group = group.to_string();
        let consumer_id = consumer_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let released = diesel::update(
                    task_deliveries::table
                        .filter(task_deliveries::consumer_group.eq(&group))
                        .filter(task_deliveries::consumer_id.eq(&consumer_id))
                        .filter(task_deliveries::acked_at.is_null()),
                )
                .set((
                    task_deliveries::leased_until.eq(None::<NaiveDateTime>),
                    task_deliveries::consumer_id.eq(None::<String>),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(released)
            })
            .await
    }

    async fn purge_expired(&self, retention: Duration) -> Result<usize> {
        let cutoff = Utc::now().naive_utc() - to_chrono(retention)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let expired = task_messages::table
                    .filter(task_messages::enqueued_at.lt(cutoff))
                    .select(task_messages::id);
                diesel::delete(
                    task_deliveries::table.filter(task_deliveries::message_id.eq_any(expired)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                let purged = diesel::delete(
                    task_messages::table.filter(task_messages::enqueued_at.lt(cutoff)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(purged)
            })
            .await
    }
}
