//! Database models for the task queue.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Text, Timestamp};

use pricepulse_core::tasks::TaskDelivery;

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::task_messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskMessageDB {
    pub id: i64,
    pub topic: String,
    pub partition_key: String,
    pub payload: String,
    pub enqueued_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::task_messages)]
pub struct NewTaskMessageDB {
    pub topic: String,
    pub partition_key: String,
    pub payload: String,
    pub enqueued_at: NaiveDateTime,
}

#[derive(Queryable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::task_deliveries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskDeliveryDB {
    pub message_id: i64,
    pub consumer_group: String,
    pub consumer_id: Option<String>,
    pub delivery_count: i32,
    pub leased_until: Option<NaiveDateTime>,
    pub acked_at: Option<NaiveDateTime>,
}

/// A message visible to a group, with the number of times the group has
/// already received it.
#[derive(QueryableByName, Debug, Clone)]
pub struct VisibleMessageRow {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub topic: String,
    #[diesel(sql_type = Text)]
    pub partition_key: String,
    #[diesel(sql_type = Text)]
    pub payload: String,
    #[diesel(sql_type = Timestamp)]
    pub enqueued_at: NaiveDateTime,
    #[diesel(sql_type = Integer)]
    pub delivery_count: i32,
}

impl VisibleMessageRow {
    /// The delivery this row becomes once claimed.
    pub fn into_delivery(self) -> TaskDelivery {
        TaskDelivery {
            message_id: self.id,
            topic: self.topic,
            partition_key: self.partition_key,
            payload: self.payload,
            delivery_count: u32::try_from(self.delivery_count + 1).unwrap_or(u32::MAX),
            enqueued_at: self.enqueued_at,
        }
    }
}

#[derive(QueryableByName, Debug)]
pub struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}
