//! Task payloads and deliveries.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

const CHECK_PRICE_TAG: &str = "check_price";

/// Kind of work a task asks for.
///
/// Unknown tags are kept rather than rejected so that newer producers can
/// add kinds without breaking older consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskAction {
    CheckPrice,
    Unknown(String),
}

impl From<String> for TaskAction {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            CHECK_PRICE_TAG => TaskAction::CheckPrice,
            _ => TaskAction::Unknown(tag),
        }
    }
}

impl From<TaskAction> for String {
    fn from(action: TaskAction) -> Self {
        match action {
            TaskAction::CheckPrice => CHECK_PRICE_TAG.to_string(),
            TaskAction::Unknown(tag) => tag,
        }
    }
}

/// A request to re-check the price of one product.
///
/// Wire form: `{"product_id":1,"action":"check_price"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPriceTask {
    pub product_id: i64,
    pub action: TaskAction,
}

impl CheckPriceTask {
    pub fn check_price(product_id: i64) -> Self {
        Self {
            product_id,
            action: TaskAction::CheckPrice,
        }
    }

    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::Unexpected(format!("Failed to encode task: {}", e)))
    }

    /// Decodes a payload. Malformed JSON and non-positive ids are decode
    /// errors; an unknown action is not.
    pub fn decode(payload: &str) -> Result<Self> {
        let task: CheckPriceTask =
            serde_json::from_str(payload).map_err(|e| Error::TaskDecode(e.to_string()))?;
        if task.product_id <= 0 {
            return Err(Error::TaskDecode(format!(
                "product_id must be positive, got {}",
                task.product_id
            )));
        }
        Ok(task)
    }
}

/// A message handed to a consumer by the task channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDelivery {
    pub message_id: i64,
    pub topic: String,
    pub partition_key: String,
    pub payload: String,
    /// How many times this message has been handed to the group, this
    /// delivery included.
    pub delivery_count: u32,
    pub enqueued_at: NaiveDateTime,
}
