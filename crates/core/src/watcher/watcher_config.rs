use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONSUMER_GROUP, DEFAULT_TASK_TOPIC};

/// When a changed price at or below target raises an alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPolicy {
    /// Every reconcile that stores a new price at or below target alerts.
    #[default]
    EveryChange,
    /// Only the reconcile that moves the price from above target (or from
    /// never checked) to at or below target alerts.
    OnCrossing,
}

impl std::str::FromStr for AlertPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "every_change" => Ok(AlertPolicy::EveryChange),
            "on_crossing" => Ok(AlertPolicy::OnCrossing),
            other => Err(format!("unknown alert policy '{}'", other)),
        }
    }
}

/// Idle polling interval: resets to `min` after a non-empty poll and grows
/// by `multiplier` after each empty one, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollBackoff {
    pub min: Duration,
    pub max: Duration,
    pub multiplier: f64,
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(100),
            max: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl PollBackoff {
    pub fn next_interval(&self, current: Duration, found_tasks: bool) -> Duration {
        if found_tasks {
            return self.min;
        }
        current.mul_f64(self.multiplier).clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub topic: String,
    pub group: String,
    /// Identifies this process's leases on the channel.
    pub consumer_id: String,
    pub batch_size: usize,
    pub concurrency: usize,
    /// Deliveries beyond this count are dropped unprocessed.
    pub max_deliveries: u32,
    pub poll_backoff: PollBackoff,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TASK_TOPIC.to_string(),
            group: DEFAULT_CONSUMER_GROUP.to_string(),
            consumer_id: format!("watcher-{}", uuid::Uuid::new_v4()),
            batch_size: 16,
            concurrency: 4,
            max_deliveries: 5,
            poll_backoff: PollBackoff::default(),
        }
    }
}
