use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use pricepulse_core::constants::{DEFAULT_CONSUMER_GROUP, DEFAULT_TASK_TOPIC};
use pricepulse_core::watcher::AlertPolicy;
use rust_decimal::Decimal;

/// Which price oracle the watcher and sweep call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleKind {
    Http,
    /// Always answers `fixed_price`; for local runs.
    Fixed,
}

impl FromStr for OracleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(OracleKind::Http),
            "fixed" => Ok(OracleKind::Fixed),
            other => Err(format!("unknown oracle '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub request_timeout: Duration,
    pub task_topic: String,
    pub consumer_group: String,
    pub watcher_concurrency: usize,
    pub watcher_batch_size: usize,
    pub task_lease: Duration,
    pub task_max_deliveries: u32,
    pub task_retention: Duration,
    pub fetch_timeout: Duration,
    pub sweep_interval: Duration,
    pub sweep_page_size: i64,
    pub oracle: OracleKind,
    pub fixed_price: Decimal,
    pub alert_policy: AlertPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: "./db/pricepulse.db".to_string(),
            request_timeout: Duration::from_millis(30_000),
            task_topic: DEFAULT_TASK_TOPIC.to_string(),
            consumer_group: DEFAULT_CONSUMER_GROUP.to_string(),
            watcher_concurrency: 4,
            watcher_batch_size: 16,
            task_lease: Duration::from_secs(60),
            task_max_deliveries: 5,
            task_retention: Duration::from_secs(72 * 60 * 60),
            fetch_timeout: Duration::from_millis(10_000),
            sweep_interval: Duration::from_secs(3600),
            sweep_page_size: 200,
            oracle: OracleKind::Http,
            fixed_price: Decimal::new(9999, 2),
            alert_policy: AlertPolicy::EveryChange,
        }
    }
}

/// Reads `key`, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid {}='{}': {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let listen_addr = env_or("PP_LISTEN_ADDR", defaults.listen_addr)?;
        let db_path = std::env::var("PP_DB_PATH").unwrap_or(defaults.db_path);
        let request_timeout_ms: u64 = env_or("PP_REQUEST_TIMEOUT_MS", 30_000)?;
        let task_topic = std::env::var("PP_TASK_TOPIC").unwrap_or(defaults.task_topic);
        let consumer_group =
            std::env::var("PP_CONSUMER_GROUP").unwrap_or(defaults.consumer_group);
        let lease_secs: u64 = env_or("PP_TASK_LEASE_SECS", 60)?;
        let retention_hours: u64 = env_or("PP_TASK_RETENTION_HOURS", 72)?;
        let fetch_timeout_ms: u64 = env_or("PP_FETCH_TIMEOUT_MS", 10_000)?;
        let sweep_interval_secs: u64 = env_or("PP_SWEEP_INTERVAL_SECS", 3600)?;
        let fixed_price: Decimal = env_or("PP_FIXED_PRICE", defaults.fixed_price)
            .context("PP_FIXED_PRICE must be a decimal")?;

        let config = Self {
            listen_addr,
            db_path,
            request_timeout: Duration::from_millis(request_timeout_ms),
            task_topic,
            consumer_group,
            watcher_concurrency: env_or("PP_WATCHER_CONCURRENCY", defaults.watcher_concurrency)?,
            watcher_batch_size: env_or("PP_WATCHER_BATCH_SIZE", defaults.watcher_batch_size)?,
            task_lease: Duration::from_secs(lease_secs),
            task_max_deliveries: env_or("PP_TASK_MAX_DELIVERIES", defaults.task_max_deliveries)?,
            task_retention: Duration::from_secs(retention_hours * 60 * 60),
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            sweep_page_size: env_or("PP_SWEEP_PAGE_SIZE", defaults.sweep_page_size)?,
            oracle: env_or("PP_ORACLE", defaults.oracle)?,
            fixed_price,
            alert_policy: env_or("PP_ALERT_POLICY", defaults.alert_policy)?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.watcher_concurrency == 0 || self.watcher_batch_size == 0 {
            return Err(anyhow!(
                "PP_WATCHER_CONCURRENCY and PP_WATCHER_BATCH_SIZE must be positive"
            ));
        }
        if self.task_max_deliveries == 0 {
            return Err(anyhow!("PP_TASK_MAX_DELIVERIES must be positive"));
        }
        if self.sweep_page_size <= 0 {
            return Err(anyhow!("PP_SWEEP_PAGE_SIZE must be positive"));
        }
        if self.sweep_interval.is_zero() {
            return Err(anyhow!("PP_SWEEP_INTERVAL_SECS must be positive"));
        }
        if self.fixed_price <= Decimal::ZERO {
            return Err(anyhow!("PP_FIXED_PRICE must be positive"));
        }
        Ok(())
    }
}
