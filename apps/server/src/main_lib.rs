use std::sync::Arc;

use crate::{
    config::{Config, OracleKind},
    domain_events::LoggingEventSink,
};
use pricepulse_cache::MemoryProductCache;
use pricepulse_core::{
    cache::ProductCacheTrait,
    events::DomainEventSink,
    products::{ProductRepositoryTrait, ProductService, ProductServiceTrait},
    tasks::{ChannelTaskProducer, TaskChannelTrait, TaskProducerTrait},
    watcher::{PriceReconciler, Watcher, WatcherConfig},
};
use pricepulse_market_data::provider::{FixedPriceProvider, HttpPriceProvider, PriceProvider};
use pricepulse_storage_sqlite::{db, ProductRepository, SqliteTaskChannel};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub product_service: Arc<dyn ProductServiceTrait>,
    pub watcher: Arc<Watcher>,
    /// Held for retention purges; the service and watcher see it as a trait object.
    pub task_channel: Arc<SqliteTaskChannel>,
    pub product_cache: Arc<MemoryProductCache>,
}

pub fn init_tracing() {
    let log_format = std::env::var("PP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

fn build_provider(config: &Config) -> Arc<dyn PriceProvider> {
    match config.oracle {
        OracleKind::Http => Arc::new(HttpPriceProvider::with_timeout(config.fetch_timeout)),
        OracleKind::Fixed => {
            tracing::warn!(
                "Using the fixed price oracle ({}); prices are not real",
                config.fixed_price
            );
            Arc::new(FixedPriceProvider::new(config.fixed_price))
        }
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", config.db_path);

    let pool = db::create_pool(&config.db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let event_sink: Arc<dyn DomainEventSink> = Arc::new(LoggingEventSink::new());

    let product_repository: Arc<dyn ProductRepositoryTrait> =
        Arc::new(ProductRepository::new(pool.clone(), writer.clone()));
    let task_channel = Arc::new(SqliteTaskChannel::new(
        pool.clone(),
        writer.clone(),
        config.task_lease,
    ));
    let channel: Arc<dyn TaskChannelTrait> = task_channel.clone();
    let product_cache = Arc::new(MemoryProductCache::new());
    let cache: Arc<dyn ProductCacheTrait> = product_cache.clone();
    let provider = build_provider(config);

    let reconciler = Arc::new(PriceReconciler::new(
        product_repository.clone(),
        cache.clone(),
        provider,
        event_sink.clone(),
        config.fetch_timeout,
        config.alert_policy,
    ));

    let producer: Arc<dyn TaskProducerTrait> = Arc::new(ChannelTaskProducer::new(
        channel.clone(),
        config.task_topic.clone(),
    ));

    let product_service: Arc<dyn ProductServiceTrait> = Arc::new(ProductService::new(
        product_repository,
        cache,
        producer,
        reconciler.clone(),
        event_sink,
        config.sweep_page_size,
    ));

    let watcher_config = WatcherConfig {
        topic: config.task_topic.clone(),
        group: config.consumer_group.clone(),
        batch_size: config.watcher_batch_size,
        concurrency: config.watcher_concurrency,
        max_deliveries: config.task_max_deliveries,
        ..WatcherConfig::default()
    };
    let watcher = Arc::new(Watcher::new(channel, reconciler, watcher_config));

    Ok(Arc::new(AppState {
        product_service,
        watcher,
        task_channel,
        product_cache,
    }))
}
