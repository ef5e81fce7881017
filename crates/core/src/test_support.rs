//! In-memory doubles shared by the service and watcher tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use pricepulse_market_data::{FetchedPrice, MarketDataError, PriceProvider};
use rust_decimal::Decimal;

use crate::cache::ProductCacheTrait;
use crate::errors::{DatabaseError, Error, Result};
use crate::events::MockDomainEventSink;
use crate::products::{NewProduct, Product, ProductRepositoryTrait, ProductService};
use crate::tasks::{ChannelTaskProducer, TaskChannelTrait, TaskDelivery};
use crate::watcher::{AlertPolicy, PollBackoff, PriceReconciler, Watcher, WatcherConfig};

/// Ordered record of store and cache calls, shared between doubles.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

// =========================================================================
// Mock ProductRepository
// =========================================================================

#[derive(Clone, Default)]
pub struct MockProductRepository {
    products: Arc<Mutex<Vec<Product>>>,
    fail_reads: Arc<Mutex<bool>>,
    log: CallLog,
}

impl MockProductRepository {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    pub fn product(&self, product_id: i64) -> Option<Product> {
        self.products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
    }

    /// Inserts a product directly, bypassing the call log.
    pub fn seed(&self, url: &str, current_price: Decimal, target_price: Decimal) -> Product {
        let mut products = self.products.lock().unwrap();
        let now = Utc::now().naive_utc();
        let product = Product {
            id: products.len() as i64 + 1,
            url: url.to_string(),
            title: crate::constants::PLACEHOLDER_TITLE.to_string(),
            current_price,
            target_price,
            created_at: now,
            updated_at: now,
        };
        products.push(product.clone());
        product
    }

    fn check_reads(&self) -> Result<()> {
        if *self.fail_reads.lock().unwrap() {
            return Err(Error::Database(DatabaseError::ConnectionFailed(
                "database is locked".to_string(),
            )));
        }
        Ok(())
    }

    fn not_found(product_id: i64) -> Error {
        Error::Database(DatabaseError::NotFound(format!(
            "Product {} not found",
            product_id
        )))
    }

    fn modify(&self, product_id: i64, apply: impl FnOnce(&mut Product)) -> Result<Product> {
        let mut products = self.products.lock().unwrap();
        let product = products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| Self::not_found(product_id))?;
        apply(product);
        product.updated_at = Utc::now().naive_utc();
        Ok(product.clone())
    }
}

#[async_trait]
impl ProductRepositoryTrait for MockProductRepository {
    async fn create(&self, new_product: NewProduct) -> Result<Product> {
        self.log.record("store.create");
        let mut products = self.products.lock().unwrap();
        let now = Utc::now().naive_utc();
        let product = Product {
            id: products.len() as i64 + 1,
            url: new_product.url.clone(),
            title: new_product.title_or_placeholder(),
            current_price: new_product.current_price_or_zero(),
            target_price: new_product.target_price,
            created_at: now,
            updated_at: now,
        };
        products.push(product.clone());
        Ok(product)
    }

    fn get_by_id(&self, product_id: i64) -> Result<Product> {
        self.log.record(format!("store.get_by_id:{}", product_id));
        self.check_reads()?;
        self.product(product_id)
            .ok_or_else(|| Self::not_found(product_id))
    }

    async fn update_price(&self, product_id: i64, price: Decimal) -> Result<()> {
        self.log.record(format!("store.update_price:{}", product_id));
        self.modify(product_id, |p| p.current_price = price)?;
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Product>> {
        self.check_reads()?;
        Ok(self.products.lock().unwrap().clone())
    }

    fn list_page(&self, after_id: i64, limit: i64) -> Result<Vec<Product>> {
        self.log.record(format!("store.list_page:{}", after_id));
        self.check_reads()?;
        let mut products: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.id > after_id)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        products.truncate(limit as usize);
        Ok(products)
    }

    async fn update_title(&self, product_id: i64, title: &str) -> Result<()> {
        self.log.record(format!("store.update_title:{}", product_id));
        let title = title.to_string();
        self.modify(product_id, |p| p.title = title)?;
        Ok(())
    }

    async fn update_target_price(&self, product_id: i64, target_price: Decimal) -> Result<Product> {
        self.log
            .record(format!("store.update_target_price:{}", product_id));
        self.modify(product_id, |p| p.target_price = target_price)
    }
}

// =========================================================================
// Mock ProductCache
// =========================================================================

#[derive(Clone, Default)]
pub struct MockProductCache {
    prices: Arc<Mutex<HashMap<i64, Decimal>>>,
    products: Arc<Mutex<HashMap<i64, Product>>>,
    fail_all: Arc<Mutex<bool>>,
    log: CallLog,
}

impl MockProductCache {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn set_fail_all(&self, fail: bool) {
        *self.fail_all.lock().unwrap() = fail;
    }

    pub fn cached_price(&self, product_id: i64) -> Option<Decimal> {
        self.prices.lock().unwrap().get(&product_id).copied()
    }

    pub fn cached_product(&self, product_id: i64) -> Option<Product> {
        self.products.lock().unwrap().get(&product_id).cloned()
    }

    fn check(&self) -> Result<()> {
        if *self.fail_all.lock().unwrap() {
            return Err(Error::Cache("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductCacheTrait for MockProductCache {
    async fn set_price(&self, product_id: i64, price: Decimal) -> Result<()> {
        self.log.record(format!("cache.set_price:{}", product_id));
        self.check()?;
        self.prices.lock().unwrap().insert(product_id, price);
        Ok(())
    }

    async fn get_price(&self, product_id: i64) -> Result<Option<Decimal>> {
        self.check()?;
        Ok(self.cached_price(product_id))
    }

    async fn get(&self, product_id: i64) -> Result<Option<Product>> {
        self.log.record(format!("cache.get:{}", product_id));
        self.check()?;
        Ok(self.cached_product(product_id))
    }

    async fn set_product(&self, product: &Product) -> Result<()> {
        self.log.record(format!("cache.set_product:{}", product.id));
        self.check()?;
        self.products
            .lock()
            .unwrap()
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn delete(&self, product_id: i64) -> Result<()> {
        self.log.record(format!("cache.delete:{}", product_id));
        self.check()?;
        self.prices.lock().unwrap().remove(&product_id);
        self.products.lock().unwrap().remove(&product_id);
        Ok(())
    }
}

// =========================================================================
// Mock TaskChannel
// =========================================================================

#[derive(Debug, Clone)]
pub struct MockMessage {
    pub id: i64,
    pub topic: String,
    pub partition_key: String,
    pub payload: String,
    pub delivery_count: u32,
    pub acked: bool,
    pub leased_by: Option<String>,
}

/// Single-group in-memory channel. Leases never expire on their own; tests
/// call [`MockTaskChannel::expire_leases`] instead.
#[derive(Clone, Default)]
pub struct MockTaskChannel {
    messages: Arc<Mutex<Vec<MockMessage>>>,
    fail_enqueue: Arc<Mutex<bool>>,
    enqueue_attempts: Arc<AtomicUsize>,
    released: Arc<Mutex<Vec<String>>>,
}

impl MockTaskChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_enqueue(&self, fail: bool) {
        *self.fail_enqueue.lock().unwrap() = fail;
    }

    pub fn enqueue_attempts(&self) -> usize {
        self.enqueue_attempts.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<MockMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn push_raw(&self, payload: &str) -> i64 {
        let mut messages = self.messages.lock().unwrap();
        let id = messages.len() as i64 + 1;
        messages.push(MockMessage {
            id,
            topic: crate::constants::DEFAULT_TASK_TOPIC.to_string(),
            partition_key: String::new(),
            payload: payload.to_string(),
            delivery_count: 0,
            acked: false,
            leased_by: None,
        });
        id
    }

    pub fn is_acked(&self, message_id: i64) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.id == message_id && m.acked)
    }

    pub fn pending(&self) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| !m.acked)
            .count()
    }

    pub fn expire_leases(&self) {
        for message in self.messages.lock().unwrap().iter_mut() {
            message.leased_by = None;
        }
    }

    pub fn released_consumers(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskChannelTrait for MockTaskChannel {
    async fn enqueue(&self, topic: &str, partition_key: &str, payload: &str) -> Result<i64> {
        self.enqueue_attempts.fetch_add(1, Ordering::SeqCst);
        if *self.fail_enqueue.lock().unwrap() {
            return Err(Error::Channel("broker unreachable".to_string()));
        }
        let mut messages = self.messages.lock().unwrap();
        let id = messages.len() as i64 + 1;
        messages.push(MockMessage {
            id,
            topic: topic.to_string(),
            partition_key: partition_key.to_string(),
            payload: payload.to_string(),
            delivery_count: 0,
            acked: false,
            leased_by: None,
        });
        Ok(id)
    }

    async fn poll(
        &self,
        topic: &str,
        _group: &str,
        consumer_id: &str,
        max: usize,
    ) -> Result<Vec<TaskDelivery>> {
        let mut messages = self.messages.lock().unwrap();
        let now = Utc::now().naive_utc();
        let mut deliveries = Vec::new();
        for message in messages
            .iter_mut()
            .filter(|m| m.topic == topic && !m.acked && m.leased_by.is_none())
            .take(max)
        {
            message.delivery_count += 1;
            message.leased_by = Some(consumer_id.to_string());
            deliveries.push(TaskDelivery {
                message_id: message.id,
                topic: message.topic.clone(),
                partition_key: message.partition_key.clone(),
                payload: message.payload.clone(),
                delivery_count: message.delivery_count,
                enqueued_at: now,
            });
        }
        Ok(deliveries)
    }

    async fn ack(&self, _group: &str, delivery: &TaskDelivery) -> Result<()> {
        if let Some(message) = self
            .messages
            .lock()
            .unwrap()
            .iter_mut()
            .find(|m| m.id == delivery.message_id)
        {
            message.acked = true;
            message.leased_by = None;
        }
        Ok(())
    }

    async fn release_consumer(&self, _group: &str, consumer_id: &str) -> Result<usize> {
        self.released.lock().unwrap().push(consumer_id.to_string());
        let mut released = 0;
        for message in self.messages.lock().unwrap().iter_mut() {
            if message.leased_by.as_deref() == Some(consumer_id) {
                message.leased_by = None;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn purge_expired(&self, _retention: Duration) -> Result<usize> {
        Ok(0)
    }
}

// =========================================================================
// Scripted PriceProvider
// =========================================================================

/// Oracle answering from a per-url price table. Queued errors are returned
/// before the table is consulted.
#[derive(Clone, Default)]
pub struct ScriptedPriceProvider {
    prices: Arc<Mutex<HashMap<String, FetchedPrice>>>,
    errors: Arc<Mutex<VecDeque<MarketDataError>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    fetches: Arc<AtomicUsize>,
}

impl ScriptedPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, url: &str, price: Decimal) {
        self.prices
            .lock()
            .unwrap()
            .insert(url.to_string(), FetchedPrice::new(price));
    }

    pub fn set_fetched(&self, url: &str, fetched: FetchedPrice) {
        self.prices.lock().unwrap().insert(url.to_string(), fetched);
    }

    pub fn fail_next(&self, error: MarketDataError) {
        self.errors.lock().unwrap().push_back(error);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceProvider for ScriptedPriceProvider {
    fn id(&self) -> &'static str {
        "SCRIPTED"
    }

    async fn fetch_current_price(
        &self,
        url: &str,
    ) -> std::result::Result<FetchedPrice, MarketDataError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.errors.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.prices
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| MarketDataError::NotFound(url.to_string()))
    }
}

// =========================================================================
// Wiring
// =========================================================================

/// All doubles wired together the way the server wires the real adapters.
pub struct Harness {
    pub log: CallLog,
    pub repository: Arc<MockProductRepository>,
    pub cache: Arc<MockProductCache>,
    pub channel: Arc<MockTaskChannel>,
    pub provider: Arc<ScriptedPriceProvider>,
    pub events: MockDomainEventSink,
    pub reconciler: Arc<PriceReconciler>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(AlertPolicy::EveryChange)
    }

    pub fn with_policy(policy: AlertPolicy) -> Self {
        let log = CallLog::default();
        let repository = Arc::new(MockProductRepository::new(log.clone()));
        let cache = Arc::new(MockProductCache::new(log.clone()));
        let channel = Arc::new(MockTaskChannel::new());
        let provider = Arc::new(ScriptedPriceProvider::new());
        let events = MockDomainEventSink::new();
        let reconciler = Arc::new(PriceReconciler::new(
            repository.clone(),
            cache.clone(),
            provider.clone(),
            Arc::new(events.clone()),
            Duration::from_millis(200),
            policy,
        ));
        Self {
            log,
            repository,
            cache,
            channel,
            provider,
            events,
            reconciler,
        }
    }

    pub fn service(&self) -> ProductService {
        self.service_with_page_size(100)
    }

    pub fn service_with_page_size(&self, page_size: i64) -> ProductService {
        ProductService::new(
            self.repository.clone(),
            self.cache.clone(),
            Arc::new(ChannelTaskProducer::new(
                self.channel.clone(),
                crate::constants::DEFAULT_TASK_TOPIC,
            )),
            self.reconciler.clone(),
            Arc::new(self.events.clone()),
            page_size,
        )
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            consumer_id: "watcher-test".to_string(),
            poll_backoff: PollBackoff {
                min: Duration::from_millis(5),
                max: Duration::from_millis(20),
                multiplier: 2.0,
            },
            ..WatcherConfig::default()
        }
    }

    pub fn watcher(&self) -> Watcher {
        Watcher::new(
            self.channel.clone(),
            self.reconciler.clone(),
            self.watcher_config(),
        )
    }
}
