//! Compare a freshly fetched price against stored state and write the
//! difference.
//!
//! Shared by the watcher and the sweep so that both go through one
//! [`KeyedLocks`] instance: for a given product id, reconciles never
//! interleave their read-compare-write.
//!
//! Tasks for one product carry no ordering guarantee. Because updates are
//! absolute prices, a late delivery can at worst store an older observation
//! until the next check corrects it.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use pricepulse_market_data::{FetchedPrice, MarketDataError, PriceProvider};
use rust_decimal::Decimal;

use super::keyed_lock::KeyedLocks;
use super::watcher_config::AlertPolicy;
use crate::cache::ProductCacheTrait;
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::products::{Product, ProductRepositoryTrait};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Fetched price equals the stored one; nothing was written.
    Unchanged,
    Updated {
        old_price: Decimal,
        new_price: Decimal,
        alerted: bool,
    },
}

pub struct PriceReconciler {
    repository: Arc<dyn ProductRepositoryTrait>,
    cache: Arc<dyn ProductCacheTrait>,
    provider: Arc<dyn PriceProvider>,
    event_sink: Arc<dyn DomainEventSink>,
    locks: KeyedLocks,
    fetch_timeout: Duration,
    alert_policy: AlertPolicy,
}

impl PriceReconciler {
    pub fn new(
        repository: Arc<dyn ProductRepositoryTrait>,
        cache: Arc<dyn ProductCacheTrait>,
        provider: Arc<dyn PriceProvider>,
        event_sink: Arc<dyn DomainEventSink>,
        fetch_timeout: Duration,
        alert_policy: AlertPolicy,
    ) -> Self {
        Self {
            repository,
            cache,
            provider,
            event_sink,
            locks: KeyedLocks::new(),
            fetch_timeout,
            alert_policy,
        }
    }

    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    /// Loads the product and reconciles it.
    pub async fn check_product_id(&self, product_id: i64) -> Result<ReconcileOutcome> {
        let product = self.repository.get_by_id(product_id)?;
        self.check_product(&product).await
    }

    /// Fetches the current price of `product` and reconciles it against the
    /// stored record. Nothing is written when the fetch fails.
    pub async fn check_product(&self, product: &Product) -> Result<ReconcileOutcome> {
        let fetched = self.fetch(&product.url).await?;

        let _guard = self.locks.lock(product.id).await;

        // Compare against the latest stored state, not the caller's snapshot.
        let current = self.repository.get_by_id(product.id)?;

        if current.has_placeholder_title() {
            if let Some(title) = fetched.title.as_deref() {
                self.repository.update_title(current.id, title).await?;
                self.invalidate_cache(current.id).await;
                debug!("Product {} title set to '{}'", current.id, title);
            }
        }

        if fetched.price == current.current_price {
            debug!(
                "Product {} price unchanged at {}",
                current.id, current.current_price
            );
            return Ok(ReconcileOutcome::Unchanged);
        }

        let old_price = current.current_price;
        let new_price = fetched.price;

        self.repository.update_price(current.id, new_price).await?;
        if let Err(e) = self.cache.set_price(current.id, new_price).await {
            warn!("Failed to cache price of product {}: {}", current.id, e);
        }
        info!(
            "Product {} price changed from {} to {}",
            current.id, old_price, new_price
        );
        self.event_sink
            .emit(DomainEvent::price_changed(current.id, old_price, new_price));

        let alerted = self.should_alert(&current, old_price, new_price);
        if alerted {
            info!(
                "Product {} reached target: {} <= {}",
                current.id, new_price, current.target_price
            );
            self.event_sink.emit(DomainEvent::price_target_reached(
                current.id,
                current.url.clone(),
                new_price,
                current.target_price,
            ));
        }

        Ok(ReconcileOutcome::Updated {
            old_price,
            new_price,
            alerted,
        })
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPrice> {
        match tokio::time::timeout(self.fetch_timeout, self.provider.fetch_current_price(url)).await
        {
            Ok(result) => Ok(result?),
            Err(_) => Err(MarketDataError::Timeout {
                provider: self.provider.id().to_string(),
            }
            .into()),
        }
    }

    fn should_alert(&self, product: &Product, old_price: Decimal, new_price: Decimal) -> bool {
        if !product.is_target_reached_at(new_price) {
            return false;
        }
        match self.alert_policy {
            AlertPolicy::EveryChange => true,
            AlertPolicy::OnCrossing => {
                let never_checked = old_price.is_zero();
                never_checked || !product.is_target_reached_at(old_price)
            }
        }
    }

    async fn invalidate_cache(&self, product_id: i64) {
        if let Err(e) = self.cache.delete(product_id).await {
            warn!("Failed to invalidate cache of product {}: {}", product_id, e);
        }
    }
}
