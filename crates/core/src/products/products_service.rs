use async_trait::async_trait;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::products_model::{
    validate_target_price, NewProduct, Product, SweepSummary, TrackedProduct,
};
use super::products_traits::{ProductRepositoryTrait, ProductServiceTrait};
use crate::cache::ProductCacheTrait;
use crate::constants::MAX_PAGE_SIZE;
use crate::errors::{Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::tasks::TaskProducerTrait;
use crate::watcher::{PriceReconciler, ReconcileOutcome};

/// Service orchestrating the product store, the cache and the task producer.
pub struct ProductService {
    repository: Arc<dyn ProductRepositoryTrait>,
    cache: Arc<dyn ProductCacheTrait>,
    producer: Arc<dyn TaskProducerTrait>,
    reconciler: Arc<PriceReconciler>,
    event_sink: Arc<dyn DomainEventSink>,
    sweep_page_size: i64,
}

impl ProductService {
    /// Creates a new ProductService instance
    pub fn new(
        repository: Arc<dyn ProductRepositoryTrait>,
        cache: Arc<dyn ProductCacheTrait>,
        producer: Arc<dyn TaskProducerTrait>,
        reconciler: Arc<PriceReconciler>,
        event_sink: Arc<dyn DomainEventSink>,
        sweep_page_size: i64,
    ) -> Self {
        Self {
            repository,
            cache,
            producer,
            reconciler,
            event_sink,
            sweep_page_size: sweep_page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Stores the product, then publishes its first check task.
    /// A failed publish is logged and reported, never rolled back.
    async fn create_and_publish(&self, mut new_product: NewProduct) -> Result<TrackedProduct> {
        new_product.validate()?;

        let product = self.repository.create(new_product).await?;
        info!("Tracking product {} ({})", product.id, product.url);
        self.event_sink.emit(DomainEvent::product_tracked(
            product.id,
            product.url.clone(),
            product.target_price,
        ));

        let task_published = match self.producer.publish(product.id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Product {} stored but its check task was not published: {}",
                    product.id, e
                );
                false
            }
        };

        Ok(TrackedProduct {
            product,
            task_published,
        })
    }
}

#[async_trait]
impl ProductServiceTrait for ProductService {
    async fn track_product(&self, url: &str, target_price: Decimal) -> Result<TrackedProduct> {
        self.create_and_publish(NewProduct::new(url, target_price))
            .await
    }

    async fn create(&self, new_product: NewProduct) -> Result<Product> {
        Ok(self.create_and_publish(new_product).await?.product)
    }

    /// Cache first, then the store. Cache failures degrade to a store read.
    async fn get_by_id(&self, product_id: i64) -> Result<Product> {
        match self.cache.get(product_id).await {
            Ok(Some(mut product)) => {
                match self.cache.get_price(product_id).await {
                    Ok(Some(price)) => product.current_price = price,
                    Ok(None) => {}
                    Err(e) => debug!("Price cache read failed for {}: {}", product_id, e),
                }
                return Ok(product);
            }
            Ok(None) => {}
            Err(e) => warn!("Cache read failed for product {}: {}", product_id, e),
        }

        let product = self.repository.get_by_id(product_id)?;
        if let Err(e) = self.cache.set_product(&product).await {
            warn!("Failed to cache product {}: {}", product_id, e);
        }
        Ok(product)
    }

    async fn check_prices(&self) -> Result<SweepSummary> {
        let mut summary = SweepSummary::default();
        let mut after_id = 0;

        loop {
            let page = self.repository.list_page(after_id, self.sweep_page_size)?;
            let Some(last) = page.last() else {
                break;
            };
            after_id = last.id;
            let is_last_page = (page.len() as i64) < self.sweep_page_size;

            for product in &page {
                summary.checked += 1;
                match self.reconciler.check_product(product).await {
                    Ok(ReconcileOutcome::Unchanged) => summary.unchanged += 1,
                    Ok(ReconcileOutcome::Updated { alerted, .. }) => {
                        summary.updated += 1;
                        if alerted {
                            summary.alerts += 1;
                        }
                    }
                    Err(e) => {
                        summary.failed += 1;
                        warn!("Sweep failed to check product {}: {}", product.id, e);
                    }
                }
            }

            if is_last_page {
                break;
            }
        }

        info!(
            "Price sweep done: {} checked, {} updated, {} unchanged, {} alerts, {} failed",
            summary.checked, summary.updated, summary.unchanged, summary.alerts, summary.failed
        );
        Ok(summary)
    }

    async fn update_target_price(&self, product_id: i64, target_price: Decimal) -> Result<Product> {
        validate_target_price(target_price)?;
        let product = self
            .repository
            .update_target_price(product_id, target_price)
            .await?;
        // Overwrite rather than invalidate so a read that missed before the
        // update cannot park the old target in the cache.
        if let Err(e) = self.cache.set_product(&product).await {
            warn!("Failed to refresh cache of product {}: {}", product_id, e);
        }
        Ok(product)
    }

    fn list_products(&self, after_id: i64, limit: i64) -> Result<Vec<Product>> {
        if limit <= 0 {
            return Err(ValidationError::InvalidInput(format!(
                "limit must be positive, got {}",
                limit
            ))
            .into());
        }
        self.repository
            .list_page(after_id.max(0), limit.min(MAX_PAGE_SIZE))
    }
}
