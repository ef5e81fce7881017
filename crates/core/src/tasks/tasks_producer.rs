use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use super::tasks_model::CheckPriceTask;
use super::tasks_traits::{TaskChannelTrait, TaskProducerTrait};
use crate::errors::{Result, ValidationError};

/// Producer that writes check-price tasks to one topic of a task channel.
pub struct ChannelTaskProducer {
    channel: Arc<dyn TaskChannelTrait>,
    topic: String,
}

impl ChannelTaskProducer {
    pub fn new(channel: Arc<dyn TaskChannelTrait>, topic: impl Into<String>) -> Self {
        Self {
            channel,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl TaskProducerTrait for ChannelTaskProducer {
    async fn publish(&self, product_id: i64) -> Result<()> {
        if product_id <= 0 {
            return Err(ValidationError::InvalidInput(format!(
                "cannot publish a task for unpersisted product id {}",
                product_id
            ))
            .into());
        }

        let payload = CheckPriceTask::check_price(product_id).encode()?;
        let message_id = self
            .channel
            .enqueue(&self.topic, &product_id.to_string(), &payload)
            .await?;
        debug!(
            "Published check_price task for product {} as message {} on '{}'",
            product_id, message_id, self.topic
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_support::MockTaskChannel;

    #[tokio::test]
    async fn test_publish_enqueues_one_message() {
        let channel = Arc::new(MockTaskChannel::new());
        let producer = ChannelTaskProducer::new(channel.clone(), "product_updates");

        producer.publish(9).await.unwrap();

        let messages = channel.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].topic, "product_updates");
        assert_eq!(messages[0].partition_key, "9");
        assert_eq!(
            CheckPriceTask::decode(&messages[0].payload).unwrap(),
            CheckPriceTask::check_price(9)
        );
    }

    #[tokio::test]
    async fn test_publish_rejects_unpersisted_product() {
        let channel = Arc::new(MockTaskChannel::new());
        let producer = ChannelTaskProducer::new(channel.clone(), "product_updates");

        let err = producer.publish(0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(channel.enqueue_attempts(), 0);
    }

    #[tokio::test]
    async fn test_publish_makes_a_single_attempt_on_failure() {
        let channel = Arc::new(MockTaskChannel::new());
        channel.set_fail_enqueue(true);
        let producer = ChannelTaskProducer::new(channel.clone(), "product_updates");

        let err = producer.publish(4).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(channel.enqueue_attempts(), 1);
        assert!(channel.messages().is_empty());
    }
}
