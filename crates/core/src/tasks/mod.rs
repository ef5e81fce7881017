//! Tasks module - check-price task codec, channel contract and producer.

mod tasks_model;
mod tasks_producer;
mod tasks_traits;

pub use tasks_model::{CheckPriceTask, TaskAction, TaskDelivery};
pub use tasks_producer::ChannelTaskProducer;
pub use tasks_traits::{TaskChannelTrait, TaskProducerTrait};
