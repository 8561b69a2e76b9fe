//! Message broker trait for the access log pipeline

use std::fmt::Debug;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::domain::StateError;

/// Stream of raw record payloads delivered to one consumer group member
pub type Subscription = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Topic based publish/subscribe transport
///
/// Every consumer group receives each published record once; members of the
/// same group split the records between them. No ordering or exactly-once
/// guarantee is promised beyond what the implementation provides.
#[async_trait]
pub trait LogBroker: Send + Sync + Debug {
    /// Publishes a payload to a topic
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), StateError>;

    /// Joins a consumer group on a topic
    async fn subscribe(&self, topic: &str, group: &str) -> Result<Subscription, StateError>;

    /// Closes the broker connection
    async fn close(&self);
}
