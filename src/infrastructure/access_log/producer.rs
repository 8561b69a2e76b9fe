//! Access log producer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{AccessLog, LogBroker, StateError};

/// Publishes access logs as JSON to one topic
#[derive(Debug)]
pub struct AccessLogProducer {
    broker: Arc<dyn LogBroker>,
    topic: String,
    stopped: AtomicBool,
}

impl AccessLogProducer {
    pub fn new(broker: Arc<dyn LogBroker>, topic: impl Into<String>) -> Result<Self, StateError> {
        let topic = topic.into();

        if topic.is_empty() {
            return Err(StateError::config("Missing topic"));
        }

        info!(topic = %topic, "Initialized access log producer");

        Ok(Self {
            broker,
            topic,
            stopped: AtomicBool::new(false),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub async fn produce_log(&self, log: &AccessLog) -> Result<(), StateError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(StateError::connection("Access log producer stopped"));
        }

        let payload = log.to_json()?;

        self.broker.publish(&self.topic, payload).await?;

        debug!(topic = %self.topic, path = %log.path, status = log.status, "Produced access log");

        Ok(())
    }

    /// Stops producing; the broker itself stays open for other clients
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}
