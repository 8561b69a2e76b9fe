//! Access log consumer

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{AccessLog, LogBroker, StateError};

/// Consumes access logs from one topic as a member of a consumer group
#[derive(Debug)]
pub struct AccessLogConsumer {
    broker: Arc<dyn LogBroker>,
    topic: String,
    group: String,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AccessLogConsumer {
    pub fn new(
        broker: Arc<dyn LogBroker>,
        topic: impl Into<String>,
        group: impl Into<String>,
    ) -> Result<Self, StateError> {
        let topic = topic.into();
        let group = group.into();

        if topic.is_empty() {
            return Err(StateError::config("Missing topic"));
        }

        if group.is_empty() {
            return Err(StateError::config("Missing consumer group"));
        }

        info!(topic = %topic, group = %group, "Initialized access log consumer");

        Ok(Self {
            broker,
            topic,
            group,
            task: Mutex::new(None),
        })
    }

    /// Starts delivering records, calling `process` once per access log
    ///
    /// Calling `start` on a running consumer is a no-op. Records that are not
    /// valid access log JSON are logged and skipped.
    pub async fn start<F>(&self, mut process: F) -> Result<(), StateError>
    where
        F: FnMut(AccessLog) + Send + 'static,
    {
        let mut task = self.task.lock().await;

        if task.is_some() {
            return Ok(());
        }

        let mut subscription = self.broker.subscribe(&self.topic, &self.group).await?;
        let topic = self.topic.clone();

        *task = Some(tokio::spawn(async move {
            while let Some(payload) = subscription.next().await {
                match AccessLog::from_json(&payload) {
                    Ok(log) => process(log),
                    Err(e) => warn!(
                        topic = %topic,
                        "Failed to parse message into json: {} ({})",
                        String::from_utf8_lossy(&payload),
                        e
                    ),
                }
            }

            debug!(topic = %topic, "Access log subscription ended");
        }));

        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub async fn stop(&self) {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
            info!(topic = %self.topic, group = %self.group, "Stopped access log consumer");
        }
    }
}

impl Drop for AccessLogConsumer {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use tokio::sync::mpsc;

    use super::*;
    use crate::infrastructure::access_log::{AccessLogProducer, InMemoryBroker};

    #[test]
    fn test_new_validates_arguments() {
        let broker: Arc<dyn LogBroker> = Arc::new(InMemoryBroker::new());

        assert!(AccessLogConsumer::new(broker.clone(), "", "group").is_err());
        assert!(AccessLogConsumer::new(broker, "topic", "").is_err());
    }

    #[tokio::test]
    async fn test_consume_in_order() {
        let broker = Arc::new(InMemoryBroker::new());
        let producer = AccessLogProducer::new(broker.clone(), "gateway.common.test").unwrap();
        let consumer =
            AccessLogConsumer::new(broker.clone(), "gateway.common.test", "gateway-common-test")
                .unwrap();

        let logs = vec![
            AccessLog::new("/foo", 200, Utc.timestamp_opt(1710849419, 0).unwrap()),
            AccessLog::new("/bar", 429, Utc.timestamp_opt(1710849621, 0).unwrap())
                .with_key("84b01bc1-4dad-4694-99ce-514c37b88f9a"),
            AccessLog::new("/baz", 500, Utc.timestamp_opt(1710849652, 0).unwrap()),
            AccessLog::new("/bar?alice=bob", 429, Utc.timestamp_opt(1710849711, 0).unwrap())
                .with_key("7eeb2c6d-d94f-475b-907c-50cbe01a0cb6"),
        ];

        let (tx, mut rx) = mpsc::unbounded_channel();
        consumer
            .start(move |log| {
                let _ = tx.send(log);
            })
            .await
            .unwrap();

        for log in &logs {
            producer.produce_log(log).await.unwrap();
        }

        let mut received = Vec::new();
        while received.len() < logs.len() {
            let log = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            received.push(log);
        }

        assert_eq!(received, logs);
        consumer.stop().await;
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let broker = Arc::new(InMemoryBroker::new());
        let consumer = AccessLogConsumer::new(broker.clone(), "logs", "g1").unwrap();

        consumer.start(|_| {}).await.unwrap();
        consumer.start(|_| panic!("second callback must not run")).await.unwrap();

        broker
            .publish("logs", AccessLog::new("/", 200, Utc::now()).to_json().unwrap())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(consumer.is_running().await);
        consumer.stop().await;
    }

    #[tokio::test]
    async fn test_invalid_payload_is_skipped() {
        let broker = Arc::new(InMemoryBroker::new());
        let consumer = AccessLogConsumer::new(broker.clone(), "logs", "g1").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        consumer
            .start(move |log: AccessLog| {
                let _ = tx.send(log.path);
            })
            .await
            .unwrap();

        broker.publish("logs", b"{not json".to_vec()).await.unwrap();
        broker
            .publish("logs", AccessLog::new("/ok", 200, Utc::now()).to_json().unwrap())
            .await
            .unwrap();

        let path = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(path, "/ok");
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let broker = Arc::new(InMemoryBroker::new());
        let consumer = AccessLogConsumer::new(broker, "logs", "g1").unwrap();

        consumer.start(|_| {}).await.unwrap();
        consumer.stop().await;
        consumer.stop().await;

        assert!(!consumer.is_running().await);
    }
}
