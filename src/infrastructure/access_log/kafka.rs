//! Kafka message broker implementation

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::Message;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::{LogBroker, StateError, Subscription};

/// Broker backed by a Kafka cluster
///
/// One producer is shared by every publisher. Each subscription owns its own
/// group consumer with offsets committed automatically, and a group seen for
/// the first time starts from the earliest offset. Topics are created on
/// first use when the cluster allows it.
pub struct KafkaBroker {
    brokers: String,
    producer: FutureProducer,
    send_timeout: Duration,
    closed: watch::Sender<bool>,
}

impl fmt::Debug for KafkaBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KafkaBroker")
            .field("brokers", &self.brokers)
            .field("send_timeout", &self.send_timeout)
            .field("producer", &"<FutureProducer>")
            .finish()
    }
}

impl KafkaBroker {
    /// Creates the shared producer for the given seed brokers
    ///
    /// Connections are opened lazily, so an unreachable cluster surfaces on
    /// the first publish or fetch rather than here.
    pub fn new(brokers: &[String], send_timeout: Duration) -> Result<Self, StateError> {
        let brokers = brokers
            .iter()
            .map(|broker| broker.trim())
            .filter(|broker| !broker.is_empty())
            .collect::<Vec<_>>()
            .join(",");

        if brokers.is_empty() {
            return Err(StateError::config("Missing brokers"));
        }

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout_ms(send_timeout))
            .create()
            .map_err(|e| map_kafka_error("Failed to create kafka producer".to_string(), e))?;

        let (closed, _) = watch::channel(false);

        info!(brokers = %brokers, "Initialized kafka broker");

        Ok(Self {
            brokers,
            producer,
            send_timeout,
            closed,
        })
    }

    fn ensure_open(&self) -> Result<(), StateError> {
        if *self.closed.borrow() {
            return Err(StateError::connection("Broker closed"));
        }
        Ok(())
    }

    fn group_consumer(&self, topic: &str, group: &str) -> Result<StreamConsumer, StateError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", group)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .set("allow.auto.create.topics", "true")
            .create()
            .map_err(|e| map_kafka_error("Failed to create kafka consumer".to_string(), e))?;

        consumer.subscribe(&[topic]).map_err(|e| {
            map_kafka_error(format!("Failed to subscribe to topic '{}'", topic), e)
        })?;

        Ok(consumer)
    }
}

#[async_trait]
impl LogBroker for KafkaBroker {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), StateError> {
        self.ensure_open()?;

        let record = FutureRecord::<(), Vec<u8>>::to(topic).payload(&payload);

        self.producer
            .send(record, Timeout::After(self.send_timeout))
            .await
            .map_err(|(e, _)| {
                map_kafka_error(format!("Failed to publish to topic '{}'", topic), e)
            })?;

        Ok(())
    }

    async fn subscribe(&self, topic: &str, group: &str) -> Result<Subscription, StateError> {
        self.ensure_open()?;

        let consumer = Arc::new(self.group_consumer(topic, group)?);
        let shutdown = self.closed.subscribe();
        let topic = topic.to_string();

        info!(topic = %topic, group = %group, "Joined kafka consumer group");

        let stream = futures::stream::unfold(
            (consumer, shutdown, topic),
            |(consumer, mut shutdown, topic)| async move {
                if *shutdown.borrow_and_update() {
                    return None;
                }

                let fetched = tokio::select! {
                    _ = shutdown.changed() => return None,
                    message = consumer.recv() => message
                        .map(|message| message.payload().map(<[u8]>::to_vec).unwrap_or_default()),
                };

                match fetched {
                    Ok(payload) => Some((payload, (consumer, shutdown, topic))),
                    Err(e) => {
                        // Retriable errors are retried inside the client
                        warn!(topic = %topic, "Kafka fetch failed, ending subscription: {}", e);
                        None
                    }
                }
            },
        );

        Ok(Box::pin(stream))
    }

    async fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }

        let producer = self.producer.clone();
        let timeout = self.send_timeout;

        match tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout))).await {
            Ok(Ok(())) => info!(brokers = %self.brokers, "Closed kafka broker"),
            Ok(Err(e)) => warn!("Ignoring error while flushing kafka producer: {}", e),
            Err(e) => warn!("Ignoring error while flushing kafka producer: {}", e),
        }
    }
}

fn timeout_ms(timeout: Duration) -> String {
    timeout.as_millis().max(1).to_string()
}

/// Maps a client error onto the state error taxonomy
fn map_kafka_error(context: String, error: KafkaError) -> StateError {
    match &error {
        KafkaError::ClientConfig(..)
        | KafkaError::ClientCreation(_)
        | KafkaError::Subscription(_) => StateError::config(format!("{}: {}", context, error)),
        _ => StateError::connection(format!("{}: {}", context, error)),
    }
}
