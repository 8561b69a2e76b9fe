//! Message broker factory for runtime selection

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::domain::{LogBroker, StateError};

use super::consumer::AccessLogConsumer;
use super::in_memory::InMemoryBroker;
use super::kafka::KafkaBroker;
use super::producer::AccessLogProducer;

/// Supported broker backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerType {
    /// Kafka cluster reached through its seed brokers
    #[default]
    Kafka,
    /// Process-local topics
    #[serde(alias = "inmemory", alias = "memory")]
    InMemory,
}

impl fmt::Display for BrokerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerType::Kafka => write!(f, "kafka"),
            BrokerType::InMemory => write!(f, "in_memory"),
        }
    }
}

impl std::str::FromStr for BrokerType {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kafka" => Ok(BrokerType::Kafka),
            "in_memory" | "inmemory" | "memory" => Ok(BrokerType::InMemory),
            _ => Err(StateError::config(format!(
                "Unknown broker type: {}. Valid types: kafka, in_memory",
                s
            ))),
        }
    }
}

/// Access log pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AccessLogConfig {
    #[serde(default)]
    pub backend: BrokerType,
    /// Seed brokers as `host:port`
    #[serde(default = "default_brokers")]
    pub brokers: Vec<String>,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_group")]
    pub group: String,
    /// Upper bound for a single publish, including broker acknowledgement
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

fn default_brokers() -> Vec<String> {
    vec!["localhost:9092".to_string()]
}

fn default_topic() -> String {
    "gateway.access".to_string()
}

fn default_group() -> String {
    "gateway-control".to_string()
}

fn default_send_timeout_ms() -> u64 {
    5_000
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            backend: BrokerType::Kafka,
            brokers: default_brokers(),
            topic: default_topic(),
            group: default_group(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

impl AccessLogConfig {
    /// Creates a configuration for a Kafka cluster
    pub fn kafka<I, S>(brokers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            backend: BrokerType::Kafka,
            brokers: brokers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Creates a configuration for the in-memory broker
    pub fn in_memory() -> Self {
        Self {
            backend: BrokerType::InMemory,
            brokers: Vec::new(),
            ..Default::default()
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Producer publishing to the configured topic
    pub fn producer(&self, broker: Arc<dyn LogBroker>) -> Result<AccessLogProducer, StateError> {
        AccessLogProducer::new(broker, self.topic.clone())
    }

    /// Consumer joining the configured group on the configured topic
    pub fn consumer(&self, broker: Arc<dyn LogBroker>) -> Result<AccessLogConsumer, StateError> {
        AccessLogConsumer::new(broker, self.topic.clone(), self.group.clone())
    }
}

/// Factory for creating broker instances
#[derive(Debug, Default)]
pub struct BrokerFactory;

impl BrokerFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates a broker instance based on configuration
    pub fn create(&self, config: &AccessLogConfig) -> Result<Arc<dyn LogBroker>, StateError> {
        match config.backend {
            BrokerType::Kafka => Ok(Arc::new(KafkaBroker::new(
                &config.brokers,
                config.send_timeout(),
            )?)),
            BrokerType::InMemory => {
                info!("Using in-memory access log broker");
                Ok(Arc::new(InMemoryBroker::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::AccessLog;

    #[test]
    fn test_broker_type_from_str() {
        assert_eq!("kafka".parse::<BrokerType>().unwrap(), BrokerType::Kafka);
        assert_eq!("KAFKA".parse::<BrokerType>().unwrap(), BrokerType::Kafka);
        assert_eq!("memory".parse::<BrokerType>().unwrap(), BrokerType::InMemory);
        assert!("nats".parse::<BrokerType>().is_err());
    }

    #[test]
    fn test_broker_type_display() {
        assert_eq!(BrokerType::Kafka.to_string(), "kafka");
        assert_eq!(BrokerType::InMemory.to_string(), "in_memory");
    }

    #[test]
    fn test_default_config() {
        let config = AccessLogConfig::default();

        assert_eq!(config.backend, BrokerType::Kafka);
        assert_eq!(config.brokers, vec!["localhost:9092".to_string()]);
        assert_eq!(config.topic, "gateway.access");
        assert_eq!(config.group, "gateway-control");
        assert_eq!(config.send_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_factory_create_kafka_without_brokers() {
        let result = BrokerFactory::new().create(&AccessLogConfig::kafka(Vec::<String>::new()));

        assert!(matches!(result, Err(StateError::Config { .. })));
    }

    #[test]
    fn test_empty_topic_rejected() {
        let config = AccessLogConfig::in_memory().with_topic("");
        let broker = BrokerFactory::new().create(&config).unwrap();

        assert!(matches!(
            config.producer(broker.clone()),
            Err(StateError::Config { .. })
        ));
        assert!(matches!(
            config.consumer(broker),
            Err(StateError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn test_factory_create_in_memory_pipeline() {
        let config = AccessLogConfig::in_memory()
            .with_topic("gateway.access.test")
            .with_group("test-group");
        let broker = BrokerFactory::new().create(&config).unwrap();

        let producer = config.producer(broker.clone()).unwrap();
        let consumer = config.consumer(broker).unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        consumer
            .start(move |log: AccessLog| {
                let _ = tx.send(log.path);
            })
            .await
            .unwrap();

        producer
            .produce_log(&AccessLog::new("/foo", 200, Utc::now()))
            .await
            .unwrap();

        assert_eq!(rx.recv().await, Some("/foo".to_string()));
        consumer.stop().await;
    }
}
