//! Access log infrastructure - brokers, factory, producer and consumer

mod consumer;
mod factory;
mod in_memory;
mod kafka;
mod producer;

pub use consumer::AccessLogConsumer;
pub use factory::{AccessLogConfig, BrokerFactory, BrokerType};
pub use in_memory::{InMemoryBroker, DEFAULT_RETENTION};
pub use kafka::KafkaBroker;
pub use producer::AccessLogProducer;
