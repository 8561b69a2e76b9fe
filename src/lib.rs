//! Gateway control plane state client
//!
//! Answers the two admission questions a gateway asks on every request:
//! - is this API key valid, and which account and key id does it belong to
//! - is that account currently paused
//!
//! State lives in a linearizable key-value store (etcd). [`StateReader`] and
//! [`StateWriter`] are built on a shared [`StateClient`] session. The access
//! log pipeline ships per-request audit records through Kafka.
//!
//! ```no_run
//! use gateway_control::{StateClient, StateReader, StateWriter, StoreConfig};
//!
//! # async fn example() -> Result<(), gateway_control::StateError> {
//! let client = StateClient::connect(&StoreConfig::etcd(["localhost:2379"])).await?;
//! let writer = StateWriter::new(client.clone());
//! let reader = StateReader::new(client.clone());
//!
//! writer.create_key("0xD3E8ce4841ed658Ec8dcb99B7a74beFC377253EA", "42", "my-api-key").await?;
//! let record = reader.check_key("my-api-key").await?;
//! let paused = reader.check_account_paused("0xD3E8ce4841ed658Ec8dcb99B7a74beFC377253EA").await?;
//! # let _ = (record, paused);
//!
//! client.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{AccessLog, KeyRecord, LogBroker, StateError, StateStore};
pub use infrastructure::access_log::{
    AccessLogConfig, AccessLogConsumer, AccessLogProducer, BrokerFactory, BrokerType,
    InMemoryBroker, KafkaBroker,
};
pub use infrastructure::state::{
    Credentials, EtcdStore, InMemoryStore, StateClient, StateReader, StateWriter, StoreConfig,
    StoreFactory, StoreType,
};
