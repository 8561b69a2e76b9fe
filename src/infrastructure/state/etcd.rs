//! etcd state store implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use etcd_client::{Client, ConnectOptions, GetOptions};
use tokio::sync::RwLock;
use tonic::Code;
use tracing::info;

use crate::domain::{StateError, StateStore};

use super::factory::Credentials;

/// State store backed by an etcd cluster
///
/// The underlying client multiplexes requests over one gRPC channel, so a
/// clone of it is taken per operation and no lock is held across a call.
pub struct EtcdStore {
    client: RwLock<Option<Client>>,
    endpoints: Vec<String>,
}

impl fmt::Debug for EtcdStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EtcdStore")
            .field("endpoints", &self.endpoints)
            .field("client", &"<Client>")
            .finish()
    }
}

impl EtcdStore {
    /// Dials the cluster, bounded by `dial_timeout`
    pub async fn connect(
        endpoints: &[String],
        credentials: Option<&Credentials>,
        dial_timeout: Duration,
    ) -> Result<Self, StateError> {
        if endpoints.is_empty() {
            return Err(StateError::config("Missing etcd endpoints"));
        }

        let mut options = ConnectOptions::new().with_connect_timeout(dial_timeout);

        if let Some(credentials) = credentials {
            options = options.with_user(
                credentials.username.clone(),
                credentials.password.clone(),
            );
        }

        let client = tokio::time::timeout(dial_timeout, Client::connect(endpoints, Some(options)))
            .await
            .map_err(|_| {
                StateError::connection(format!(
                    "Failed to dial etcd: timed out after {:?}",
                    dial_timeout
                ))
            })?
            .map_err(|e| map_etcd_error("Failed to dial etcd".to_string(), e))?;

        info!(
            endpoints = ?endpoints,
            authenticated = credentials.is_some(),
            "Connected to etcd"
        );

        Ok(Self {
            client: RwLock::new(Some(client)),
            endpoints: endpoints.to_vec(),
        })
    }

    async fn client(&self, operation: &str, key: &str) -> Result<Client, StateError> {
        self.client.read().await.clone().ok_or_else(|| {
            StateError::connection(format!(
                "Failed to {} key '{}': store session closed",
                operation, key
            ))
        })
    }
}

#[async_trait]
impl StateStore for EtcdStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        let mut client = self.client("get", key).await?;

        let response = client
            .get(key, None)
            .await
            .map_err(|e| map_etcd_error(format!("Failed to get key '{}'", key), e))?;

        match response.kvs().iter().find(|kv| kv.key() == key.as_bytes()) {
            Some(kv) => kv.value_str().map(|value| Some(value.to_string())).map_err(|e| {
                StateError::store(format!("Failed to decode value of key '{}': {}", key, e))
            }),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StateError> {
        let mut client = self.client("put", key).await?;

        client
            .put(key, value, None)
            .await
            .map_err(|e| map_etcd_error(format!("Failed to put key '{}'", key), e))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StateError> {
        let mut client = self.client("delete", key).await?;

        let response = client
            .delete(key, None)
            .await
            .map_err(|e| map_etcd_error(format!("Failed to delete key '{}'", key), e))?;

        Ok(response.deleted() > 0)
    }

    async fn count(&self, key: &str) -> Result<u64, StateError> {
        let mut client = self.client("count", key).await?;

        let response = client
            .get(key, Some(GetOptions::new().with_count_only()))
            .await
            .map_err(|e| map_etcd_error(format!("Failed to count key '{}'", key), e))?;

        Ok(response.count().max(0) as u64)
    }

    async fn close(&self) -> Result<(), StateError> {
        // Dropping the last client handle tears down the gRPC channel
        if self.client.write().await.take().is_some() {
            info!(endpoints = ?self.endpoints, "Closed etcd session");
        }
        Ok(())
    }
}

/// Maps a client error onto the state error taxonomy
fn map_etcd_error(context: String, error: etcd_client::Error) -> StateError {
    match &error {
        etcd_client::Error::GRpcStatus(status) => match status.code() {
            Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled => {
                StateError::connection(format!("{}: {}", context, error))
            }
            _ => StateError::store(format!("{}: {}", context, error)),
        },
        etcd_client::Error::InvalidArgs(_) | etcd_client::Error::InvalidUri(_) => {
            StateError::config(format!("{}: {}", context, error))
        }
        _ => StateError::connection(format!("{}: {}", context, error)),
    }
}
