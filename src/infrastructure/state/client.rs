//! Connection handle shared by readers and writers

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::domain::{StateError, StateStore};
use crate::infrastructure::observability::record_state_operation;

use super::factory::{StoreConfig, StoreFactory};

/// Session to the state store
///
/// Cloning is cheap and every clone shares the same session, so one handle
/// can back any number of [`StateReader`](super::StateReader)s and
/// [`StateWriter`](super::StateWriter)s. Dropping an operation's future
/// cancels the in-flight call.
#[derive(Debug, Clone)]
pub struct StateClient {
    store: Arc<dyn StateStore>,
    request_timeout: Option<Duration>,
}

impl StateClient {
    /// Opens a session described by the configuration
    ///
    /// Fails with [`StateError::Config`] when no etcd endpoint is given or the
    /// credentials are incomplete, and with [`StateError::Connection`] when
    /// the dial fails or exceeds the dial timeout.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StateError> {
        info!(backend = %config.backend, "Connecting to state store");

        let store = StoreFactory::new().create(config).await?;
        let mut client = Self::from_store(store);
        client.request_timeout = config.request_timeout();

        Ok(client)
    }

    /// Wraps an already constructed store
    pub fn from_store(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            request_timeout: None,
        }
    }

    /// Bounds every store round trip; expiry surfaces as a connection error
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Releases the session
    ///
    /// Idempotent. Close failures are logged and discarded so shutdown never
    /// fails the caller.
    pub async fn stop(&self) {
        match self.store.close().await {
            Ok(()) => info!("State client stopped"),
            Err(e) => warn!("Ignoring error while closing state store: {}", e),
        }
    }

    pub(crate) async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        self.run("get", key, self.store.get(key)).await
    }

    pub(crate) async fn put(&self, key: &str, value: &str) -> Result<(), StateError> {
        self.run("put", key, self.store.put(key, value)).await
    }

    pub(crate) async fn delete(&self, key: &str) -> Result<bool, StateError> {
        self.run("delete", key, self.store.delete(key)).await
    }

    pub(crate) async fn count(&self, key: &str) -> Result<u64, StateError> {
        self.run("count", key, self.store.count(key)).await
    }

    async fn run<T, F>(
        &self,
        operation: &'static str,
        key: &str,
        call: F,
    ) -> Result<T, StateError>
    where
        F: Future<Output = Result<T, StateError>>,
    {
        let started = Instant::now();

        let result = match self.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .unwrap_or_else(|_| {
                    Err(StateError::connection(format!(
                        "Failed to {} key '{}': timed out after {:?}",
                        operation, key, timeout
                    )))
                }),
            None => call.await,
        };

        record_state_operation(operation, result.is_ok(), started.elapsed());

        result
    }
}
