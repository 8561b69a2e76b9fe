//! In-memory state store

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{StateError, StateStore};

/// Single-process state store
///
/// Every operation takes the map lock, so operations are linearizable within
/// the process. Useful for tests and local development where no etcd cluster
/// is available.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
    closed: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an entry, bypassing the closed check
    pub async fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.write().await.insert(key.into(), value.into());
        self
    }

    /// Number of stored entries across all namespaces
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn ensure_open(&self, operation: &str, key: &str) -> Result<(), StateError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StateError::connection(format!(
                "Failed to {} key '{}': store session closed",
                operation, key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
        self.ensure_open("get", key)?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StateError> {
        self.ensure_open("put", key)?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StateError> {
        self.ensure_open("delete", key)?;
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn count(&self, key: &str) -> Result<u64, StateError> {
        self.ensure_open("count", key)?;
        Ok(u64::from(self.entries.read().await.contains_key(key)))
    }

    async fn close(&self) -> Result<(), StateError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
