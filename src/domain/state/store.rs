//! State store trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::StateError;

#[cfg(test)]
use mockall::automock;

/// Primitive operations of the linearizable key-value store backing the
/// control plane.
///
/// Absence of a key is never an error: `get` returns `None`, `delete`
/// returns `false` and `count` returns `0`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StateStore: Send + Sync + Debug {
    /// Gets the value stored at a key
    async fn get(&self, key: &str) -> Result<Option<String>, StateError>;

    /// Stores a value at a key, overwriting any existing value
    async fn put(&self, key: &str, value: &str) -> Result<(), StateError>;

    /// Deletes a key, returns true if a value was removed
    async fn delete(&self, key: &str) -> Result<bool, StateError>;

    /// Counts the entries stored at exactly this key
    async fn count(&self, key: &str) -> Result<u64, StateError>;

    /// Releases the underlying session
    async fn close(&self) -> Result<(), StateError>;
}
