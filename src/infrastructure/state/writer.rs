//! Mutating control-plane operations
//!
//! Every write is an unconditional put or delete. Concurrent writers to the
//! same key are ordered by the store and the last one wins.

use tracing::debug;

use crate::domain::state::keys;
use crate::domain::{encode_record, StateError};

use super::client::StateClient;
use super::factory::StoreConfig;

/// Issues and revokes API keys, pauses and resumes accounts
#[derive(Debug, Clone)]
pub struct StateWriter {
    client: StateClient,
}

impl StateWriter {
    pub fn new(client: StateClient) -> Self {
        Self { client }
    }

    /// Opens a dedicated session for this writer
    pub async fn connect(config: &StoreConfig) -> Result<Self, StateError> {
        Ok(Self::new(StateClient::connect(config).await?))
    }

    pub fn client(&self) -> &StateClient {
        &self.client
    }

    pub async fn stop(&self) {
        self.client.stop().await;
    }

    /// Registers an API key for an account, replacing any existing record
    pub async fn create_key(&self, account: &str, key_id: &str, key: &str) -> Result<(), StateError> {
        let state_key = keys::valid_key(key);

        self.client
            .put(&state_key, &encode_record(account, key_id))
            .await?;

        debug!(key = %state_key, account, key_id, "Created key");

        Ok(())
    }

    /// Revokes an API key; revoking an unknown key succeeds
    pub async fn delete_key(&self, key: &str) -> Result<(), StateError> {
        let state_key = keys::valid_key(key);

        let deleted = self.client.delete(&state_key).await?;

        debug!(key = %state_key, deleted, "Deleted key");

        Ok(())
    }

    /// Suspends an account; pausing twice leaves a single flag
    pub async fn pause_account(&self, account: &str) -> Result<(), StateError> {
        let state_key = keys::paused_account(account);

        self.client.put(&state_key, "").await?;

        debug!(key = %state_key, "Paused account");

        Ok(())
    }

    /// Lifts an account suspension; resuming an active account succeeds
    pub async fn resume_account(&self, account: &str) -> Result<(), StateError> {
        let state_key = keys::paused_account(account);

        let deleted = self.client.delete(&state_key).await?;

        debug!(key = %state_key, deleted, "Resumed account");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::state::MockStateStore;
    use crate::domain::StateStore;
    use crate::infrastructure::state::InMemoryStore;

    fn writer_with(store: Arc<InMemoryStore>) -> StateWriter {
        StateWriter::new(StateClient::from_store(store))
    }

    #[tokio::test]
    async fn test_create_key_stores_encoded_record() {
        let store = Arc::new(InMemoryStore::new());
        let writer = writer_with(store.clone());

        writer.create_key("ACC1", "ID1", "K1").await.unwrap();

        assert_eq!(
            store.get("valid-key:K1").await.unwrap(),
            Some("ACC1:ID1".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_key_overwrites() {
        let store = Arc::new(InMemoryStore::new());
        let writer = writer_with(store.clone());

        writer.create_key("ACC1", "ID1", "K1").await.unwrap();
        writer.create_key("ACC2", "ID2", "K1").await.unwrap();

        assert_eq!(
            store.get("valid-key:K1").await.unwrap(),
            Some("ACC2:ID2".to_string())
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_key() {
        let store = Arc::new(InMemoryStore::new().with_entry("valid-key:K1", "A:I").await);
        let writer = writer_with(store.clone());

        writer.delete_key("K1").await.unwrap();

        assert_eq!(store.get("valid-key:K1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_key_succeeds() {
        let writer = writer_with(Arc::new(InMemoryStore::new()));

        writer.delete_key("never-created").await.unwrap();
        writer.delete_key("never-created").await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_account_twice_leaves_one_flag() {
        let store = Arc::new(InMemoryStore::new());
        let writer = writer_with(store.clone());

        writer.pause_account("ACC1").await.unwrap();
        writer.pause_account("ACC1").await.unwrap();

        assert_eq!(store.count("paused-account:ACC1").await.unwrap(), 1);
        assert_eq!(
            store.get("paused-account:ACC1").await.unwrap(),
            Some(String::new())
        );
    }

    #[tokio::test]
    async fn test_resume_account() {
        let store = Arc::new(InMemoryStore::new());
        let writer = writer_with(store.clone());

        writer.pause_account("ACC1").await.unwrap();
        writer.resume_account("ACC1").await.unwrap();

        assert_eq!(store.count("paused-account:ACC1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_resume_active_account_succeeds() {
        let writer = writer_with(Arc::new(InMemoryStore::new()));
        writer.resume_account("ACC1").await.unwrap();
    }

    #[tokio::test]
    async fn test_writes_use_namespaced_keys() {
        let mut store = MockStateStore::new();
        store
            .expect_put()
            .withf(|key, value| key == "valid-key:K1" && value == "ACC1:ID1")
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_put()
            .withf(|key, value| key == "paused-account:ACC1" && value.is_empty())
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_delete()
            .withf(|key| key == "valid-key:K1" || key == "paused-account:ACC1")
            .times(2)
            .returning(|_| Ok(false));

        let writer = StateWriter::new(StateClient::from_store(Arc::new(store)));

        writer.create_key("ACC1", "ID1", "K1").await.unwrap();
        writer.pause_account("ACC1").await.unwrap();
        writer.delete_key("K1").await.unwrap();
        writer.resume_account("ACC1").await.unwrap();
    }

    #[tokio::test]
    async fn test_write_errors_propagate() {
        let mut store = MockStateStore::new();
        store.expect_put().returning(|key, _| {
            Err(StateError::connection(format!(
                "Failed to put key '{}': connection refused",
                key
            )))
        });
        store
            .expect_delete()
            .returning(|_| Err(StateError::store("permission denied")));

        let writer = StateWriter::new(StateClient::from_store(Arc::new(store)));

        let error = writer.create_key("ACC1", "ID1", "K1").await.unwrap_err();
        assert!(error.is_connection());
        assert!(error.to_string().contains("valid-key:K1"));

        assert!(writer.pause_account("ACC1").await.is_err());
        assert!(writer.delete_key("K1").await.is_err());
        assert!(writer.resume_account("ACC1").await.is_err());
    }

    #[tokio::test]
    async fn test_failed_call_does_not_poison_handle() {
        let mut store = MockStateStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(StateError::connection("leader changed")));
        store
            .expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let writer = StateWriter::new(StateClient::from_store(Arc::new(store)));

        assert!(writer.pause_account("ACC1").await.is_err());
        assert!(writer.pause_account("ACC1").await.is_ok());
    }
}
