//! Read-only admission queries

use tracing::debug;

use crate::domain::state::keys;
use crate::domain::{decode_record, KeyRecord, StateError};

use super::client::StateClient;
use super::factory::StoreConfig;

/// Answers "is this key valid" and "is this account paused"
#[derive(Debug, Clone)]
pub struct StateReader {
    client: StateClient,
}

impl StateReader {
    pub fn new(client: StateClient) -> Self {
        Self { client }
    }

    /// Opens a dedicated session for this reader
    pub async fn connect(config: &StoreConfig) -> Result<Self, StateError> {
        Ok(Self::new(StateClient::connect(config).await?))
    }

    pub fn client(&self) -> &StateClient {
        &self.client
    }

    pub async fn stop(&self) {
        self.client.stop().await;
    }

    /// Looks up the Key Record of an API key
    ///
    /// Returns `Ok(None)` when the key was never created or has been deleted.
    /// A stored value without the delimiter fails with
    /// [`StateError::MalformedRecord`] carrying the raw value.
    pub async fn check_key(&self, key: &str) -> Result<Option<KeyRecord>, StateError> {
        let state_key = keys::valid_key(key);

        let record = match self.client.get(&state_key).await? {
            Some(value) => Some(decode_record(&value)?),
            None => None,
        };

        debug!(key = %state_key, found = record.is_some(), "Checked key");

        Ok(record)
    }

    /// Whether the account currently carries a Pause Flag
    pub async fn check_account_paused(&self, account: &str) -> Result<bool, StateError> {
        let state_key = keys::paused_account(account);

        let paused = self.client.count(&state_key).await? > 0;

        debug!(key = %state_key, paused, "Checked account");

        Ok(paused)
    }
}
