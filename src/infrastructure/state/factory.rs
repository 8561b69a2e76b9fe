//! State store factory for runtime selection

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::domain::{StateError, StateStore};

use super::etcd::EtcdStore;
use super::in_memory::InMemoryStore;

/// Dial timeout applied when none is configured
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Supported store backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// etcd cluster reached over gRPC
    #[default]
    Etcd,
    /// Process-local map
    #[serde(alias = "inmemory", alias = "memory")]
    InMemory,
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreType::Etcd => write!(f, "etcd"),
            StoreType::InMemory => write!(f, "in_memory"),
        }
    }
}

impl std::str::FromStr for StoreType {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "etcd" => Ok(StoreType::Etcd),
            "in_memory" | "inmemory" | "memory" => Ok(StoreType::InMemory),
            _ => Err(StateError::config(format!(
                "Unknown store type: {}. Valid types: etcd, in_memory",
                s
            ))),
        }
    }
}

/// Username and password attached to an authenticated session
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection configuration for the state store
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreType,
    /// Ordered `host:port` endpoints of the etcd cluster
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_dial_timeout_ms")]
    pub dial_timeout_ms: u64,
    /// Upper bound for a single store round trip, unbounded when absent
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_endpoints() -> Vec<String> {
    vec!["localhost:2379".to_string()]
}

fn default_dial_timeout_ms() -> u64 {
    duration_ms(DEFAULT_DIAL_TIMEOUT)
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreType::Etcd,
            endpoints: default_endpoints(),
            username: None,
            password: None,
            dial_timeout_ms: default_dial_timeout_ms(),
            request_timeout_ms: None,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("endpoints", &self.endpoints)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("dial_timeout", &self.dial_timeout())
            .field("request_timeout", &self.request_timeout())
            .finish()
    }
}

impl StoreConfig {
    /// Creates a configuration for an etcd cluster
    pub fn etcd<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            backend: StoreType::Etcd,
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Creates a configuration for the in-memory store
    pub fn in_memory() -> Self {
        Self {
            backend: StoreType::InMemory,
            endpoints: Vec::new(),
            ..Default::default()
        }
    }

    /// Authenticates the session with a username and password
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout_ms = duration_ms(timeout);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(duration_ms(timeout));
        self
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Resolves the optional username and password into session credentials
    ///
    /// Both absent means an unauthenticated session; supplying only one of
    /// them is rejected.
    pub fn credentials(&self) -> Result<Option<Credentials>, StateError> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Ok(Some(Credentials::new(username.clone(), password.clone())))
            }
            (None, None) => Ok(None),
            (Some(_), None) => Err(StateError::config("Username given without a password")),
            (None, Some(_)) => Err(StateError::config("Password given without a username")),
        }
    }
}

/// Factory for creating state store instances
#[derive(Debug, Default)]
pub struct StoreFactory;

impl StoreFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates a store instance based on configuration
    pub async fn create(&self, config: &StoreConfig) -> Result<Arc<dyn StateStore>, StateError> {
        match config.backend {
            StoreType::Etcd => {
                let credentials = config.credentials()?;
                let store = EtcdStore::connect(
                    &config.endpoints,
                    credentials.as_ref(),
                    config.dial_timeout(),
                )
                .await?;
                Ok(Arc::new(store))
            }
            StoreType::InMemory => {
                info!("Using in-memory state store");
                Ok(Arc::new(InMemoryStore::new()))
            }
        }
    }
}
