use thiserror::Error;

/// Errors raised by the control-plane state client
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Invalid key info: {value}")]
    MalformedRecord { value: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl StateError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn malformed_record(value: impl Into<String>) -> Self {
        Self::MalformedRecord {
            value: value.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// True for dial, transport, timeout and closed-session failures
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let error = StateError::config("No endpoints configured");
        assert_eq!(
            error.to_string(),
            "Configuration error: No endpoints configured"
        );
    }

    #[test]
    fn test_malformed_record_keeps_raw_value() {
        let error = StateError::malformed_record("no-delimiter-here");
        assert_eq!(error.to_string(), "Invalid key info: no-delimiter-here");

        match error {
            StateError::MalformedRecord { value } => assert_eq!(value, "no-delimiter-here"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_is_connection() {
        assert!(StateError::connection("dial timeout").is_connection());
        assert!(!StateError::store("permission denied").is_connection());
        assert!(!StateError::config("empty").is_connection());
    }
}
