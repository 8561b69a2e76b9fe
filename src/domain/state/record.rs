//! Key Record value encoding
//!
//! A Key Record is stored as `account:key_id`. Decoding splits on the first
//! delimiter only, so a key id may contain `:` but an account may not.

use serde::{Deserialize, Serialize};

use crate::domain::StateError;

/// Separator between the account and the key id in a stored Key Record
pub const RECORD_DELIMITER: char = ':';

/// The (account, key id) pair associated with a valid API key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRecord {
    pub account: String,
    pub key_id: String,
}

impl KeyRecord {
    pub fn new(account: impl Into<String>, key_id: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            key_id: key_id.into(),
        }
    }

    pub fn encode(&self) -> String {
        encode_record(&self.account, &self.key_id)
    }

    pub fn decode(value: &str) -> Result<Self, StateError> {
        decode_record(value)
    }
}

/// Encodes an (account, key id) pair into a stored value
pub fn encode_record(account: &str, key_id: &str) -> String {
    format!("{}{}{}", account, RECORD_DELIMITER, key_id)
}

/// Decodes a stored value back into its (account, key id) pair
pub fn decode_record(value: &str) -> Result<KeyRecord, StateError> {
    match value.split_once(RECORD_DELIMITER) {
        Some((account, key_id)) => Ok(KeyRecord::new(account, key_id)),
        None => Err(StateError::malformed_record(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_record() {
        assert_eq!(encode_record("ACC1", "ID1"), "ACC1:ID1");
    }

    #[test]
    fn test_decode_record() {
        let record = decode_record("ACC1:ID1").unwrap();
        assert_eq!(record, KeyRecord::new("ACC1", "ID1"));
    }

    #[test]
    fn test_round_trip() {
        let pairs = [
            ("0xD3E8ce4841ed658Ec8dcb99B7a74beFC377253EA", "42"),
            ("", ""),
            ("account", ""),
            ("", "key-id"),
            ("acc", "id:with:colons"),
        ];

        for (account, key_id) in pairs {
            let decoded = decode_record(&encode_record(account, key_id)).unwrap();
            assert_eq!(decoded.account, account);
            assert_eq!(decoded.key_id, key_id);
        }
    }

    #[test]
    fn test_decode_splits_on_first_delimiter() {
        let record = decode_record("a:b:c").unwrap();
        assert_eq!(record.account, "a");
        assert_eq!(record.key_id, "b:c");
    }

    #[test]
    fn test_account_with_delimiter_is_not_recoverable() {
        let decoded = KeyRecord::decode(&KeyRecord::new("a:b", "c").encode()).unwrap();
        assert_ne!(decoded, KeyRecord::new("a:b", "c"));
        assert_eq!(decoded, KeyRecord::new("a", "b:c"));
    }

    #[test]
    fn test_decode_without_delimiter_fails() {
        let result = decode_record("no-delimiter");

        match result {
            Err(StateError::MalformedRecord { value }) => assert_eq!(value, "no-delimiter"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_decode_empty_value_fails() {
        assert!(matches!(
            decode_record(""),
            Err(StateError::MalformedRecord { .. })
        ));
    }
}
