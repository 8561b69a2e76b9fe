//! Namespaced storage keys

/// Prefix of the key holding a Key Record, one per API key
pub const VALID_KEY_PREFIX: &str = "valid-key:";

/// Prefix of the presence-only Pause Flag, one per account
pub const PAUSED_ACCOUNT_PREFIX: &str = "paused-account:";

/// Storage key of the Key Record for an API key
pub fn valid_key(api_key: &str) -> String {
    format!("{}{}", VALID_KEY_PREFIX, api_key)
}

/// Storage key of the Pause Flag for an account
pub fn paused_account(account: &str) -> String {
    format!("{}{}", PAUSED_ACCOUNT_PREFIX, account)
}
