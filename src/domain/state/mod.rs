//! Control-plane state domain - key templates, Key Record encoding and the
//! store abstraction

pub mod keys;
mod record;
mod store;

pub use record::{decode_record, encode_record, KeyRecord, RECORD_DELIMITER};
pub use store::StateStore;

#[cfg(test)]
pub use store::MockStateStore;
