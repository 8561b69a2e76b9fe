//! Domain layer - Core state types, encodings and store traits

pub mod access_log;
pub mod error;
pub mod state;

pub use access_log::{AccessLog, LogBroker, Subscription};
pub use error::StateError;
pub use state::{decode_record, encode_record, KeyRecord, StateStore, RECORD_DELIMITER};
