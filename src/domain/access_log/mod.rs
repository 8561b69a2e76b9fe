//! Access log domain - audit records shipped through a message broker

mod broker;
mod entity;

pub use broker::{LogBroker, Subscription};
pub use entity::AccessLog;
