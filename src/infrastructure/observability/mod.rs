//! Observability infrastructure - Metrics

mod metrics;

pub use self::metrics::{record_state_operation, register_default_metrics};
