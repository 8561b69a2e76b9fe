//! State store operation metrics
//!
//! Recorded through the `metrics` facade; whichever recorder the embedding
//! gateway installs receives them.

use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Publishes the crate version as an info gauge
pub fn register_default_metrics() {
    gauge!("gateway_control_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record one round trip to the state store
pub fn record_state_operation(operation: &'static str, success: bool, duration: Duration) {
    let status = if success { "success" } else { "error" };

    counter!("state_operations_total", "operation" => operation, "status" => status).increment(1);
    histogram!("state_operation_duration_seconds", "operation" => operation)
        .record(duration.as_secs_f64());
}
