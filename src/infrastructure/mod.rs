//! Infrastructure layer - Store backends, state clients and log shipping

pub mod access_log;
pub mod logging;
pub mod observability;
pub mod state;
