//! Node console and monitoring subsystem.

pub mod config;
pub mod console;
pub mod context;
pub mod diagnostics;
pub mod repair;
pub mod shutdown;
pub mod statistics;
pub mod telemetry;

use std::any::Any;

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown".into())
}
