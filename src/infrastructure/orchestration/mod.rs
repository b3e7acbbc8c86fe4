//! Startup wiring and the daemon lifecycle.

pub mod runtime;
pub mod startup;

pub use runtime::run;
