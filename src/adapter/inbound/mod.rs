//! Inbound adapters: startup flags and the operator terminal.

pub mod cli;
pub mod terminal;
