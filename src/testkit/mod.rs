//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`node`] - [`TestNode`], a node wired from in-memory collaborators.
//! - [`console`] - Captured console output and scripted terminal input.

pub mod console;
pub mod node;

pub use console::{plain, ScriptedLines, SharedBuffer};
pub use node::{TestNode, TestNodeBuilder};
