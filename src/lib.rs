//! dagd - operator console for a DAG blockchain node daemon.
//!
//! The daemon samples its collaborators into an atomically published
//! telemetry snapshot, redraws a one-line status prompt from it and serves
//! an interactive command console. It can also heal the chain's
//! topological index by walking primary parents back from the tips.
//!
//! # Architecture
//!
//! - [`domain`] - Identifiers, block and peer records, counters, formatting
//! - [`port`] - Collaborator interfaces (chain, network, pools, mining)
//! - [`application`] - Telemetry, statistics, repair, diagnostics, console
//!   and shutdown coordination
//! - [`adapter`] - Startup flags, terminal I/O and in-memory collaborators
//! - [`infrastructure`] - Settings, logging and lifecycle orchestration
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - Prewired test node for integration tests

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
