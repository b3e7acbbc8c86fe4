//! Process plumbing: settings, logging and lifecycle orchestration.

pub mod config;
pub mod orchestration;
