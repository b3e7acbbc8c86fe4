//! Interfaces to the collaborators the console drives.
//!
//! The consensus/storage engine, peer-to-peer stack, transaction pools and
//! request servers live outside this crate; only these narrow traits are
//! consumed.

pub mod outbound;
