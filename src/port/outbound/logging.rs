//! Runtime log verbosity control.

use crate::error::Result;

/// Highest accepted verbosity, shared by `--clog-level` and `debug`.
pub const MAX_LOG_LEVEL: u8 = 127;

/// Lets the `debug` command change verbosity without restarting.
pub trait LogLevelControl: Send + Sync {
    /// Verbosity: 0 info, 1 debug, 2 and above trace.
    fn level(&self) -> u8;

    /// # Errors
    /// Fails when the installed filter cannot be replaced.
    fn set_level(&self, level: u8) -> Result<()>;
}
