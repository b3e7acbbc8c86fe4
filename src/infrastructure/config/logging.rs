//! Logging initialization and runtime verbosity control.

use std::sync::atomic::{AtomicU8, Ordering};

use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::adapter::inbound::cli::LogFormat;
use crate::error::{ConfigError, Error, Result};
use crate::port::outbound::LogLevelControl;

/// Filter directive for a console verbosity level.
#[must_use]
pub const fn level_directive(level: u8) -> &'static str {
    match level {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
///
/// Logs go to stderr so they do not tear the status line on stdout.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init(level: u8, format: LogFormat) -> Result<ReloadLogControl> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));
    let (filter, handle) = reload::Layer::new(filter);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|e| logging_error(e.to_string()))?;

    Ok(ReloadLogControl {
        handle,
        level: AtomicU8::new(level),
    })
}

fn logging_error(reason: String) -> Error {
    ConfigError::InvalidValue {
        field: "log_level",
        reason,
    }
    .into()
}

/// Swaps the installed filter when the `debug` command changes verbosity.
pub struct ReloadLogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    level: AtomicU8,
}

impl LogLevelControl for ReloadLogControl {
    fn level(&self) -> u8 {
        self.level.load(Ordering::SeqCst)
    }

    fn set_level(&self, level: u8) -> Result<()> {
        self.handle
            .reload(EnvFilter::new(level_directive(level)))
            .map_err(|e| logging_error(e.to_string()))?;
        self.level.store(level, Ordering::SeqCst);
        info!(level, filter = level_directive(level), "Log level changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_mapping() {
        assert_eq!(level_directive(0), "info");
        assert_eq!(level_directive(1), "debug");
        assert_eq!(level_directive(2), "trace");
        assert_eq!(level_directive(127), "trace");
    }
}
