//! Request server and log level stand-ins.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::error::{Error, Result};
use crate::port::outbound::{LogLevelControl, RequestServer};

/// [`RequestServer`] that only records whether it was stopped.
#[derive(Debug)]
pub struct MemoryServer {
    name: String,
    stopped: AtomicBool,
    fail_on_stop: bool,
}

impl MemoryServer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stopped: AtomicBool::new(false),
            fail_on_stop: false,
        }
    }

    /// A server whose `stop` always fails.
    #[must_use]
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            fail_on_stop: true,
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl RequestServer for MemoryServer {
    fn name(&self) -> &str {
        &self.name
    }

    fn stop(&self) -> Result<()> {
        if self.fail_on_stop {
            return Err(Error::Network(format!("{} refused to stop", self.name)));
        }
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// [`LogLevelControl`] that stores the level without touching a subscriber.
#[derive(Debug, Default)]
pub struct FixedLogLevel {
    level: AtomicU8,
}

impl FixedLogLevel {
    #[must_use]
    pub fn new(level: u8) -> Self {
        Self {
            level: AtomicU8::new(level),
        }
    }
}

impl LogLevelControl for FixedLogLevel {
    fn level(&self) -> u8 {
        self.level.load(Ordering::SeqCst)
    }

    fn set_level(&self, level: u8) -> Result<()> {
        self.level.store(level, Ordering::SeqCst);
        Ok(())
    }
}
