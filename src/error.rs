use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to write config file: {0}")]
    WriteFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),
}

/// Failures surfaced by the storage/consensus collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("storage I/O failure: {0}")]
    Io(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Only I/O failures are worth retrying; missing or corrupt records are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Outcome of an aborted topological index repair walk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepairError {
    #[error("corruption detected at height {height}, repair aborted: {source}")]
    Corruption {
        height: i64,
        #[source]
        source: StoreError,
    },

    #[error("transient storage failure at height {height}, retry advised: {source}")]
    Transient {
        height: i64,
        #[source]
        source: StoreError,
    },
}

impl RepairError {
    /// Classify a store failure hit while visiting `height`.
    #[must_use]
    pub fn at(height: i64, source: StoreError) -> Self {
        if source.is_transient() {
            Self::Transient { height, source }
        } else {
            Self::Corruption { height, source }
        }
    }

    #[must_use]
    pub const fn retry_advised(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    #[must_use]
    pub const fn height(&self) -> i64 {
        match self {
            Self::Corruption { height, .. } | Self::Transient { height, .. } => *height,
        }
    }
}

/// Console command failures.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Arguments did not match the command's shape. Nothing was mutated.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Arguments parsed but the request cannot be honoured right now.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Failed(#[from] Error),
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        Self::Failed(Error::Store(err))
    }
}

impl From<RepairError> for CommandError {
    fn from(err: RepairError) -> Self {
        Self::Failed(Error::Repair(err))
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        Self::Failed(Error::Io(err))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Repair(#[from] RepairError),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid address `{0}`")]
    InvalidAddress(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("shutdown in progress")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_io_store_errors_are_transient() {
        assert!(StoreError::Io("disk".into()).is_transient());
        assert!(!StoreError::not_found("block").is_transient());
        assert!(!StoreError::Corrupt("bad".into()).is_transient());
    }

    #[test]
    fn repair_error_classification_follows_store_error() {
        let err = RepairError::at(7, StoreError::Io("timeout".into()));
        assert!(err.retry_advised());
        assert_eq!(err.height(), 7);

        let err = RepairError::at(9, StoreError::not_found("block abc"));
        assert!(!err.retry_advised());
        assert!(err.to_string().contains("corruption detected at height 9"));
    }

    #[test]
    fn usage_error_display() {
        assert_eq!(
            CommandError::Usage("ban <ip> [seconds]").to_string(),
            "usage: ban <ip> [seconds]"
        );
    }
}
