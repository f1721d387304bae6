#![forbid(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),

    #[error("update_interval must be between 10 and 300 seconds, got {0}s")]
    InvalidInterval(u64),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Rejection of a configuration change. The message is shown to the user
/// verbatim.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpdateError {
    #[error("Usage: `{0}`")]
    Usage(&'static str),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Interval must be between 10 and 300 seconds")]
    IntervalOutOfRange(u64),

    #[error("View mode must be 'detailed' or 'compact'")]
    InvalidViewMode(String),

    #[error("Color mode must be 'dynamic' or 'static'")]
    InvalidColorMode(String),

    #[error("Unknown threshold type. Available: cpu, memory, disk, temperature")]
    UnknownThreshold(String),

    #[error("Value must be 'on' or 'off'")]
    InvalidToggle(String),

    #[error("Invalid value format: {0}")]
    InvalidValue(String),
}
