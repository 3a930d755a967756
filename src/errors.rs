//! Application-level errors.

use std::path::PathBuf;

use autobuyer_scheduler::SchedulerError;
use cdp_adapter::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutobuyerError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("browser session: {0}")]
    Browser(#[from] AdapterError),
    #[error(transparent)]
    Engine(#[from] SchedulerError),
}

impl AutobuyerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
