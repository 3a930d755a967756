use std::time::Duration;

use autobuyer_core_types::BuyerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("page not ready after {0:?}")]
    ReadinessTimeout(Duration),
    #[error("cancelled")]
    Cancelled,
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Port(#[from] BuyerError),
}

impl From<SchedulerError> for BuyerError {
    fn from(value: SchedulerError) -> Self {
        match value {
            SchedulerError::Port(inner) => inner,
            other => BuyerError::new(other.to_string()),
        }
    }
}
