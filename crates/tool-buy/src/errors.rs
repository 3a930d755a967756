use std::fmt;
use std::time::Duration;

use autobuyer_core_types::BuyerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("buy surface for '{0}' not present")]
    SurfaceMissing(String),
    #[error("dispatch exceeded {0:?}")]
    TimedOut(Duration),
    #[error("page port failed: {0}")]
    Port(#[from] BuyerError),
}

impl From<DispatchError> for BuyerError {
    fn from(err: DispatchError) -> Self {
        BuyerError::new(err.to_string())
    }
}

/// Non-fatal failure classes. None of them stop a cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorClass {
    /// Category, row or menu not on the page right now.
    AdapterUnavailable,
    /// No strategy fired, so nothing suggests the purchase happened.
    DispatchAmbiguous,
    /// The decision rule declined the item.
    DecisionSkip,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorClass::AdapterUnavailable => "adapter_unavailable",
            ErrorClass::DispatchAmbiguous => "dispatch_ambiguous",
            ErrorClass::DecisionSkip => "decision_skip",
        };
        f.write_str(label)
    }
}
