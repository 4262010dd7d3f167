//! Flow error types
//!
//! Expected conditions (app missing, no field, text refused) are
//! [`StageOutcome`](crate::StageOutcome) values. These errors cover what is
//! left: cancellation, bad input, and platform faults caught at the
//! orchestrator boundary.

use field_locator::LocatorError;
use ridescan_core_types::CoreError;
use text_injector::InjectError;
use thiserror::Error;
use ui_platform::PlatformError;

#[derive(Debug, Error, Clone)]
pub enum FlowError {
    /// Pickup or dropoff outside the valid coordinate ranges
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(#[from] CoreError),

    /// App key missing from the catalog
    #[error("unknown app '{0}'")]
    UnknownApp(String),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("locator error: {0}")]
    Locator(#[from] LocatorError),

    #[error("text injection error: {0}")]
    Inject(InjectError),

    #[error("automation cancelled")]
    Cancelled,

    /// A spawned per-app task panicked or was aborted
    #[error("task failed: {0}")]
    TaskFailed(String),
}

impl From<InjectError> for FlowError {
    fn from(err: InjectError) -> Self {
        match err {
            InjectError::Cancelled => FlowError::Cancelled,
            other => FlowError::Inject(other),
        }
    }
}

impl FlowError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FlowError::Cancelled)
    }
}
