//! Error types for the locator

use thiserror::Error;
use ui_platform::PlatformError;

#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// The platform returned no window content yet
    #[error("UI tree unavailable")]
    TreeUnavailable,

    /// Platform call failed while fetching the tree
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl LocatorError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LocatorError::TreeUnavailable => true,
            LocatorError::Platform(err) => err.is_transient(),
        }
    }
}
