use thiserror::Error;
use ui_platform::PlatformError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectError {
    #[error("nothing to inject")]
    EmptyText,
    #[error("injector misconfigured: {0}")]
    Config(&'static str),
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
    #[error("operation cancelled")]
    Cancelled,
}

impl InjectError {
    pub fn is_stale(&self) -> bool {
        matches!(self, InjectError::Platform(err) if err.is_stale())
    }
}
