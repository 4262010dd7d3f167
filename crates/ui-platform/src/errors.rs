//! Error types surfaced by platform collaborators

use thiserror::Error;

use crate::tree::NodeHandle;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The node belongs to a tree generation that has since been replaced
    #[error("stale node handle {0}")]
    StaleNode(NodeHandle),

    /// The platform cannot answer right now (service rebinding, window change)
    #[error("platform unavailable: {0}")]
    Unavailable(String),

    /// Unknown package or node
    #[error("not found: {0}")]
    NotFound(String),

    /// Refused by the platform with an explicit reason
    #[error("action rejected: {0}")]
    ActionRejected(String),

    /// Anything else the platform threw at us
    #[error("platform internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    pub fn is_stale(&self) -> bool {
        matches!(self, PlatformError::StaleNode(_))
    }

    /// Worth retrying after a settle interval
    pub fn is_transient(&self) -> bool {
        matches!(self, PlatformError::Unavailable(_))
    }
}
