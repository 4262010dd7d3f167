//! Shared primitives for the RideScan automation crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod geo;
pub mod keywords;

pub use geo::{GeoPoint, Place};
pub use keywords::KeywordTables;

/// Error type shared by the value types in this crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("invalid place literal '{0}' (expected LAT,LNG[,NAME])")]
    InvalidPlace(String),
}

/// Identifier of one fleet run, used to correlate log lines and events.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical key of a supported ride service ("uber", "ola", ...).
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppKey(pub String);

impl AppKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_key_is_normalised() {
        assert_eq!(AppKey::new(" Uber ").as_str(), "uber");
        assert_eq!(AppKey::from("NammaYatri"), AppKey::new("nammayatri"));
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
