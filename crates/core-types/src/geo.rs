//! Geographic points handed over by the presentation layer.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Latitude/longitude pair in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Rejects NaN and anything outside [-90,90] / [-180,180].
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoreError::LatitudeOutOfRange(self.lat));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoreError::LongitudeOutOfRange(self.lng));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// A named location: pickup or dropoff.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub point: GeoPoint,
    #[serde(default)]
    pub name: String,
}

impl Place {
    pub fn new(lat: f64, lng: f64, name: impl Into<String>) -> Self {
        Self {
            point: GeoPoint::new(lat, lng),
            name: name.into(),
        }
    }

    pub fn lat(&self) -> f64 {
        self.point.lat
    }

    pub fn lng(&self) -> f64 {
        self.point.lng
    }
}

impl FromStr for Place {
    type Err = CoreError;

    /// Parses `LAT,LNG` or `LAT,LNG,NAME`. Range checks are left to
    /// [`GeoPoint::validate`] so callers can report them uniformly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ',');
        let lat = parts
            .next()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .ok_or_else(|| CoreError::InvalidPlace(s.to_string()))?;
        let lng = parts
            .next()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .ok_or_else(|| CoreError::InvalidPlace(s.to_string()))?;
        let name = parts.next().map(|v| v.trim().to_string()).unwrap_or_default();
        Ok(Place::new(lat, lng, name))
    }
}
