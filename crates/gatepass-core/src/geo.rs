//! Geolocation value types.
//!
//! A session's location is always exactly one of three things: no fix yet,
//! a fix, or an acquisition error ([`LocationStatus`]). A fix and an error
//! are never valid at the same time; each update replaces the previous one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// A single position fix from the geolocation provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    pub captured_at: DateTime<Utc>,
}

impl GeoFix {
    /// Create a fix, validating coordinate ranges.
    ///
    /// # Errors
    /// Returns `Error::InvalidCoordinates` when latitude is outside
    /// [-90, 90] or longitude outside [-180, 180], and
    /// `Error::InvalidAccuracy` for a negative or non-finite accuracy.
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
        captured_at: DateTime<Utc>,
    ) -> Result<Self> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || !(-90.0..=90.0).contains(&latitude)
            || !(-180.0..=180.0).contains(&longitude)
        {
            return Err(Error::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        if !accuracy_meters.is_finite() || accuracy_meters < 0.0 {
            return Err(Error::InvalidAccuracy(accuracy_meters));
        }

        Ok(Self {
            latitude,
            longitude,
            accuracy_meters,
            captured_at,
        })
    }

    /// Shape stored in the `geo_location` column of a scan log entry.
    #[must_use]
    pub fn to_point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: self.accuracy_meters,
        }
    }
}

impl fmt::Display for GeoFix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:.6}, {:.6} (±{:.0}m)",
            self.latitude, self.longitude, self.accuracy_meters
        )
    }
}

/// Persisted location: `{latitude, longitude, accuracy}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

/// Why a position could not be acquired.
///
/// Numeric values follow the browser geolocation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GeoErrorCode {
    PermissionDenied = 1,
    PositionUnavailable = 2,
    Timeout = 3,
}

impl fmt::Display for GeoErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GeoErrorCode::PermissionDenied => write!(f, "PermissionDenied"),
            GeoErrorCode::PositionUnavailable => write!(f, "PositionUnavailable"),
            GeoErrorCode::Timeout => write!(f, "Timeout"),
        }
    }
}

/// A failed position acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct GeoError {
    pub code: GeoErrorCode,
    pub message: String,
}

impl GeoError {
    pub fn new(code: GeoErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(GeoErrorCode::PermissionDenied, message)
    }

    pub fn position_unavailable(message: impl Into<String>) -> Self {
        Self::new(GeoErrorCode::PositionUnavailable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GeoErrorCode::Timeout, message)
    }
}

/// Current location knowledge of a scan session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LocationStatus {
    /// Watch started, no fix or error received yet. Not an error.
    #[default]
    AwaitingFix,
    /// Most recent update was a fix.
    Fixed(GeoFix),
    /// Most recent update was an error; location is unknown.
    Unavailable(GeoError),
}

impl LocationStatus {
    /// The current fix, if the latest update was one.
    #[must_use]
    pub fn fix(&self) -> Option<&GeoFix> {
        match self {
            LocationStatus::Fixed(fix) => Some(fix),
            _ => None,
        }
    }

    /// The current error, if the latest update was one.
    #[must_use]
    pub fn error(&self) -> Option<&GeoError> {
        match self {
            LocationStatus::Unavailable(err) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_awaiting(&self) -> bool {
        matches!(self, LocationStatus::AwaitingFix)
    }

    /// Human-readable indicator text.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            LocationStatus::AwaitingFix => "Acquiring location...".to_string(),
            LocationStatus::Fixed(fix) => format!("Location: {fix}"),
            LocationStatus::Unavailable(err) => format!("Location unknown ({})", err.code),
        }
    }
}

impl From<std::result::Result<GeoFix, GeoError>> for LocationStatus {
    fn from(update: std::result::Result<GeoFix, GeoError>) -> Self {
        match update {
            Ok(fix) => LocationStatus::Fixed(fix),
            Err(err) => LocationStatus::Unavailable(err),
        }
    }
}
