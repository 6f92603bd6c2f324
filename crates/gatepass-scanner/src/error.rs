//! Error types for the scanning pipeline.

use gatepass_hardware::HardwareError;
use gatepass_storage::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::state_machine::ScanLifecycle;

/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors returned by scanner operations.
///
/// Scan outcomes are not errors: a failed scan moves the session to
/// `Failed` and is reported through [`ScanFailure`]. `ScanError` is for
/// calls the session cannot carry out at all.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Requested lifecycle transition is not allowed.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: ScanLifecycle,
        to: ScanLifecycle,
    },

    /// Operation not allowed in the current lifecycle state.
    #[error("{operation} is not allowed while {state}")]
    NotAllowed {
        operation: &'static str,
        state: ScanLifecycle,
    },

    /// Follow-up action does not apply to the current result.
    #[error("Action unavailable: {0}")]
    ActionUnavailable(String),

    /// Captured image could not be converted into a frame.
    #[error("Image error: {0}")]
    Image(String),
}

impl ScanError {
    pub fn not_allowed(operation: &'static str, state: ScanLifecycle) -> Self {
        Self::NotAllowed { operation, state }
    }

    pub fn action_unavailable(message: impl Into<String>) -> Self {
        Self::ActionUnavailable(message.into())
    }

    pub fn image(message: impl Into<String>) -> Self {
        Self::Image(message.into())
    }
}

/// Failure classes that end a scan in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanFailure {
    /// Camera missing, refused or disconnected.
    Device,
    /// Decode ran but produced nothing usable.
    Recognition,
    /// Registry lookup or scan log insert failed.
    Lookup,
}

impl fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ScanFailure::Device => "device failure",
            ScanFailure::Recognition => "recognition failure",
            ScanFailure::Lookup => "lookup failure",
        };
        f.write_str(text)
    }
}

impl From<gatepass_storage::ReconcileFailure> for ScanFailure {
    fn from(failure: gatepass_storage::ReconcileFailure) -> Self {
        match failure {
            gatepass_storage::ReconcileFailure::Recognition => ScanFailure::Recognition,
            gatepass_storage::ReconcileFailure::Lookup => ScanFailure::Lookup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatepass_storage::ReconcileFailure;

    #[test]
    fn test_reconcile_failure_mapping() {
        assert_eq!(
            ScanFailure::from(ReconcileFailure::Lookup),
            ScanFailure::Lookup
        );
        assert_eq!(
            ScanFailure::from(ReconcileFailure::Recognition),
            ScanFailure::Recognition
        );
    }

    #[test]
    fn test_error_display() {
        let err = ScanError::not_allowed("Changing direction", ScanLifecycle::Scanning);
        assert_eq!(
            err.to_string(),
            "Changing direction is not allowed while Scanning"
        );

        let err: ScanError = HardwareError::permission_denied("Rear Camera").into();
        assert!(err.to_string().contains("Permission denied"));
    }
}
