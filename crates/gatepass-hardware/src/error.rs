//! Error types for camera and geolocation devices.
//!
//! Geolocation failures are not represented here: a watch reports them as
//! [`gatepass_core::GeoError`] values on its update stream because they are
//! expected, non-fatal outcomes. `HardwareError` covers the failures that end
//! a capture.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The user or platform refused access to the device.
    #[error("Permission denied: {device}")]
    PermissionDenied { device: String },

    /// No usable device is present or it is locked by another consumer.
    #[error("Device unavailable: {device}")]
    DeviceUnavailable { device: String },

    /// Device was disconnected or its stream ended.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// An operation was attempted on a device that was never opened.
    #[error("Device not open: {device}")]
    NotOpen { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Operation is not supported by this device.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// The user dismissed the native camera without taking a photo.
    #[error("Capture cancelled")]
    CaptureCancelled,

    /// The captured image could not be read.
    #[error("Invalid image: {message}")]
    InvalidImage { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    pub fn permission_denied(device: impl Into<String>) -> Self {
        Self::PermissionDenied {
            device: device.into(),
        }
    }

    pub fn device_unavailable(device: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            device: device.into(),
        }
    }

    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn not_open(device: impl Into<String>) -> Self {
        Self::NotOpen {
            device: device.into(),
        }
    }

    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }

    /// Whether this error means the camera itself cannot be used.
    ///
    /// Device failures disable the scan toggle and require an explicit retry.
    /// A cancelled capture or an unreadable image is a recognition problem,
    /// not a device problem.
    pub fn is_device_failure(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. }
                | Self::DeviceUnavailable { .. }
                | Self::Disconnected { .. }
                | Self::NotOpen { .. }
                | Self::Timeout { .. }
                | Self::Unsupported { .. }
                | Self::Io(_)
        )
    }
}
