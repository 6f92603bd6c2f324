//! Value types exchanged with camera and geolocation devices.

use chrono::{DateTime, Utc};
use gatepass_core::constants::{
    DEFAULT_GEO_MAX_AGE_MS, DEFAULT_GEO_TIMEOUT_MS, DEFAULT_STILL_HEIGHT, DEFAULT_STILL_QUALITY,
    DEFAULT_STILL_WIDTH,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{HardwareError, Result};

/// Generic device information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "Rear Camera", "MockGeolocation").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional platform device id.
    pub device_id: Option<String>,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            device_id: None,
        }
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }
}

/// Which way the camera points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, pointed at the document or vehicle.
    #[default]
    Environment,
    /// Front camera.
    User,
}

/// One 8-bit grayscale frame from a video stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major luma samples, `width * height` bytes.
    pub luma: Vec<u8>,
    /// Monotonic per-stream frame counter.
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// Create a frame, checking that the buffer matches the dimensions.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::InvalidImage` if `luma.len() != width * height`.
    pub fn new(width: u32, height: u32, luma: Vec<u8>, sequence: u64) -> Result<Self> {
        let expected = width as usize * height as usize;
        if luma.len() != expected {
            return Err(HardwareError::invalid_image(format!(
                "frame buffer is {} bytes, expected {} for {}x{}",
                luma.len(),
                expected,
                width,
                height
            )));
        }

        Ok(Self {
            width,
            height,
            luma,
            sequence,
            captured_at: Utc::now(),
        })
    }
}

/// Result of a one-shot native capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedImage {
    /// Encoded image bytes (PNG or JPEG).
    Bytes(Vec<u8>),
    /// A `data:image/...;base64,` URI.
    DataUrl(String),
}

impl CapturedImage {
    pub fn is_empty(&self) -> bool {
        match self {
            CapturedImage::Bytes(bytes) => bytes.is_empty(),
            CapturedImage::DataUrl(url) => url.is_empty(),
        }
    }
}

/// Options passed to the native camera for a still capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StillCaptureOptions {
    /// JPEG quality, 0-100.
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub correct_orientation: bool,
    pub allow_editing: bool,
}

impl Default for StillCaptureOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_STILL_QUALITY,
            width: DEFAULT_STILL_WIDTH,
            height: DEFAULT_STILL_HEIGHT,
            correct_orientation: true,
            allow_editing: false,
        }
    }
}

/// Parameters of a continuous position watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the provider may return.
    pub maximum_age: Duration,
    /// Bound on acquiring a fix before reporting a timeout.
    pub timeout: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::from_millis(DEFAULT_GEO_MAX_AGE_MS),
            timeout: Duration::from_millis(DEFAULT_GEO_TIMEOUT_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rejects_mismatched_buffer() {
        assert!(Frame::new(4, 4, vec![0; 16], 0).is_ok());
        assert!(matches!(
            Frame::new(4, 4, vec![0; 15], 0),
            Err(HardwareError::InvalidImage { .. })
        ));
    }

    #[test]
    fn test_still_capture_defaults() {
        let options = StillCaptureOptions::default();
        assert_eq!(options.quality, 90);
        assert_eq!((options.width, options.height), (1024, 1024));
        assert!(options.correct_orientation);
        assert!(!options.allow_editing);
    }

    #[test]
    fn test_position_defaults() {
        let options = PositionOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.maximum_age, Duration::from_secs(30));
        assert_eq!(options.timeout, Duration::from_secs(27));
    }

    #[test]
    fn test_device_info_serialization() {
        let info = DeviceInfo::new("Rear Camera", "Mock").with_device_id("cam-0");
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("cam-0"));
    }
}
