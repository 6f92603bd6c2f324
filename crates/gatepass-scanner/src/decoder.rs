//! Frame decoding and outcome classification.
//!
//! A [`Decoder`] turns a camera frame into a [`DecodeEvent`]. Barcode scan
//! types go through a pluggable [`SymbolEngine`]; ANPR skips symbol decoding
//! and hands the frame to a [`PlateRecognizer`].
//!
//! # Classification
//!
//! | Engine outcome | Per-frame (`decode`) | One-shot (`decode_once`) |
//! |---|---|---|
//! | symbol found | `Success` | `Success` |
//! | not found / format / checksum | `SoftMiss` | `HardFailure` |
//! | out-of-range fault | `SoftMiss`, logged at debug | `HardFailure` |
//! | unsupported / other | `HardFailure` | `HardFailure` |
//!
//! Some engines throw index-out-of-range faults while walking the edge of a
//! malformed frame. Only that class is suppressed; anything unexpected still
//! surfaces as a hard failure.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use gatepass_core::{ScanType, SymbolFormat, VehicleRegistration};
use gatepass_hardware::HardwareError;
use gatepass_hardware::types::{CapturedImage, Frame};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{Result, ScanError, ScanFailure};

/// Search parameters passed to a [`SymbolEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeHints {
    pub formats: Vec<SymbolFormat>,
    /// Heavier per-frame search. Always on for gate scanning.
    pub try_harder: bool,
}

impl DecodeHints {
    pub fn for_scan_type(scan_type: ScanType) -> Self {
        Self {
            formats: scan_type.symbol_formats().to_vec(),
            try_harder: true,
        }
    }
}

/// A decoded barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub text: String,
    pub format: SymbolFormat,
}

impl Symbol {
    pub fn new(text: impl Into<String>, format: SymbolFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }
}

/// Errors reported by a symbol engine or plate recognizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("no symbol found")]
    NotFound,

    /// Internal indexing fault on a malformed frame.
    #[error("index out of range: {0}")]
    OutOfRange(String),

    #[error("malformed symbol: {0}")]
    Format(String),

    #[error("symbol checksum mismatch")]
    Checksum,

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Other(String),
}

/// Multi-format barcode decoding engine.
pub trait SymbolEngine: Send + Sync {
    fn decode(&self, frame: &Frame, hints: &DecodeHints) -> std::result::Result<Symbol, EngineError>;
}

/// Plate text recovered from an image.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateReading {
    pub plate: VehicleRegistration,
    /// 0.0 to 1.0.
    pub confidence: f32,
}

/// Image-in, plate-out recognition boundary.
pub trait PlateRecognizer: Send + Sync {
    fn recognize(&self, frame: &Frame) -> std::result::Result<PlateReading, EngineError>;
}

const PROVINCE_SUFFIXES: &[&str] = &["GP", "WP", "KZN", "EC", "NW", "MP", "L", "FS", "NC"];

/// Stand-in plate recognizer.
///
/// Produces a South African style plate (`ABC123GP`) seeded from the frame
/// content, so the same image always reads the same. Frames without any
/// contrast read as "not found". Replace with a real recognition provider in
/// production.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedPlateRecognizer {
    confidence: f32,
}

impl Default for SimulatedPlateRecognizer {
    fn default() -> Self {
        Self { confidence: 0.87 }
    }
}

impl SimulatedPlateRecognizer {
    pub fn with_confidence(confidence: f32) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

impl PlateRecognizer for SimulatedPlateRecognizer {
    fn recognize(&self, frame: &Frame) -> std::result::Result<PlateReading, EngineError> {
        let (low, high) = frame
            .luma
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if frame.luma.is_empty() || low == high {
            return Err(EngineError::NotFound);
        }

        let mut hasher = DefaultHasher::new();
        frame.width.hash(&mut hasher);
        frame.height.hash(&mut hasher);
        frame.luma.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        let letters: String = (0..3)
            .map(|_| char::from(b'A' + rng.random_range(0..26u8)))
            .collect();
        let digits: String = (0..3)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect();
        let province = PROVINCE_SUFFIXES[rng.random_range(0..PROVINCE_SUFFIXES.len())];

        let plate = VehicleRegistration::new(&format!("{letters}{digits}{province}"))
            .map_err(|e| EngineError::Other(e.to_string()))?;

        Ok(PlateReading {
            plate,
            confidence: self.confidence,
        })
    }
}

/// Why a decode attempt did not produce a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorKind {
    NotFound,
    OutOfRange,
    Format,
    Checksum,
    PermissionDenied,
    DeviceUnavailable,
    Disconnected,
    Cancelled,
    InvalidImage,
    Unsupported,
    Other,
}

impl DecodeErrorKind {
    /// Expected per-frame outcomes that never leave the capture boundary.
    pub fn is_soft_miss(self) -> bool {
        matches!(
            self,
            DecodeErrorKind::NotFound
                | DecodeErrorKind::OutOfRange
                | DecodeErrorKind::Format
                | DecodeErrorKind::Checksum
        )
    }

    /// Failure class when this kind ends a scan.
    pub fn failure_class(self) -> ScanFailure {
        match self {
            DecodeErrorKind::PermissionDenied
            | DecodeErrorKind::DeviceUnavailable
            | DecodeErrorKind::Disconnected
            | DecodeErrorKind::Unsupported => ScanFailure::Device,
            _ => ScanFailure::Recognition,
        }
    }

    pub fn from_engine(error: &EngineError) -> Self {
        match error {
            EngineError::NotFound => DecodeErrorKind::NotFound,
            EngineError::OutOfRange(_) => DecodeErrorKind::OutOfRange,
            EngineError::Format(_) => DecodeErrorKind::Format,
            EngineError::Checksum => DecodeErrorKind::Checksum,
            EngineError::Unsupported(_) => DecodeErrorKind::Unsupported,
            EngineError::Other(_) => DecodeErrorKind::Other,
        }
    }

    pub fn from_hardware(error: &HardwareError) -> Self {
        match error {
            HardwareError::PermissionDenied { .. } => DecodeErrorKind::PermissionDenied,
            HardwareError::DeviceUnavailable { .. } | HardwareError::NotOpen { .. } => {
                DecodeErrorKind::DeviceUnavailable
            }
            HardwareError::Disconnected { .. }
            | HardwareError::Timeout { .. }
            | HardwareError::Io(_) => DecodeErrorKind::Disconnected,
            HardwareError::Unsupported { .. } => DecodeErrorKind::Unsupported,
            HardwareError::CaptureCancelled => DecodeErrorKind::Cancelled,
            HardwareError::InvalidImage { .. } => DecodeErrorKind::InvalidImage,
            HardwareError::Other(_) => DecodeErrorKind::Other,
        }
    }
}

/// Outcome of one decode attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecodeEvent {
    Success {
        text: String,
        /// `None` for plate readings.
        format: Option<SymbolFormat>,
    },
    SoftMiss,
    HardFailure {
        kind: DecodeErrorKind,
        message: String,
    },
}

impl DecodeEvent {
    pub fn hard_failure(kind: DecodeErrorKind, message: impl Into<String>) -> Self {
        DecodeEvent::HardFailure {
            kind,
            message: message.into(),
        }
    }

    pub fn from_hardware(error: &HardwareError) -> Self {
        Self::hard_failure(DecodeErrorKind::from_hardware(error), error.to_string())
    }

    pub fn is_soft_miss(&self) -> bool {
        matches!(self, DecodeEvent::SoftMiss)
    }

    /// Success and hard failure both end a capture.
    pub fn is_terminal(&self) -> bool {
        !self.is_soft_miss()
    }

    pub fn failure_class(&self) -> Option<ScanFailure> {
        match self {
            DecodeEvent::HardFailure { kind, .. } => Some(kind.failure_class()),
            _ => None,
        }
    }
}

/// Decoder for one scan type.
///
/// Cheap to construct; engines are shared behind `Arc`.
#[derive(Clone)]
pub struct Decoder {
    scan_type: ScanType,
    hints: DecodeHints,
    engine: Arc<dyn SymbolEngine>,
    recognizer: Arc<dyn PlateRecognizer>,
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("scan_type", &self.scan_type)
            .field("hints", &self.hints)
            .finish_non_exhaustive()
    }
}

impl Decoder {
    pub fn new(
        scan_type: ScanType,
        engine: Arc<dyn SymbolEngine>,
        recognizer: Arc<dyn PlateRecognizer>,
    ) -> Self {
        Self {
            scan_type,
            hints: DecodeHints::for_scan_type(scan_type),
            engine,
            recognizer,
        }
    }

    /// Same engines, different scan type.
    pub fn for_scan_type(&self, scan_type: ScanType) -> Self {
        Self::new(scan_type, Arc::clone(&self.engine), Arc::clone(&self.recognizer))
    }

    pub fn scan_type(&self) -> ScanType {
        self.scan_type
    }

    pub fn hints(&self) -> &DecodeHints {
        &self.hints
    }

    /// Decode one video frame. Misses are soft.
    pub fn decode(&self, frame: &Frame) -> DecodeEvent {
        match self.attempt(frame) {
            Ok(event) => event,
            Err(error) => self.classify(frame, &error),
        }
    }

    /// Decode a single captured image. Every outcome is terminal.
    pub fn decode_once(&self, frame: &Frame) -> DecodeEvent {
        match self.attempt(frame) {
            Ok(event) => event,
            Err(error) => {
                DecodeEvent::hard_failure(DecodeErrorKind::from_engine(&error), error.to_string())
            }
        }
    }

    /// Convert and decode a native camera capture.
    pub fn decode_image(&self, image: &CapturedImage) -> DecodeEvent {
        match frame_from_image(image) {
            Ok(frame) => self.decode_once(&frame),
            Err(err) => DecodeEvent::hard_failure(DecodeErrorKind::InvalidImage, err.to_string()),
        }
    }

    fn attempt(&self, frame: &Frame) -> std::result::Result<DecodeEvent, EngineError> {
        if !self.scan_type.uses_symbol_decoding() {
            let reading = self.recognizer.recognize(frame)?;
            debug!(plate = %reading.plate, confidence = reading.confidence, "plate recognised");
            return Ok(DecodeEvent::Success {
                text: reading.plate.as_str().to_string(),
                format: None,
            });
        }

        let symbol = self.engine.decode(frame, &self.hints)?;
        if !self.hints.formats.contains(&symbol.format) {
            return Err(EngineError::Format(format!(
                "{} not allowed for {} scans",
                symbol.format, self.scan_type
            )));
        }

        Ok(DecodeEvent::Success {
            text: symbol.text,
            format: Some(symbol.format),
        })
    }

    fn classify(&self, frame: &Frame, error: &EngineError) -> DecodeEvent {
        let kind = DecodeErrorKind::from_engine(error);
        match kind {
            DecodeErrorKind::OutOfRange => {
                debug!(frame = frame.sequence, %error, "suppressed out-of-range fault from symbol engine");
                DecodeEvent::SoftMiss
            }
            kind if kind.is_soft_miss() => {
                trace!(frame = frame.sequence, %error, "no symbol in frame");
                DecodeEvent::SoftMiss
            }
            kind => DecodeEvent::hard_failure(kind, error.to_string()),
        }
    }
}

/// Convert captured image bytes or a `data:` URI into a luma frame.
///
/// # Errors
///
/// `ScanError::Image` for undecodable data, `ScanError::Hardware` when the
/// result is not a valid frame.
pub fn frame_from_image(image: &CapturedImage) -> Result<Frame> {
    let bytes: Cow<'_, [u8]> = match image {
        CapturedImage::Bytes(bytes) => Cow::Borrowed(bytes),
        CapturedImage::DataUrl(url) => Cow::Owned(decode_data_url(url)?),
    };

    if bytes.is_empty() {
        return Err(ScanError::image("captured image is empty"));
    }

    let luma = image::load_from_memory(&bytes)
        .map_err(|e| ScanError::image(e.to_string()))?
        .to_luma8();
    let (width, height) = luma.dimensions();

    Ok(Frame::new(width, height, luma.into_raw(), 0)?)
}

fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| ScanError::image("not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ScanError::image("data URI has no payload"))?;

    if !header.ends_with(";base64") {
        return Err(ScanError::image("data URI is not base64 encoded"));
    }

    STANDARD
        .decode(payload.trim())
        .map_err(|e| ScanError::image(e.to_string()))
}
