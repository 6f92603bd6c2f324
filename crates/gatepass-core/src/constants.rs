//! Shared constants for the gate scanning pipeline.
//!
//! Values here are the defaults every crate in the workspace agrees on:
//! identifier length bounds, geolocation watch parameters and still-capture
//! settings. Runtime configuration structs start from these values.
//!
//! ```
//! use gatepass_core::constants::*;
//!
//! assert_eq!(SA_ID_NUMBER_LENGTH, 13);
//! assert!(MIN_REGISTRATION_LENGTH < MAX_REGISTRATION_LENGTH);
//! ```

// ============================================================================
// Identifiers
// ============================================================================

/// Length of a South African identity number (YYMMDD SSSS C A Z).
pub const SA_ID_NUMBER_LENGTH: usize = 13;

/// Minimum length of a generic document number or access code.
pub const MIN_DOCUMENT_NUMBER_LENGTH: usize = 6;

/// Maximum length of a generic document number or access code.
pub const MAX_DOCUMENT_NUMBER_LENGTH: usize = 20;

/// Minimum length of a normalised vehicle registration.
pub const MIN_REGISTRATION_LENGTH: usize = 2;

/// Maximum length of a normalised vehicle registration.
pub const MAX_REGISTRATION_LENGTH: usize = 10;

/// Gender digits (positions 7-10) at or above this value denote male.
pub const SA_ID_MALE_THRESHOLD: u16 = 5000;

// ============================================================================
// Geolocation
// ============================================================================

/// Default maximum age of a cached position fix, in milliseconds.
pub const DEFAULT_GEO_MAX_AGE_MS: u64 = 30_000;

/// Default acquisition timeout for a position fix, in milliseconds.
pub const DEFAULT_GEO_TIMEOUT_MS: u64 = 27_000;

// ============================================================================
// Still capture
// ============================================================================

/// JPEG quality requested from the native camera.
pub const DEFAULT_STILL_QUALITY: u8 = 90;

/// Target width of a native capture, in pixels.
pub const DEFAULT_STILL_WIDTH: u32 = 1024;

/// Target height of a native capture, in pixels.
pub const DEFAULT_STILL_HEIGHT: u32 = 1024;

// ============================================================================
// Pipeline
// ============================================================================

/// Capacity of the per-session decode event channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 32;

/// Officer id used when no authenticated officer is configured.
pub const DEFAULT_OFFICER_ID: &str = "unassigned-officer";
