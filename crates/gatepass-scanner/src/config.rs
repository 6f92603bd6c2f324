//! Session configuration.
//!
//! Builder-style structs with defaults. [`SessionConfig::from_env`] overlays
//! a handful of environment variables for deployments:
//!
//! | Variable | Field |
//! |---|---|
//! | `GATEPASS_OFFICER_ID` | `officer_id` |
//! | `GATEPASS_GEO_TIMEOUT_MS` | `geolocation.options.timeout` |
//! | `GATEPASS_GEO_MAX_AGE_MS` | `geolocation.options.maximum_age` |
//! | `GATEPASS_GEO_HIGH_ACCURACY` | `geolocation.options.high_accuracy` |
//!
//! Unparseable values are ignored with a warning.

use gatepass_core::constants::{DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_OFFICER_ID};
use gatepass_hardware::types::{FacingMode, PositionOptions, StillCaptureOptions};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Camera settings for both capture modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Camera used in continuous mode.
    pub facing: FacingMode,
    /// Options for single-shot native capture.
    pub still: StillCaptureOptions,
    /// Buffered decode events before the capture task waits.
    pub event_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            still: StillCaptureOptions::default(),
            event_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl CaptureConfig {
    pub fn facing(mut self, facing: FacingMode) -> Self {
        self.facing = facing;
        self
    }

    pub fn still(mut self, still: StillCaptureOptions) -> Self {
        self.still = still;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

/// Position watch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeolocationConfig {
    pub options: PositionOptions,
}

impl GeolocationConfig {
    pub fn high_accuracy(mut self, enabled: bool) -> Self {
        self.options.high_accuracy = enabled;
        self
    }

    pub fn maximum_age(mut self, age: Duration) -> Self {
        self.options.maximum_age = age;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }
}

/// Everything a [`ScanSession`](crate::session::ScanSession) needs besides
/// its devices and collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Recorded as `security_officer_id` on every log entry.
    pub officer_id: String,
    pub capture: CaptureConfig,
    pub geolocation: GeolocationConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            officer_id: DEFAULT_OFFICER_ID.to_string(),
            capture: CaptureConfig::default(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn new(officer_id: impl Into<String>) -> Self {
        Self {
            officer_id: officer_id.into(),
            ..Default::default()
        }
    }

    pub fn capture(mut self, capture: CaptureConfig) -> Self {
        self.capture = capture;
        self
    }

    pub fn geolocation(mut self, geolocation: GeolocationConfig) -> Self {
        self.geolocation = geolocation;
        self
    }

    /// Defaults overlaid with the `GATEPASS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(officer) = lookup("GATEPASS_OFFICER_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            config.officer_id = officer;
        }

        let geo = &mut config.geolocation.options;
        if let Some(ms) = parse_var(&lookup, "GATEPASS_GEO_TIMEOUT_MS", |v| v.parse::<u64>().ok()) {
            geo.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, "GATEPASS_GEO_MAX_AGE_MS", |v| v.parse::<u64>().ok()) {
            geo.maximum_age = Duration::from_millis(ms);
        }
        if let Some(enabled) = parse_var(&lookup, "GATEPASS_GEO_HIGH_ACCURACY", parse_bool) {
            geo.high_accuracy = enabled;
        }

        config
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = lookup(name)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warn!(variable = name, value = %raw, "ignoring unparseable configuration value");
    }
    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
