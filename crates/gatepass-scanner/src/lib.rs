//! Scanning pipeline for gate security officers.
//!
//! Camera frames or native captures go through the [`capture`] adapter and
//! the [`decoder`], which reads symbols through the `rxing`-backed
//! [`engine`] by default. A [`session`] drives the lifecycle state machine and
//! hands decoded payloads to the storage crate's reconciler, and the
//! [`presenter`] turns the outcome into something an officer can act on.
//! A [`geolocation`] tracker runs alongside and never blocks a scan.
//!
//! ```no_run
//! use gatepass_hardware::mock::{MockGeolocation, MockVideoCamera};
//! use gatepass_scanner::{CaptureDevices, ScanSession};
//! use gatepass_storage::{Database, ScanReconciler, SqliteRegistry};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory().await?;
//! let reconciler = Arc::new(ScanReconciler::new(SqliteRegistry::new(db.pool().clone())));
//! let (camera, _camera_handle) = MockVideoCamera::new();
//! let (provider, _geo_handle) = MockGeolocation::new();
//!
//! let mut session = ScanSession::builder(reconciler)
//!     .capture_devices(CaptureDevices::with_video(camera))
//!     .geolocation(provider)
//!     .open()
//!     .await;
//!
//! session.start().await?;
//! let state = session.run_until_settled().await?;
//! println!("{state}: {}", session.presentation().message);
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod geolocation;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod notify;
pub mod presenter;
pub mod session;
pub mod state_machine;

pub use capture::{CaptureAdapter, CaptureDevices, CaptureMode, PlatformCapabilities};
pub use config::{CaptureConfig, GeolocationConfig, SessionConfig};
pub use decoder::{
    DecodeErrorKind, DecodeEvent, DecodeHints, Decoder, EngineError, PlateReading,
    PlateRecognizer, SimulatedPlateRecognizer, Symbol, SymbolEngine,
    frame_from_image,
};
pub use engine::MultiFormatEngine;
pub use error::{Result, ScanError, ScanFailure};
pub use geolocation::GeolocationTracker;
pub use notify::{ChannelNotifier, Notification, Notifier, NullNotifier, Severity, TracingNotifier};
pub use presenter::{FollowUpAction, Presentation, Tone, available_actions};
pub use session::{
    ActionOutcome, PendingScan, ScanSession, ScanSessionBuilder, ScanTicket, SessionFailure,
    SessionSnapshot,
};
pub use state_machine::{ScanLifecycle, StateMachine, StateMachineBuilder, StateTransition};
