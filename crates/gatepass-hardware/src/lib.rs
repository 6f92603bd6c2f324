//! Device abstraction layer for the gatepass scanning pipeline.
//!
//! The pipeline depends on three platform devices: a live video camera
//! (continuous decoding in a browser-like environment), a native still camera
//! (one-shot capture on mobile) and a geolocation provider. This crate defines
//! a trait for each, enum wrappers for concrete dispatch, and mocks that tests
//! drive through paired handles.
//!
//! # Design
//!
//! - **Async-first**: device I/O uses native `async fn` in traits
//!   (Rust 1.90 + Edition 2024 RPITIT).
//! - **Owned handles**: a camera lock is held by the value that opened it and
//!   released on `close` or drop. A position watch is cancelled when its
//!   [`PositionWatch`](traits::PositionWatch) is dropped.
//! - **Error-aware**: [`HardwareError::is_device_failure`] separates failures
//!   that disable the camera from recoverable capture outcomes.
//!
//! ```no_run
//! use gatepass_hardware::traits::VideoCamera;
//! use gatepass_hardware::types::FacingMode;
//! use gatepass_hardware::Result;
//!
//! async fn can_stream<C: VideoCamera>(camera: &mut C) -> Result<bool> {
//!     camera.open(FacingMode::Environment).await?;
//!     let streaming = camera.next_frame().await.is_ok();
//!     camera.close().await?;
//!     Ok(streaming)
//! }
//! ```

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use devices::{AnyGeolocation, AnyStillCamera, AnyVideoCamera};
pub use error::{HardwareError, Result};
pub use traits::{GeolocationProvider, PositionUpdate, PositionWatch, StillCamera, VideoCamera};
pub use types::{
    CapturedImage, DeviceInfo, FacingMode, Frame, PositionOptions, StillCaptureOptions,
};
