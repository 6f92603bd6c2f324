//! Device trait definitions.
//!
//! These traits are the contract between the scanning pipeline and the
//! platform devices it depends on: a live video camera, a native still camera
//! and a geolocation provider. Mock implementations live in [`crate::mock`].
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use gatepass_core::{GeoError, GeoFix};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::{CapturedImage, DeviceInfo, FacingMode, Frame, PositionOptions, StillCaptureOptions};

/// One update from a position watch.
pub type PositionUpdate = std::result::Result<GeoFix, GeoError>;

/// Trait for live video cameras decoded frame by frame.
///
/// A camera holds a platform lock between [`open`](VideoCamera::open) and
/// [`close`](VideoCamera::close). Implementations must also release the lock
/// when dropped while open.
///
/// # Examples
///
/// ```no_run
/// use gatepass_hardware::traits::VideoCamera;
/// use gatepass_hardware::types::FacingMode;
/// use gatepass_hardware::Result;
///
/// async fn first_frame<C: VideoCamera>(camera: &mut C) -> Result<usize> {
///     camera.open(FacingMode::Environment).await?;
///     let frame = camera.next_frame().await;
///     camera.close().await?;
///     Ok(frame?.luma.len())
/// }
/// ```
pub trait VideoCamera: Send + Sync {
    /// Acquire the camera and start streaming.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` or `DeviceUnavailable` when the platform refuses.
    async fn open(&mut self, facing: FacingMode) -> Result<()>;

    /// Wait for the next frame.
    ///
    /// # Errors
    ///
    /// `NotOpen` before `open`, `Disconnected` when the stream ends.
    async fn next_frame(&mut self) -> Result<Frame>;

    /// Stop streaming and release the camera. Closing a closed camera is a no-op.
    async fn close(&mut self) -> Result<()>;

    /// Whether the camera currently holds the device lock.
    fn is_open(&self) -> bool;

    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Trait for native one-shot cameras.
pub trait StillCamera: Send + Sync {
    /// Open the platform camera UI and return the captured image.
    ///
    /// # Errors
    ///
    /// `CaptureCancelled` when the user dismisses the camera, or a device
    /// failure when it cannot be opened.
    async fn take_photo(&mut self, options: &StillCaptureOptions) -> Result<CapturedImage>;

    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Trait for continuous position providers.
pub trait GeolocationProvider: Send + Sync {
    /// Start a continuous watch.
    ///
    /// Acquisition failures are delivered as `Err(GeoError)` updates on the
    /// returned watch, not as an error from this call.
    async fn watch_position(&mut self, options: &PositionOptions) -> Result<PositionWatch>;

    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// An active position watch.
///
/// The watch stays registered with the provider for as long as this value
/// lives. Dropping it, or calling [`clear`](PositionWatch::clear), cancels it.
#[derive(Debug)]
pub struct PositionWatch {
    id: u64,
    updates: mpsc::Receiver<PositionUpdate>,
}

impl PositionWatch {
    pub fn new(id: u64, updates: mpsc::Receiver<PositionUpdate>) -> Self {
        Self { id, updates }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next update. `None` once the provider stops the watch.
    pub async fn next_update(&mut self) -> Option<PositionUpdate> {
        self.updates.recv().await
    }

    /// Cancel the watch.
    pub fn clear(mut self) {
        self.updates.close();
    }
}
