//! Capture adapter.
//!
//! Hides the two capture strategies behind one stream of [`DecodeEvent`]s:
//!
//! - **Continuous**: a live video camera is opened and every frame is
//!   decoded until a terminal event or [`CaptureAdapter::stop_capture`].
//! - **Single-shot**: the native camera takes one photo, which is decoded
//!   once and yields exactly one terminal event.
//!
//! The mode follows the platform's capabilities, never the officer's choice.
//! A native camera wins when both are present.
//!
//! The device is moved into the capture task and handed back when the task
//! ends, so a stopped capture always leaves the camera closed and ready for
//! the next one. Decoding runs on the blocking pool; a stop does not wait
//! for an in-flight decode, whose result is discarded.

use gatepass_hardware::devices::{AnyStillCamera, AnyVideoCamera};
use gatepass_hardware::traits::{StillCamera, VideoCamera};
use gatepass_hardware::types::{FacingMode, StillCaptureOptions};
use gatepass_hardware::HardwareError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::CaptureConfig;
use crate::decoder::{DecodeErrorKind, DecodeEvent, Decoder};
use crate::error::Result;

/// What the platform can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformCapabilities {
    pub live_video: bool,
    pub native_camera: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    Continuous,
    SingleShot,
}

impl CaptureMode {
    /// Pick the capture mode for a platform, `None` if it has no camera.
    pub fn select(capabilities: PlatformCapabilities) -> Option<Self> {
        if capabilities.native_camera {
            Some(CaptureMode::SingleShot)
        } else if capabilities.live_video {
            Some(CaptureMode::Continuous)
        } else {
            None
        }
    }
}

/// Cameras available to a session.
#[derive(Debug, Default)]
pub struct CaptureDevices {
    pub video: Option<AnyVideoCamera>,
    pub still: Option<AnyStillCamera>,
}

impl CaptureDevices {
    pub fn with_video(video: impl Into<AnyVideoCamera>) -> Self {
        Self {
            video: Some(video.into()),
            still: None,
        }
    }

    pub fn with_still(still: impl Into<AnyStillCamera>) -> Self {
        Self {
            video: None,
            still: Some(still.into()),
        }
    }

    pub fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities {
            live_video: self.video.is_some(),
            native_camera: self.still.is_some(),
        }
    }
}

enum CaptureTask {
    Continuous(JoinHandle<AnyVideoCamera>),
    SingleShot(JoinHandle<AnyStillCamera>),
}

struct ActiveCapture {
    cancel: CancellationToken,
    task: CaptureTask,
}

/// Owns the session's cameras and runs at most one capture at a time.
pub struct CaptureAdapter {
    devices: CaptureDevices,
    mode: Option<CaptureMode>,
    config: CaptureConfig,
    active: Option<ActiveCapture>,
}

impl std::fmt::Debug for CaptureAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureAdapter")
            .field("mode", &self.mode)
            .field("capturing", &self.is_capturing())
            .finish_non_exhaustive()
    }
}

impl CaptureAdapter {
    pub fn new(devices: CaptureDevices, config: CaptureConfig) -> Self {
        let mode = CaptureMode::select(devices.capabilities());
        debug!(?mode, "capture mode selected");

        Self {
            devices,
            mode,
            config,
            active: None,
        }
    }

    pub fn mode(&self) -> Option<CaptureMode> {
        self.mode
    }

    /// Whether a capture task is running or has not been collected yet.
    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    /// Start capturing and decoding with `decoder`.
    ///
    /// Device failures (permission, missing camera) arrive as a
    /// `HardFailure` event on the stream, not as an error here.
    ///
    /// # Errors
    ///
    /// `Unsupported` when the platform has no camera, or when a capture is
    /// already running.
    pub async fn start_capture(&mut self, decoder: Decoder) -> Result<mpsc::Receiver<DecodeEvent>> {
        if self.active.is_some() {
            return Err(HardwareError::Unsupported {
                operation: "starting a second capture".to_string(),
            }
            .into());
        }

        let (tx, rx) = mpsc::channel(self.config.event_capacity);
        let cancel = CancellationToken::new();

        let task = match self.mode {
            Some(CaptureMode::Continuous) => {
                let camera = self.devices.video.take().ok_or_else(missing_camera)?;
                CaptureTask::Continuous(tokio::spawn(run_continuous(
                    camera,
                    decoder,
                    self.config.facing,
                    tx,
                    cancel.clone(),
                )))
            }
            Some(CaptureMode::SingleShot) => {
                let camera = self.devices.still.take().ok_or_else(missing_camera)?;
                CaptureTask::SingleShot(tokio::spawn(run_single_shot(
                    camera,
                    decoder,
                    self.config.still,
                    tx,
                    cancel.clone(),
                )))
            }
            None => return Err(missing_camera().into()),
        };

        info!(mode = ?self.mode, "capture started");
        self.active = Some(ActiveCapture { cancel, task });
        Ok(rx)
    }

    /// Stop the running capture and wait until its camera is released.
    ///
    /// Stopping when nothing runs is a no-op.
    pub async fn stop_capture(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.cancel.cancel();
        match active.task {
            CaptureTask::Continuous(handle) => match handle.await {
                Ok(camera) => self.devices.video = Some(camera),
                Err(e) => error!(error = %e, "capture task did not return its camera"),
            },
            CaptureTask::SingleShot(handle) => match handle.await {
                Ok(camera) => self.devices.still = Some(camera),
                Err(e) => error!(error = %e, "capture task did not return its camera"),
            },
        }

        debug!("capture stopped");
    }

    /// Replace the cameras, stopping any running capture first.
    ///
    /// The capture mode is re-selected from the new devices.
    pub async fn switch_devices(&mut self, devices: CaptureDevices) {
        self.stop_capture().await;
        self.mode = CaptureMode::select(devices.capabilities());
        self.devices = devices;
        info!(mode = ?self.mode, "capture devices replaced");
    }
}

impl Drop for CaptureAdapter {
    fn drop(&mut self) {
        // The task drops its camera on abort, which releases the lock.
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            match active.task {
                CaptureTask::Continuous(handle) => handle.abort(),
                CaptureTask::SingleShot(handle) => handle.abort(),
            }
        }
    }
}

fn missing_camera() -> HardwareError {
    HardwareError::Unsupported {
        operation: "capture without a camera".to_string(),
    }
}

async fn run_continuous(
    mut camera: AnyVideoCamera,
    decoder: Decoder,
    facing: FacingMode,
    tx: mpsc::Sender<DecodeEvent>,
    cancel: CancellationToken,
) -> AnyVideoCamera {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        result = camera.open(facing) => Some(result),
    };

    match opened {
        None => return camera,
        Some(Err(e)) => {
            warn!(error = %e, "camera could not be opened");
            let _ = tx.send(DecodeEvent::from_hardware(&e)).await;
            return camera;
        }
        Some(Ok(())) => {}
    }

    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            frame = camera.next_frame() => Some(frame),
        };

        let event = match frame {
            None => break,
            Some(Ok(frame)) => {
                let decoder = decoder.clone();
                match decode_blocking(&cancel, move || decoder.decode(&frame)).await {
                    Some(event) => event,
                    None => break,
                }
            }
            Some(Err(e)) => {
                warn!(error = %e, "camera stream failed");
                DecodeEvent::from_hardware(&e)
            }
        };

        // Misses are informational; drop them rather than stall the camera.
        if event.is_soft_miss() {
            if tx.try_send(event).is_err() && tx.is_closed() {
                break;
            }
            continue;
        }

        trace!(?event, "terminal decode event");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = tx.send(event) => {}
        }
        break;
    }

    if let Err(e) = camera.close().await {
        warn!(error = %e, "failed to close camera");
    }
    camera
}

/// Run a decode on the blocking pool. `None` when cancelled first.
async fn decode_blocking<F>(cancel: &CancellationToken, decode: F) -> Option<DecodeEvent>
where
    F: FnOnce() -> DecodeEvent + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(decode);
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        joined = handle => Some(joined.unwrap_or_else(|e| {
            error!(error = %e, "decode task failed");
            DecodeEvent::hard_failure(DecodeErrorKind::Other, e.to_string())
        })),
    }
}

async fn run_single_shot(
    mut camera: AnyStillCamera,
    decoder: Decoder,
    options: StillCaptureOptions,
    tx: mpsc::Sender<DecodeEvent>,
    cancel: CancellationToken,
) -> AnyStillCamera {
    let photo = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        photo = camera.take_photo(&options) => Some(photo),
    };

    let event = match photo {
        None => return camera,
        Some(Ok(image)) => {
            match decode_blocking(&cancel, move || decoder.decode_image(&image)).await {
                Some(event) => event,
                None => return camera,
            }
        }
        Some(Err(e)) => {
            debug!(error = %e, "native capture returned no image");
            DecodeEvent::from_hardware(&e)
        }
    };

    let _ = tx.send(event).await;
    camera
}
