//! Mock video camera for testing and development.
//!
//! Frames are pushed through a [`MockVideoCameraHandle`]. The handle also
//! reports how many device locks are currently held, which is how tests check
//! that a capture released the camera.

use crate::{
    HardwareError, Result,
    traits::VideoCamera,
    types::{DeviceInfo, FacingMode, Frame},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct CameraState {
    permission_denied: AtomicBool,
    unavailable: AtomicBool,
    open_handles: AtomicUsize,
    opened_total: AtomicUsize,
    next_sequence: AtomicU64,
}

/// Mock live camera.
///
/// # Examples
///
/// ```
/// use gatepass_hardware::mock::MockVideoCamera;
/// use gatepass_hardware::traits::VideoCamera;
/// use gatepass_hardware::types::FacingMode;
///
/// #[tokio::main]
/// async fn main() -> gatepass_hardware::Result<()> {
///     let (mut camera, handle) = MockVideoCamera::new();
///
///     camera.open(FacingMode::Environment).await?;
///     assert_eq!(handle.open_handles(), 1);
///
///     handle.push_frame(2, 2, vec![0, 255, 255, 0]).await?;
///     let frame = camera.next_frame().await?;
///     assert_eq!(frame.width, 2);
///
///     camera.close().await?;
///     assert_eq!(handle.open_handles(), 0);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockVideoCamera {
    frame_rx: mpsc::Receiver<Frame>,
    state: Arc<CameraState>,
    name: String,
    facing: Option<FacingMode>,
}

impl MockVideoCamera {
    /// Create a new mock camera with the default name.
    pub fn new() -> (Self, MockVideoCameraHandle) {
        Self::with_name("Mock Camera".to_string())
    }

    pub fn with_name(name: String) -> (Self, MockVideoCameraHandle) {
        let (frame_tx, frame_rx) = mpsc::channel(32);
        let state = Arc::new(CameraState::default());

        let camera = Self {
            frame_rx,
            state: Arc::clone(&state),
            name: name.clone(),
            facing: None,
        };

        let handle = MockVideoCameraHandle {
            frame_tx,
            state,
            name,
        };

        (camera, handle)
    }

    /// Facing mode requested by the last `open`, if the camera is open.
    pub fn facing(&self) -> Option<FacingMode> {
        self.facing
    }

    fn release(&mut self) {
        if self.facing.take().is_some() {
            self.state.open_handles.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl VideoCamera for MockVideoCamera {
    async fn open(&mut self, facing: FacingMode) -> Result<()> {
        if self.state.permission_denied.load(Ordering::SeqCst) {
            return Err(HardwareError::permission_denied(&self.name));
        }
        if self.state.unavailable.load(Ordering::SeqCst) {
            return Err(HardwareError::device_unavailable(&self.name));
        }

        if self.facing.replace(facing).is_none() {
            self.state.open_handles.fetch_add(1, Ordering::SeqCst);
            self.state.opened_total.fetch_add(1, Ordering::SeqCst);
        }

        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Frame> {
        if self.facing.is_none() {
            return Err(HardwareError::not_open(&self.name));
        }

        self.frame_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(&self.name))
    }

    async fn close(&mut self) -> Result<()> {
        self.release();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.facing.is_some()
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(&self.name, "MockVideoCamera"))
    }
}

impl Drop for MockVideoCamera {
    fn drop(&mut self) {
        self.release();
    }
}

/// Control handle for a [`MockVideoCamera`].
#[derive(Debug, Clone)]
pub struct MockVideoCameraHandle {
    frame_tx: mpsc::Sender<Frame>,
    state: Arc<CameraState>,
    name: String,
}

impl MockVideoCameraHandle {
    /// Push a grayscale frame into the stream.
    ///
    /// # Errors
    ///
    /// `InvalidImage` for a mismatched buffer, `Disconnected` if the camera
    /// has been dropped.
    pub async fn push_frame(&self, width: u32, height: u32, luma: Vec<u8>) -> Result<()> {
        let sequence = self.state.next_sequence.fetch_add(1, Ordering::SeqCst);
        let frame = Frame::new(width, height, luma, sequence)?;

        self.frame_tx
            .send(frame)
            .await
            .map_err(|_| HardwareError::disconnected(&self.name))
    }

    /// Push an all-black frame, which contains no symbol.
    pub async fn push_blank_frame(&self) -> Result<()> {
        self.push_frame(8, 8, vec![0; 64]).await
    }

    /// Make subsequent `open` calls fail with `PermissionDenied`.
    pub fn deny_permission(&self) {
        self.state.permission_denied.store(true, Ordering::SeqCst);
    }

    /// Make subsequent `open` calls fail with `DeviceUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of device locks currently held.
    pub fn open_handles(&self) -> usize {
        self.state.open_handles.load(Ordering::SeqCst)
    }

    /// Number of successful `open` calls so far.
    pub fn times_opened(&self) -> usize {
        self.state.opened_total.load(Ordering::SeqCst)
    }
}
