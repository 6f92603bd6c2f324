//! Mock native still camera.

use crate::{
    HardwareError, Result,
    traits::StillCamera,
    types::{CapturedImage, DeviceInfo, StillCaptureOptions},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, watch};

/// Mock one-shot camera.
///
/// Each `take_photo` call consumes one response queued on the handle: an
/// image, a cancellation or an error.
///
/// # Examples
///
/// ```
/// use gatepass_hardware::mock::MockStillCamera;
/// use gatepass_hardware::traits::StillCamera;
/// use gatepass_hardware::types::{CapturedImage, StillCaptureOptions};
///
/// #[tokio::main]
/// async fn main() -> gatepass_hardware::Result<()> {
///     let (mut camera, handle) = MockStillCamera::new();
///     handle.queue_image(CapturedImage::Bytes(vec![1, 2, 3])).await?;
///
///     let image = camera.take_photo(&StillCaptureOptions::default()).await?;
///     assert_eq!(image, CapturedImage::Bytes(vec![1, 2, 3]));
///     assert_eq!(handle.last_options().map(|o| o.quality), Some(90));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockStillCamera {
    response_rx: mpsc::Receiver<Result<CapturedImage>>,
    options_tx: watch::Sender<Option<StillCaptureOptions>>,
    captures: Arc<AtomicUsize>,
    name: String,
}

impl MockStillCamera {
    pub fn new() -> (Self, MockStillCameraHandle) {
        Self::with_name("Mock Native Camera".to_string())
    }

    pub fn with_name(name: String) -> (Self, MockStillCameraHandle) {
        let (response_tx, response_rx) = mpsc::channel(8);
        let (options_tx, options_rx) = watch::channel(None);
        let captures = Arc::new(AtomicUsize::new(0));

        let camera = Self {
            response_rx,
            options_tx,
            captures: Arc::clone(&captures),
            name: name.clone(),
        };

        let handle = MockStillCameraHandle {
            response_tx,
            options_rx,
            captures,
            name,
        };

        (camera, handle)
    }
}

impl StillCamera for MockStillCamera {
    async fn take_photo(&mut self, options: &StillCaptureOptions) -> Result<CapturedImage> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        self.options_tx.send_replace(Some(*options));

        self.response_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(&self.name))?
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(&self.name, "MockStillCamera"))
    }
}

/// Control handle for a [`MockStillCamera`].
#[derive(Debug, Clone)]
pub struct MockStillCameraHandle {
    response_tx: mpsc::Sender<Result<CapturedImage>>,
    options_rx: watch::Receiver<Option<StillCaptureOptions>>,
    captures: Arc<AtomicUsize>,
    name: String,
}

impl MockStillCameraHandle {
    /// Queue the image returned by the next capture.
    pub async fn queue_image(&self, image: CapturedImage) -> Result<()> {
        self.queue(Ok(image)).await
    }

    /// Simulate the user dismissing the camera.
    pub async fn queue_cancel(&self) -> Result<()> {
        self.queue(Err(HardwareError::CaptureCancelled)).await
    }

    /// Queue an arbitrary failure for the next capture.
    pub async fn queue_error(&self, error: HardwareError) -> Result<()> {
        self.queue(Err(error)).await
    }

    async fn queue(&self, response: Result<CapturedImage>) -> Result<()> {
        self.response_tx
            .send(response)
            .await
            .map_err(|_| HardwareError::disconnected(&self.name))
    }

    /// Options passed to the most recent capture.
    pub fn last_options(&self) -> Option<StillCaptureOptions> {
        *self.options_rx.borrow()
    }

    /// Number of captures requested so far.
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}
