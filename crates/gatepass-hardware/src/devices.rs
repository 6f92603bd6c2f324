//! Enum wrappers for device dispatch.
//!
//! Native `async fn` in traits is not object-safe, so `Box<dyn VideoCamera>`
//! is not an option. These enums give the capture adapter and geolocation
//! tracker a single concrete type they can move into spawned tasks, while
//! each variant keeps its own monomorphized implementation.
//!
//! ```
//! use gatepass_hardware::devices::AnyVideoCamera;
//! use gatepass_hardware::mock::MockVideoCamera;
//!
//! let (camera, _handle) = MockVideoCamera::new();
//! let camera = AnyVideoCamera::from(camera);
//! assert!(!gatepass_hardware::traits::VideoCamera::is_open(&camera));
//! ```

use crate::mock::{MockGeolocation, MockStillCamera, MockVideoCamera};
use crate::traits::{GeolocationProvider, PositionWatch, StillCamera, VideoCamera};
use crate::types::{CapturedImage, DeviceInfo, FacingMode, Frame, PositionOptions, StillCaptureOptions};
use crate::Result;

/// Enum wrapper for live camera dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyVideoCamera {
    /// Mock camera for development and testing.
    Mock(MockVideoCamera),
}

impl VideoCamera for AnyVideoCamera {
    async fn open(&mut self, facing: FacingMode) -> Result<()> {
        match self {
            Self::Mock(device) => device.open(facing).await,
        }
    }

    async fn next_frame(&mut self) -> Result<Frame> {
        match self {
            Self::Mock(device) => device.next_frame().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.close().await,
        }
    }

    fn is_open(&self) -> bool {
        match self {
            Self::Mock(device) => device.is_open(),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

impl From<MockVideoCamera> for AnyVideoCamera {
    fn from(device: MockVideoCamera) -> Self {
        Self::Mock(device)
    }
}

/// Enum wrapper for native still camera dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyStillCamera {
    /// Mock camera for development and testing.
    Mock(MockStillCamera),
}

impl StillCamera for AnyStillCamera {
    async fn take_photo(&mut self, options: &StillCaptureOptions) -> Result<CapturedImage> {
        match self {
            Self::Mock(device) => device.take_photo(options).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

impl From<MockStillCamera> for AnyStillCamera {
    fn from(device: MockStillCamera) -> Self {
        Self::Mock(device)
    }
}

/// Enum wrapper for geolocation provider dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyGeolocation {
    /// Mock provider for development and testing.
    Mock(MockGeolocation),
}

impl GeolocationProvider for AnyGeolocation {
    async fn watch_position(&mut self, options: &PositionOptions) -> Result<PositionWatch> {
        match self {
            Self::Mock(device) => device.watch_position(options).await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

impl From<MockGeolocation> for AnyGeolocation {
    fn from(device: MockGeolocation) -> Self {
        Self::Mock(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_video_camera_dispatch() {
        let (camera, handle) = MockVideoCamera::new();
        let mut camera = AnyVideoCamera::from(camera);

        camera.open(FacingMode::Environment).await.unwrap();
        assert!(camera.is_open());
        assert_eq!(handle.open_handles(), 1);

        let info = camera.get_info().await.unwrap();
        assert_eq!(info.model, "MockVideoCamera");

        camera.close().await.unwrap();
        assert_eq!(handle.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_any_still_camera_dispatch() {
        let (camera, handle) = MockStillCamera::new();
        let mut camera = AnyStillCamera::from(camera);
        handle
            .queue_image(CapturedImage::Bytes(vec![0xFF]))
            .await
            .unwrap();

        let image = camera
            .take_photo(&StillCaptureOptions::default())
            .await
            .unwrap();
        assert_eq!(image, CapturedImage::Bytes(vec![0xFF]));
    }

    #[tokio::test]
    async fn test_any_geolocation_dispatch() {
        let (provider, handle) = MockGeolocation::new();
        let mut provider = AnyGeolocation::from(provider);

        let _watch = provider
            .watch_position(&PositionOptions::default())
            .await
            .unwrap();
        assert_eq!(handle.active_watches(), 1);
    }
}
