//! Mock device implementations for testing and development.
//!
//! Each mock is created as a `(device, handle)` pair. The device side goes to
//! the code under test; the handle drives it and observes what it did.

pub mod camera;
pub mod geolocation;
pub mod still;

pub use camera::{MockVideoCamera, MockVideoCameraHandle};
pub use geolocation::{MockGeolocation, MockGeolocationHandle};
pub use still::{MockStillCamera, MockStillCameraHandle};
