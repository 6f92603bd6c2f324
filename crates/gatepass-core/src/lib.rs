pub mod constants;
pub mod error;
pub mod geo;
pub mod types;

pub use error::{Error, Result};
pub use geo::{GeoError, GeoErrorCode, GeoFix, GeoPoint, LocationStatus};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
