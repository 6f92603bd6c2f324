use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Identifier errors
    #[error("Invalid id number: {0}")]
    InvalidIdNumber(String),

    #[error("Invalid vehicle registration: {0}")]
    InvalidRegistration(String),

    #[error("Invalid access code: {0}")]
    InvalidAccessCode(String),

    // Enumeration parsing errors
    #[error("Unknown scan type: {0}")]
    UnknownScanType(String),

    #[error("Unknown scan direction: {0}")]
    UnknownDirection(String),

    #[error("Unknown symbol format: {0}")]
    UnknownSymbolFormat(String),

    #[error("Unknown visitor status: {0}")]
    UnknownVisitorStatus(String),

    // Location errors
    #[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Invalid accuracy: {0}")]
    InvalidAccuracy(f64),

    // Session errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
