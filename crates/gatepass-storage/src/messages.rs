//! User-facing text for scan results and follow-up actions.
//!
//! Result messages that embed scan data are built by the helpers on
//! [`DisplayMessages`] so the wording stays in one place.
//!
//! ```
//! use gatepass_storage::messages::DisplayMessages;
//!
//! assert_eq!(
//!     DisplayMessages::id_verified("Jane Doe"),
//!     "ID verified successfully: Jane Doe"
//! );
//! ```

/// Display messages for scan outcomes (English)
pub struct DisplayMessages;

impl DisplayMessages {
    /// Toast title after an ingress scan was logged
    pub const ENTRY_RECORDED: &'static str = "Entry Recorded";

    /// Toast title after an egress scan was logged
    pub const EXIT_RECORDED: &'static str = "Exit Recorded";

    /// Toast title for a lookup or store failure
    pub const SCAN_ERROR: &'static str = "Scan Error";

    /// Toast body for a lookup or store failure
    pub const SCAN_ERROR_DETAIL: &'static str =
        "There was a problem processing the scan. Please try again.";

    /// Toast title for a camera or recognition failure
    pub const SCANNER_ERROR: &'static str = "Scanner Error";

    /// Toast title for a geolocation failure
    pub const LOCATION_ERROR: &'static str = "Location Error";

    /// Toast body for a geolocation failure
    pub const LOCATION_ERROR_DETAIL: &'static str =
        "Unable to get your current location. Some features may be limited.";

    pub const CHECK_IN_SUCCESSFUL: &'static str = "Check-In Successful";

    pub const CHECK_OUT_SUCCESSFUL: &'static str = "Check-Out Successful";

    /// Plate matched nowhere in the registry
    pub const UNREGISTERED: &'static str = "Unregistered";

    pub fn id_verified(full_name: &str) -> String {
        format!("ID verified successfully: {full_name}")
    }

    pub fn id_not_pre_registered(name: &str) -> String {
        format!("ID scanned successfully: {name}, not pre-registered")
    }

    pub fn vehicle_verified(vehicle: &str, registration: &str) -> String {
        format!("Vehicle verified: {vehicle}, REG: {registration}")
    }

    pub fn vehicle_not_registered(registration: &str) -> String {
        format!("Vehicle scanned: REG {registration}, not registered")
    }

    pub fn plate_registered(plate: &str, owner_kind: &str, owner_name: &str) -> String {
        format!("Plate {plate} registered to {owner_kind} {owner_name}")
    }

    pub fn plate_unregistered(plate: &str) -> String {
        format!("Plate {plate}: {}", Self::UNREGISTERED)
    }

    pub fn scan_failed(reason: &str) -> String {
        format!("Scan failed: {reason}")
    }
}
