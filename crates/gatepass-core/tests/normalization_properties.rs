//! Property-based tests for identifier normalisation.
//!
//! Registry lookups compare normalised values, so normalisation must be
//! idempotent and insensitive to the separators officers and OCR output
//! commonly insert.

use gatepass_core::{IdNumber, VehicleRegistration};
use proptest::prelude::*;

/// Strategy for plausible plates: 2-8 alphanumerics.
fn plate_core() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z0-9]{2,8}").expect("Failed to create plate regex strategy")
}

/// Strategy for separators inserted between plate characters.
fn separator() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(""), Just(" "), Just("-"), Just("  ")]
}

proptest! {
    /// Property: normalising an already-normalised registration changes nothing.
    #[test]
    fn prop_registration_normalization_idempotent(plate in plate_core()) {
        let once = VehicleRegistration::new(&plate).unwrap();
        let twice = VehicleRegistration::new(once.as_str()).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Property: separators and case never affect the normalised value.
    #[test]
    fn prop_registration_ignores_separators_and_case(
        plate in plate_core(),
        sep in separator(),
    ) {
        let decorated: String = plate
            .chars()
            .map(|c| format!("{}{}", c.to_ascii_lowercase(), sep))
            .collect();
        let normalized = VehicleRegistration::new(&decorated).unwrap();
        prop_assert_eq!(normalized.as_str(), plate.as_str());
    }

    /// Property: every 13-digit number is accepted as a South African id number.
    #[test]
    fn prop_thirteen_digits_is_sa_format(number in "[0-9]{13}") {
        let id = IdNumber::new(&number).unwrap();
        prop_assert!(id.is_sa_format());
    }
}
