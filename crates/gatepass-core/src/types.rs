use crate::{
    Result,
    constants::{
        MAX_DOCUMENT_NUMBER_LENGTH, MAX_REGISTRATION_LENGTH, MIN_DOCUMENT_NUMBER_LENGTH,
        MIN_REGISTRATION_LENGTH, SA_ID_NUMBER_LENGTH,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

/// What the officer is scanning.
///
/// The scan type decides which symbol formats the decoder accepts and which
/// registry lookup the reconciliation engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanType {
    /// Identity document (smart ID card, green ID book, passport).
    IdDocument,
    /// Vehicle licence disk barcode.
    VehicleDisk,
    /// Number plate captured as an image for plate recognition.
    Anpr,
}

impl ScanType {
    /// Symbol formats the decoder should search for.
    ///
    /// ANPR bypasses symbol decoding entirely and returns an empty slice.
    #[must_use]
    pub fn symbol_formats(self) -> &'static [SymbolFormat] {
        const BARCODE_FORMATS: &[SymbolFormat] = &[
            SymbolFormat::Pdf417,
            SymbolFormat::QrCode,
            SymbolFormat::DataMatrix,
            SymbolFormat::Code128,
        ];

        match self {
            ScanType::IdDocument | ScanType::VehicleDisk => BARCODE_FORMATS,
            ScanType::Anpr => &[],
        }
    }

    /// Returns `true` if frames are decoded as barcodes rather than plate images.
    #[must_use]
    pub fn uses_symbol_decoding(self) -> bool {
        !matches!(self, ScanType::Anpr)
    }

    /// Label persisted in the `scan_type` column of the scan log.
    #[must_use]
    pub fn log_label(self) -> &'static str {
        match self {
            ScanType::IdDocument => "ID Scan",
            ScanType::VehicleDisk => "Disk Scan",
            ScanType::Anpr => "ANPR Scan",
        }
    }

    /// Short machine name (`id`, `vehicle-disk`, `anpr`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScanType::IdDocument => "id",
            ScanType::VehicleDisk => "vehicle-disk",
            ScanType::Anpr => "anpr",
        }
    }

    /// Returns `true` for the two vehicle scan types.
    #[must_use]
    pub fn is_vehicle(self) -> bool {
        matches!(self, ScanType::VehicleDisk | ScanType::Anpr)
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" | "id-document" => Ok(ScanType::IdDocument),
            "vehicle" | "vehicle-disk" | "disk" => Ok(ScanType::VehicleDisk),
            "anpr" | "plate" => Ok(ScanType::Anpr),
            other => Err(Error::UnknownScanType(other.to_string())),
        }
    }
}

/// Direction of a gate-access event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDirection {
    /// Entering the estate.
    Ingress,
    /// Leaving the estate.
    Egress,
}

impl ScanDirection {
    /// Value persisted in the `direction` column.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScanDirection::Ingress => "ingress",
            ScanDirection::Egress => "egress",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_ingress(self) -> bool {
        matches!(self, ScanDirection::Ingress)
    }

    #[inline]
    #[must_use]
    pub fn is_egress(self) -> bool {
        matches!(self, ScanDirection::Egress)
    }

    /// The other direction.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            ScanDirection::Ingress => ScanDirection::Egress,
            ScanDirection::Egress => ScanDirection::Ingress,
        }
    }
}

impl fmt::Display for ScanDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanDirection::Ingress => write!(f, "Ingress"),
            ScanDirection::Egress => write!(f, "Egress"),
        }
    }
}

impl FromStr for ScanDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ingress" | "in" | "entry" => Ok(ScanDirection::Ingress),
            "egress" | "out" | "exit" => Ok(ScanDirection::Egress),
            other => Err(Error::UnknownDirection(other.to_string())),
        }
    }
}

/// Barcode symbologies the decoder can be asked to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolFormat {
    Pdf417,
    QrCode,
    DataMatrix,
    Code128,
}

impl SymbolFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolFormat::Pdf417 => "PDF_417",
            SymbolFormat::QrCode => "QR_CODE",
            SymbolFormat::DataMatrix => "DATA_MATRIX",
            SymbolFormat::Code128 => "CODE_128",
        }
    }
}

impl fmt::Display for SymbolFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "PDF_417" | "PDF417" => Ok(SymbolFormat::Pdf417),
            "QR_CODE" | "QR" => Ok(SymbolFormat::QrCode),
            "DATA_MATRIX" | "DATAMATRIX" => Ok(SymbolFormat::DataMatrix),
            "CODE_128" | "CODE128" => Ok(SymbolFormat::Code128),
            other => Err(Error::UnknownSymbolFormat(other.to_string())),
        }
    }
}

/// Lifecycle status of a pre-registered visitor.
///
/// Only `Active` and `Completed` are ever written by the scanning core,
/// during check-in and check-out respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisitorStatus {
    Pending,
    Approved,
    Active,
    Completed,
    Cancelled,
}

impl VisitorStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VisitorStatus::Pending => "Pending",
            VisitorStatus::Approved => "Approved",
            VisitorStatus::Active => "Active",
            VisitorStatus::Completed => "Completed",
            VisitorStatus::Cancelled => "Cancelled",
        }
    }

    /// Status a visitor moves to when processed in the given direction.
    #[must_use]
    pub fn after_processing(direction: ScanDirection) -> Self {
        match direction {
            ScanDirection::Ingress => VisitorStatus::Active,
            ScanDirection::Egress => VisitorStatus::Completed,
        }
    }
}

impl fmt::Display for VisitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitorStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(VisitorStatus::Pending),
            "approved" => Ok(VisitorStatus::Approved),
            "active" => Ok(VisitorStatus::Active),
            "completed" => Ok(VisitorStatus::Completed),
            "cancelled" | "canceled" => Ok(VisitorStatus::Cancelled),
            other => Err(Error::UnknownVisitorStatus(other.to_string())),
        }
    }
}

/// Identity document number.
///
/// Normalised to trimmed uppercase ASCII alphanumerics. South African
/// 13-digit numbers get extra helpers ([`IdNumber::is_sa_format`],
/// [`IdNumber::luhn_valid`]); any other 6-20 character alphanumeric token is
/// accepted as a passport or generic document number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdNumber(String);

impl IdNumber {
    /// Create a new id number with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdNumber` if the number is not 6-20 ASCII
    /// alphanumeric characters after trimming.
    pub fn new(number: &str) -> Result<Self> {
        let number = number.trim().to_ascii_uppercase();

        let len = number.len();
        if !(MIN_DOCUMENT_NUMBER_LENGTH..=MAX_DOCUMENT_NUMBER_LENGTH).contains(&len) {
            return Err(Error::InvalidIdNumber(format!(
                "Id number must be {MIN_DOCUMENT_NUMBER_LENGTH}-{MAX_DOCUMENT_NUMBER_LENGTH} chars, got {len}"
            )));
        }

        if !number.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidIdNumber(format!(
                "Id number must be alphanumeric: {number}"
            )));
        }

        Ok(IdNumber(number))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for a 13-digit South African identity number.
    #[must_use]
    pub fn is_sa_format(&self) -> bool {
        self.0.len() == SA_ID_NUMBER_LENGTH && self.0.chars().all(|c| c.is_ascii_digit())
    }

    /// Luhn checksum over all digits, check digit last.
    ///
    /// Returns `false` for numbers containing letters.
    #[must_use]
    pub fn luhn_valid(&self) -> bool {
        let mut sum = 0u32;
        for (i, c) in self.0.chars().rev().enumerate() {
            let Some(mut digit) = c.to_digit(10) else {
                return false;
            };
            if i % 2 == 1 {
                digit *= 2;
                if digit > 9 {
                    digit -= 9;
                }
            }
            sum += digit;
        }
        sum % 10 == 0
    }
}

impl fmt::Display for IdNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IdNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        IdNumber::new(s)
    }
}

/// Vehicle registration (number plate or licence number).
///
/// Normalised by uppercasing and removing spaces and hyphens, so
/// `"abc 123-gp"` and `"ABC123GP"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleRegistration(String);

impl VehicleRegistration {
    /// Create a new registration with normalisation and validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidRegistration` if the normalised value is not
    /// 2-10 ASCII alphanumeric characters.
    pub fn new(raw: &str) -> Result<Self> {
        let normalized = Self::normalize(raw);

        let len = normalized.len();
        if !(MIN_REGISTRATION_LENGTH..=MAX_REGISTRATION_LENGTH).contains(&len) {
            return Err(Error::InvalidRegistration(format!(
                "Registration must be {MIN_REGISTRATION_LENGTH}-{MAX_REGISTRATION_LENGTH} chars, got {len}"
            )));
        }

        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::InvalidRegistration(format!(
                "Registration must be alphanumeric: {normalized}"
            )));
        }

        Ok(VehicleRegistration(normalized))
    }

    /// Uppercase and strip whitespace and hyphens without validating.
    #[must_use]
    pub fn normalize(raw: &str) -> String {
        raw.chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleRegistration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VehicleRegistration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        VehicleRegistration::new(s)
    }
}

/// Visitor access code issued at pre-registration.
///
/// # Security
/// Comparison is constant-time so that probing codes at the gate terminal
/// does not leak how many leading characters matched.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct AccessCode(String);

impl AccessCode {
    /// Create a new access code.
    ///
    /// # Errors
    /// Returns `Error::InvalidAccessCode` if the trimmed code is empty, longer
    /// than 20 characters or contains anything besides ASCII alphanumerics
    /// and hyphens.
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim().to_ascii_uppercase();

        if code.is_empty() {
            return Err(Error::InvalidAccessCode(
                "Access code must not be empty".to_string(),
            ));
        }

        if code.len() > MAX_DOCUMENT_NUMBER_LENGTH {
            return Err(Error::InvalidAccessCode(format!(
                "Access code must be at most {MAX_DOCUMENT_NUMBER_LENGTH} chars, got {}",
                code.len()
            )));
        }

        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::InvalidAccessCode(format!(
                "Access code contains invalid characters: {code}"
            )));
        }

        Ok(AccessCode(code))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for AccessCode {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for AccessCode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccessCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AccessCode::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("id", ScanType::IdDocument)]
    #[case("vehicle-disk", ScanType::VehicleDisk)]
    #[case("Vehicle", ScanType::VehicleDisk)]
    #[case("ANPR", ScanType::Anpr)]
    fn test_scan_type_parse(#[case] input: &str, #[case] expected: ScanType) {
        assert_eq!(input.parse::<ScanType>().unwrap(), expected);
    }

    #[test]
    fn test_scan_type_unknown() {
        assert!(matches!(
            "fingerprint".parse::<ScanType>(),
            Err(Error::UnknownScanType(_))
        ));
    }

    #[test]
    fn test_anpr_bypasses_symbol_decoding() {
        assert!(ScanType::Anpr.symbol_formats().is_empty());
        assert!(!ScanType::Anpr.uses_symbol_decoding());
        assert_eq!(ScanType::IdDocument.symbol_formats().len(), 4);
        assert!(
            ScanType::VehicleDisk
                .symbol_formats()
                .contains(&SymbolFormat::Pdf417)
        );
    }

    #[test]
    fn test_scan_type_log_labels() {
        assert_eq!(ScanType::IdDocument.log_label(), "ID Scan");
        assert_eq!(ScanType::VehicleDisk.log_label(), "Disk Scan");
        assert_eq!(ScanType::Anpr.log_label(), "ANPR Scan");
    }

    #[rstest]
    #[case("ingress", ScanDirection::Ingress)]
    #[case("IN", ScanDirection::Ingress)]
    #[case("egress", ScanDirection::Egress)]
    #[case("exit", ScanDirection::Egress)]
    fn test_direction_parse(#[case] input: &str, #[case] expected: ScanDirection) {
        assert_eq!(input.parse::<ScanDirection>().unwrap(), expected);
    }

    #[test]
    fn test_direction_serde_is_lowercase() {
        let json = serde_json::to_string(&ScanDirection::Egress).unwrap();
        assert_eq!(json, "\"egress\"");
        assert_eq!(ScanDirection::Ingress.opposite(), ScanDirection::Egress);
    }

    #[test]
    fn test_visitor_status_after_processing() {
        assert_eq!(
            VisitorStatus::after_processing(ScanDirection::Ingress),
            VisitorStatus::Active
        );
        assert_eq!(
            VisitorStatus::after_processing(ScanDirection::Egress),
            VisitorStatus::Completed
        );
        assert_eq!("active".parse::<VisitorStatus>().unwrap(), VisitorStatus::Active);
    }

    #[rstest]
    #[case("8001015009087")]
    #[case(" a12345678 ")]
    #[case("0000000000000")]
    fn test_id_number_valid(#[case] input: &str) {
        assert!(IdNumber::new(input).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("12345")]
    #[case("123456789012345678901")]
    #[case("8001-015009087")]
    fn test_id_number_invalid(#[case] input: &str) {
        assert!(matches!(IdNumber::new(input), Err(Error::InvalidIdNumber(_))));
    }

    #[test]
    fn test_id_number_luhn() {
        assert!(IdNumber::new("8001015009087").unwrap().luhn_valid());
        assert!(!IdNumber::new("8001015009088").unwrap().luhn_valid());
        assert!(IdNumber::new("0000000000000").unwrap().luhn_valid());
        assert!(!IdNumber::new("A12345678").unwrap().luhn_valid());
    }

    #[test]
    fn test_id_number_sa_format() {
        assert!(IdNumber::new("8001015009087").unwrap().is_sa_format());
        assert!(!IdNumber::new("A12345678").unwrap().is_sa_format());
    }

    #[rstest]
    #[case("ABC123GP", "ABC123GP")]
    #[case("abc 123 gp", "ABC123GP")]
    #[case("CA-123-456", "CA123456")]
    fn test_registration_normalization(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(VehicleRegistration::new(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("A")]
    #[case("ABCDEFGHIJK")]
    #[case("ABC*123")]
    fn test_registration_invalid(#[case] input: &str) {
        assert!(VehicleRegistration::new(input).is_err());
    }

    #[test]
    fn test_access_code_constant_time_eq() {
        let a = AccessCode::new("gp-4821").unwrap();
        let b = AccessCode::new("GP-4821").unwrap();
        let c = AccessCode::new("GP-4822").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(AccessCode::new("   ").is_err());
        assert!(AccessCode::new("GP 4821").is_err());
    }
}
