//! Decoded payload parsing.
//!
//! Turns the raw text behind a decoded symbol (or a recognised plate) into
//! structured data before any registry lookup happens. A payload that cannot
//! be parsed is a recognition failure: the scan is surfaced for retry and
//! nothing is logged.
//!
//! Supported identity payloads:
//!
//! - smart ID card PDF417, pipe-delimited:
//!   `surname|names|gender|nationality|id number|date of birth|country of birth|citizenship|issue date|...`
//! - a bare 13-digit South African identity number, `YYMMDD SSSS C A Z`
//! - any other 6-20 character token of letters, digits and hyphens
//!   (passport numbers, pre-registration access codes)
//!
//! Vehicle licence disks are `%`-delimited. Counting segments from the empty
//! one before the leading `%`: 6 licence number, 7 register number,
//! 8 description, 9 make, 10 model, 11 colour, 12 VIN, 13 engine number,
//! 14 expiry date. A bare plate is accepted as a registration on its own.

use chrono::{Datelike, NaiveDate};
use gatepass_core::constants::{
    MAX_DOCUMENT_NUMBER_LENGTH, MIN_DOCUMENT_NUMBER_LENGTH, SA_ID_MALE_THRESHOLD,
    SA_ID_NUMBER_LENGTH,
};
use gatepass_core::{IdNumber, ScanType, VehicleRegistration};
use serde::{Deserialize, Serialize};

/// Why a payload could not be turned into a scan subject.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("Scanned payload is empty")]
    Empty,

    #[error("Unrecognised identity document payload")]
    UnrecognisedDocument,

    #[error("Invalid identity number in document: {0}")]
    InvalidIdNumber(String),

    #[error("Licence disk payload has {0} fields, expected at least 12")]
    TruncatedDisk(usize),

    #[error("Invalid vehicle registration: {0}")]
    InvalidRegistration(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Citizenship {
    Citizen,
    PermanentResident,
}

/// Where the identity fields came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSource {
    SmartCard,
    IdNumber,
    DocumentNumber,
}

/// Identity document data recovered from a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdDocument {
    pub source: IdSource,
    /// Normalised number used for registry lookups.
    pub id_number: String,
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub citizenship: Option<Citizenship>,
    pub nationality: Option<String>,
    pub issue_date: Option<NaiveDate>,
    /// Luhn result for South African numbers, `None` otherwise.
    pub checksum_valid: Option<bool>,
}

impl IdDocument {
    fn bare(source: IdSource, id_number: String) -> Self {
        Self {
            source,
            id_number,
            full_name: None,
            date_of_birth: None,
            gender: None,
            citizenship: None,
            nationality: None,
            issue_date: None,
            checksum_valid: None,
        }
    }

    /// Name to show when the holder is not pre-registered.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.id_number)
    }
}

/// Vehicle licence disk data recovered from a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenceDisk {
    pub registration: VehicleRegistration,
    pub register_number: Option<String>,
    pub description: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub colour: Option<String>,
    pub vin: Option<String>,
    pub engine_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

/// Parsed subject of a scan, one variant per scan type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPayload {
    Id(IdDocument),
    VehicleDisk(LicenceDisk),
    Plate(VehicleRegistration),
}

impl ScanPayload {
    /// Parse a raw payload for the given scan type.
    ///
    /// `reference` is the scan date; it picks the century of a two-digit
    /// birth year so that the date of birth is never in the future.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadError`] when the text is not a usable subject for
    /// the scan type.
    pub fn parse(
        scan_type: ScanType,
        raw: &str,
        reference: NaiveDate,
    ) -> Result<Self, PayloadError> {
        match scan_type {
            ScanType::IdDocument => parse_id_payload(raw, reference).map(ScanPayload::Id),
            ScanType::VehicleDisk => parse_disk_payload(raw).map(ScanPayload::VehicleDisk),
            ScanType::Anpr => parse_plate(raw).map(ScanPayload::Plate),
        }
    }
}

/// Parse an identity document payload.
pub fn parse_id_payload(raw: &str, reference: NaiveDate) -> Result<IdDocument, PayloadError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(PayloadError::Empty);
    }

    if text.contains('|') {
        return parse_smart_card(text, reference);
    }

    if text.len() == SA_ID_NUMBER_LENGTH && text.chars().all(|c| c.is_ascii_digit()) {
        let number =
            IdNumber::new(text).map_err(|e| PayloadError::InvalidIdNumber(e.to_string()))?;
        return Ok(document_from_sa_number(&number, reference, IdSource::IdNumber));
    }

    let token = text.to_ascii_uppercase();
    let len = token.len();
    if (MIN_DOCUMENT_NUMBER_LENGTH..=MAX_DOCUMENT_NUMBER_LENGTH).contains(&len)
        && token.chars().any(|c| c.is_ascii_alphanumeric())
        && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Ok(IdDocument::bare(IdSource::DocumentNumber, token));
    }

    Err(PayloadError::UnrecognisedDocument)
}

fn parse_smart_card(text: &str, reference: NaiveDate) -> Result<IdDocument, PayloadError> {
    let fields: Vec<&str> = text.split('|').map(str::trim).collect();
    if fields.len() < 5 {
        return Err(PayloadError::UnrecognisedDocument);
    }

    let number =
        IdNumber::new(fields[4]).map_err(|e| PayloadError::InvalidIdNumber(e.to_string()))?;

    let mut document = if number.is_sa_format() {
        document_from_sa_number(&number, reference, IdSource::SmartCard)
    } else {
        IdDocument::bare(IdSource::SmartCard, number.as_str().to_string())
    };

    let name = [fields[1], fields[0]]
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");
    if !name.is_empty() {
        document.full_name = Some(name);
    }

    document.gender = match fields[2].to_ascii_uppercase().as_str() {
        "M" | "MALE" => Some(Gender::Male),
        "F" | "FEMALE" => Some(Gender::Female),
        _ => document.gender,
    };

    document.nationality = non_empty(fields[3]);

    if let Some(dob) = fields.get(5).and_then(|f| parse_date(f)) {
        document.date_of_birth = Some(dob);
    }

    if let Some(status) = fields.get(7) {
        let status = status.to_ascii_uppercase();
        if status.starts_with("CITIZEN") || status.starts_with("SA CITIZEN") {
            document.citizenship = Some(Citizenship::Citizen);
        } else if status.contains("PERMANENT") {
            document.citizenship = Some(Citizenship::PermanentResident);
        }
    }

    document.issue_date = fields.get(8).and_then(|f| parse_date(f));

    Ok(document)
}

fn document_from_sa_number(number: &IdNumber, reference: NaiveDate, source: IdSource) -> IdDocument {
    let digits = number.as_str();

    IdDocument {
        source,
        id_number: digits.to_string(),
        full_name: None,
        date_of_birth: sa_birth_date(digits, reference),
        gender: digits
            .get(6..10)
            .and_then(|s| s.parse::<u16>().ok())
            .map(|sequence| {
                if sequence >= SA_ID_MALE_THRESHOLD {
                    Gender::Male
                } else {
                    Gender::Female
                }
            }),
        citizenship: match digits.as_bytes().get(10) {
            Some(b'0') => Some(Citizenship::Citizen),
            Some(b'1') => Some(Citizenship::PermanentResident),
            _ => None,
        },
        nationality: None,
        issue_date: None,
        checksum_valid: Some(number.luhn_valid()),
    }
}

/// `YYMMDD` prefix as a date, choosing the latest century not in the future.
fn sa_birth_date(digits: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let yy: i32 = digits.get(0..2)?.parse().ok()?;
    let month: u32 = digits.get(2..4)?.parse().ok()?;
    let day: u32 = digits.get(4..6)?.parse().ok()?;

    let century = reference.year() - reference.year().rem_euclid(100);
    let candidate = NaiveDate::from_ymd_opt(century + yy, month, day)?;
    if candidate <= reference {
        Some(candidate)
    } else {
        NaiveDate::from_ymd_opt(century - 100 + yy, month, day)
    }
}

/// Parse a licence disk payload or a bare registration.
pub fn parse_disk_payload(raw: &str) -> Result<LicenceDisk, PayloadError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(PayloadError::Empty);
    }

    if !text.contains('%') {
        return Ok(LicenceDisk {
            registration: parse_plate(text)?,
            register_number: None,
            description: None,
            make: None,
            model: None,
            colour: None,
            vin: None,
            engine_number: None,
            expiry_date: None,
        });
    }

    let fields: Vec<&str> = text.split('%').map(str::trim).collect();
    if fields.len() < 12 {
        return Err(PayloadError::TruncatedDisk(fields.len()));
    }

    let field = |index: usize| fields.get(index).and_then(|f| non_empty(f));

    Ok(LicenceDisk {
        registration: parse_plate(fields[6])?,
        register_number: field(7),
        description: field(8),
        make: field(9),
        model: field(10),
        colour: field(11),
        vin: field(12),
        engine_number: field(13),
        expiry_date: fields.get(14).and_then(|f| parse_date(f)),
    })
}

/// Normalise and validate a plate or licence number.
pub fn parse_plate(raw: &str) -> Result<VehicleRegistration, PayloadError> {
    if raw.trim().is_empty() {
        return Err(PayloadError::Empty);
    }
    VehicleRegistration::new(raw).map_err(|e| PayloadError::InvalidRegistration(e.to_string()))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%d %b %Y", "%d/%m/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text.trim(), format).ok())
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn title_case(word_list: &str) -> String {
    word_list
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 18).unwrap()
    }

    #[test]
    fn test_bare_sa_id_number() {
        let doc = parse_id_payload("8001015009087", today()).unwrap();
        assert_eq!(doc.source, IdSource::IdNumber);
        assert_eq!(doc.id_number, "8001015009087");
        assert_eq!(doc.date_of_birth, NaiveDate::from_ymd_opt(1980, 1, 1));
        assert_eq!(doc.gender, Some(Gender::Male));
        assert_eq!(doc.citizenship, Some(Citizenship::Citizen));
        assert_eq!(doc.checksum_valid, Some(true));
        assert_eq!(doc.display_name(), "8001015009087");
    }

    #[test]
    fn test_all_zero_id_has_no_birth_date() {
        let doc = parse_id_payload("0000000000000", today()).unwrap();
        assert_eq!(doc.date_of_birth, None);
        assert_eq!(doc.gender, Some(Gender::Female));
        assert_eq!(doc.checksum_valid, Some(true));
    }

    #[rstest]
    #[case("0501014800086", 2005)]
    #[case("2501014800086", 2025)]
    #[case("2601014800086", 1926)]
    #[case("9912314800086", 1999)]
    fn test_birth_century(#[case] number: &str, #[case] year: i32) {
        let doc = parse_id_payload(number, today()).unwrap();
        assert_eq!(doc.date_of_birth.unwrap().year(), year);
    }

    #[test]
    fn test_smart_card_payload() {
        let raw = "DOE|JANE MARY|F|RSA|8001015009087|01 Jan 1980|RSA|CITIZEN|10 May 2018|02|";
        let doc = parse_id_payload(raw, today()).unwrap();

        assert_eq!(doc.source, IdSource::SmartCard);
        assert_eq!(doc.full_name.as_deref(), Some("Jane Mary Doe"));
        assert_eq!(doc.gender, Some(Gender::Female));
        assert_eq!(doc.nationality.as_deref(), Some("RSA"));
        assert_eq!(doc.citizenship, Some(Citizenship::Citizen));
        assert_eq!(doc.issue_date, NaiveDate::from_ymd_opt(2018, 5, 10));
        assert_eq!(doc.display_name(), "Jane Mary Doe");
    }

    #[test]
    fn test_smart_card_with_bad_number() {
        let raw = "DOE|JANE|F|RSA|80-01|01 Jan 1980";
        assert!(matches!(
            parse_id_payload(raw, today()),
            Err(PayloadError::InvalidIdNumber(_))
        ));
    }

    #[rstest]
    #[case("A12345678")]
    #[case("vis-2041-ab")]
    #[case("M00012345")]
    fn test_document_numbers(#[case] raw: &str) {
        let doc = parse_id_payload(raw, today()).unwrap();
        assert_eq!(doc.source, IdSource::DocumentNumber);
        assert_eq!(doc.id_number, raw.to_ascii_uppercase());
    }

    #[rstest]
    #[case("", PayloadError::Empty)]
    #[case("   ", PayloadError::Empty)]
    #[case("AB12", PayloadError::UnrecognisedDocument)]
    #[case("------", PayloadError::UnrecognisedDocument)]
    #[case("https://example.com/x", PayloadError::UnrecognisedDocument)]
    #[case("ABCDEFGHIJKLMNOPQRSTUVWXYZ", PayloadError::UnrecognisedDocument)]
    fn test_unusable_id_payloads(#[case] raw: &str, #[case] expected: PayloadError) {
        assert_eq!(parse_id_payload(raw, today()).unwrap_err(), expected);
    }

    #[test]
    fn test_licence_disk_payload() {
        let raw = "%MVL1CC24%0154%4025T0HS%1%4025054LW6HZ%CA 123-456%BBB123B%Sedan / Sedan%TOYOTA%COROLLA%White / Wit%AHTBB3QE900012345%2ZR1234567%2025-12-31%";
        let disk = parse_disk_payload(raw).unwrap();

        assert_eq!(disk.registration.as_str(), "CA123456");
        assert_eq!(disk.register_number.as_deref(), Some("BBB123B"));
        assert_eq!(disk.make.as_deref(), Some("TOYOTA"));
        assert_eq!(disk.model.as_deref(), Some("COROLLA"));
        assert_eq!(disk.colour.as_deref(), Some("White / Wit"));
        assert_eq!(disk.vin.as_deref(), Some("AHTBB3QE900012345"));
        assert_eq!(disk.expiry_date, NaiveDate::from_ymd_opt(2025, 12, 31));
    }

    #[test]
    fn test_truncated_disk_payload() {
        assert_eq!(
            parse_disk_payload("%MVL1CC24%0154%CA123456%").unwrap_err(),
            PayloadError::TruncatedDisk(5)
        );
    }

    #[rstest]
    #[case("abc 123 gp", "ABC123GP")]
    #[case("ND-456-789", "ND456789")]
    #[case("CA123456", "CA123456")]
    fn test_bare_plate(#[case] raw: &str, #[case] expected: &str) {
        let disk = parse_disk_payload(raw).unwrap();
        assert_eq!(disk.registration.as_str(), expected);
        assert!(disk.make.is_none());
    }

    #[rstest]
    #[case("A")]
    #[case("ABCDEFGHIJK")]
    #[case("AB!123")]
    fn test_invalid_plate(#[case] raw: &str) {
        assert!(matches!(
            parse_plate(raw),
            Err(PayloadError::InvalidRegistration(_))
        ));
    }

    #[test]
    fn test_scan_payload_dispatch() {
        assert!(matches!(
            ScanPayload::parse(ScanType::Anpr, "ABC123GP", today()),
            Ok(ScanPayload::Plate(_))
        ));
        assert!(matches!(
            ScanPayload::parse(ScanType::VehicleDisk, "ABC123GP", today()),
            Ok(ScanPayload::VehicleDisk(_))
        ));
        assert!(matches!(
            ScanPayload::parse(ScanType::IdDocument, "ABC123GP", today()),
            Ok(ScanPayload::Id(_))
        ));
    }
}
