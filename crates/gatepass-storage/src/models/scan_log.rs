use chrono::{DateTime, Utc};
use gatepass_core::{GeoPoint, ScanDirection, ScanType};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::StorageResult;

/// Persisted scan log row.
///
/// Column names match the audit record consumed by the estate dashboard:
/// `security_officer_id`, `scanned_id`, `scan_type`, `scan_result`,
/// `geo_location`, `timestamp`, `direction`, `visitor_id`. The JSON columns
/// are stored as text; use [`ScanLog::scan_result_json`] and
/// [`ScanLog::geo_point`] to read them.
///
/// Rows are append-only. The schema rejects updates.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScanLog {
    pub id: i64,
    pub security_officer_id: String,
    pub scanned_id: String,
    /// "ID Scan", "Disk Scan" or "ANPR Scan".
    pub scan_type: String,
    pub scan_result: String,
    pub geo_location: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// "ingress" or "egress".
    pub direction: String,
    pub visitor_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScanLog {
    pub fn scan_result_json(&self) -> StorageResult<serde_json::Value> {
        Ok(serde_json::from_str(&self.scan_result)?)
    }

    pub fn geo_point(&self) -> StorageResult<Option<GeoPoint>> {
        self.geo_location
            .as_deref()
            .map(serde_json::from_str::<GeoPoint>)
            .transpose()
            .map_err(Into::into)
    }

    pub fn get_direction(&self) -> Option<ScanDirection> {
        ScanDirection::from_str(&self.direction).ok()
    }
}

/// A scan log entry waiting to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScanLog {
    pub security_officer_id: String,
    pub scanned_id: String,
    pub scan_type: ScanType,
    pub scan_result: serde_json::Value,
    pub geo_location: Option<GeoPoint>,
    pub timestamp: DateTime<Utc>,
    pub direction: ScanDirection,
    pub visitor_id: Option<String>,
}

impl NewScanLog {
    /// Text stored in the `geo_location` column, or `None` for SQL NULL.
    pub fn geo_location_json(&self) -> StorageResult<Option<String>> {
        self.geo_location
            .as_ref()
            .map(serde_json::to_string::<GeoPoint>)
            .transpose()
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(geo: Option<&str>) -> ScanLog {
        ScanLog {
            id: 1,
            security_officer_id: "officer-1".into(),
            scanned_id: "8001015009087".into(),
            scan_type: "ID Scan".into(),
            scan_result: r#"{"kind":"id"}"#.into(),
            geo_location: geo.map(str::to_string),
            timestamp: Utc::now(),
            direction: "egress".into(),
            visitor_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_scan_log_json_columns() {
        let log = row(Some(r#"{"latitude":-26.1,"longitude":28.0,"accuracy":9.0}"#));
        assert_eq!(log.scan_result_json().unwrap()["kind"], "id");
        assert_eq!(log.geo_point().unwrap().unwrap().accuracy, 9.0);
        assert_eq!(log.get_direction(), Some(ScanDirection::Egress));
    }

    #[test]
    fn test_scan_log_null_location() {
        assert_eq!(row(None).geo_point().unwrap(), None);
    }

    #[test]
    fn test_new_scan_log_null_location() {
        let entry = NewScanLog {
            security_officer_id: "officer-1".into(),
            scanned_id: "ABC123GP".into(),
            scan_type: ScanType::Anpr,
            scan_result: serde_json::json!({}),
            geo_location: None,
            timestamp: Utc::now(),
            direction: ScanDirection::Ingress,
            visitor_id: None,
        };
        assert_eq!(entry.geo_location_json().unwrap(), None);
    }
}
