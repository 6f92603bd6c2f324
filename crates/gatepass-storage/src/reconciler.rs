//! Scan reconciliation engine.
//!
//! Given a decoded payload, the reconciler parses it, looks up the matching
//! registry record, builds a [`ScanResult`] and appends one scan log entry.
//!
//! # Outcomes
//!
//! | Situation | `success` | Logged | `failure` |
//! |---|---|---|---|
//! | registry match | true | yes | - |
//! | decoded but unknown (not pre-registered / unregistered) | true | yes | - |
//! | payload unusable for the scan type | false | no | `Recognition` |
//! | registry lookup or log insert failed | false | no | `Lookup` |
//!
//! Failures never propagate as `Err`: the caller always gets a result to
//! present, and a failed reconciliation has no side effects.

use chrono::{DateTime, Utc};
use gatepass_core::constants::DEFAULT_OFFICER_ID;
use gatepass_core::{
    AccessCode, LocationStatus, ScanDirection, ScanType, VehicleRegistration, VisitorStatus,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::messages::DisplayMessages;
use crate::models::{NewScanLog, StatusUpdate, VehicleMatch, Visitor};
use crate::payload::{IdDocument, LicenceDisk, ScanPayload};
use crate::registry::RegistryStore;

/// Input to a single reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileRequest {
    /// Raw decoded text, or the recognised plate for ANPR.
    pub scanned_id: String,
    pub scan_type: ScanType,
    /// Session direction at the moment reconciliation runs.
    pub direction: ScanDirection,
    /// Latest location knowledge; only a fix is persisted.
    pub location: LocationStatus,
    pub timestamp: DateTime<Utc>,
    pub officer_id: String,
}

impl ReconcileRequest {
    pub fn new(
        scanned_id: impl Into<String>,
        scan_type: ScanType,
        direction: ScanDirection,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            scanned_id: scanned_id.into(),
            scan_type,
            direction,
            location: LocationStatus::AwaitingFix,
            timestamp,
            officer_id: DEFAULT_OFFICER_ID.to_string(),
        }
    }

    pub fn with_location(mut self, location: LocationStatus) -> Self {
        self.location = location;
        self
    }

    pub fn with_officer(mut self, officer_id: impl Into<String>) -> Self {
        self.officer_id = officer_id.into();
        self
    }
}

/// Registry record a scan resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchedEntity {
    Visitor {
        id: String,
        full_name: String,
        status: VisitorStatus,
    },
    Resident {
        id: String,
        full_name: String,
        unit_number: Option<String>,
    },
}

impl MatchedEntity {
    fn from_visitor(visitor: &Visitor) -> StorageResult<Self> {
        Ok(MatchedEntity::Visitor {
            id: visitor.id.clone(),
            full_name: visitor.full_name.clone(),
            status: visitor.visitor_status()?,
        })
    }

    fn from_vehicle_match(found: &VehicleMatch) -> StorageResult<Self> {
        match found {
            VehicleMatch::Resident { resident, .. } => Ok(MatchedEntity::Resident {
                id: resident.id.clone(),
                full_name: resident.full_name.clone(),
                unit_number: resident.unit_number.clone(),
            }),
            VehicleMatch::Visitor { visitor, .. } => Self::from_visitor(visitor),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            MatchedEntity::Visitor { id, .. } | MatchedEntity::Resident { id, .. } => id,
        }
    }

    pub fn full_name(&self) -> &str {
        match self {
            MatchedEntity::Visitor { full_name, .. }
            | MatchedEntity::Resident { full_name, .. } => full_name,
        }
    }

    /// Visitor id, for the `visitor_id` column.
    pub fn visitor_id(&self) -> Option<&str> {
        match self {
            MatchedEntity::Visitor { id, .. } => Some(id),
            MatchedEntity::Resident { .. } => None,
        }
    }

    pub fn visitor_status(&self) -> Option<VisitorStatus> {
        match self {
            MatchedEntity::Visitor { status, .. } => Some(*status),
            MatchedEntity::Resident { .. } => None,
        }
    }

    fn kind_label(&self) -> &'static str {
        match self {
            MatchedEntity::Visitor { .. } => "visitor",
            MatchedEntity::Resident { .. } => "resident",
        }
    }
}

/// Which identifier an ID scan matched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdMatchKey {
    IdNumber,
    AccessCode,
}

/// Scan-type specific result payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanDetails {
    Id {
        document: IdDocument,
        matched_by: Option<IdMatchKey>,
    },
    VehicleDisk {
        disk: LicenceDisk,
    },
    Anpr {
        plate: VehicleRegistration,
        registered: bool,
    },
}

impl ScanDetails {
    fn unmatched(payload: &ScanPayload) -> Self {
        match payload {
            ScanPayload::Id(document) => ScanDetails::Id {
                document: document.clone(),
                matched_by: None,
            },
            ScanPayload::VehicleDisk(disk) => ScanDetails::VehicleDisk { disk: disk.clone() },
            ScanPayload::Plate(plate) => ScanDetails::Anpr {
                plate: plate.clone(),
                registered: false,
            },
        }
    }

    /// Normalised identifier stored as `scanned_id`.
    pub fn subject(&self) -> &str {
        match self {
            ScanDetails::Id { document, .. } => &document.id_number,
            ScanDetails::VehicleDisk { disk } => disk.registration.as_str(),
            ScanDetails::Anpr { plate, .. } => plate.as_str(),
        }
    }
}

/// Which failure class ended a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileFailure {
    /// Payload decoded but unusable; retry the scan.
    Recognition,
    /// Registry query or log insert failed.
    Lookup,
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub success: bool,
    pub message: String,
    pub scan_type: ScanType,
    pub direction: ScanDirection,
    pub timestamp: DateTime<Utc>,
    /// Absent only for recognition failures.
    pub details: Option<ScanDetails>,
    pub matched_entity: Option<MatchedEntity>,
    /// Decoded successfully but nothing in the registry matched.
    pub not_pre_registered: bool,
    pub failure: Option<ReconcileFailure>,
}

impl ScanResult {
    fn failed(
        request: &ReconcileRequest,
        details: Option<ScanDetails>,
        failure: ReconcileFailure,
        reason: &str,
    ) -> Self {
        Self {
            success: false,
            message: DisplayMessages::scan_failed(reason),
            scan_type: request.scan_type,
            direction: request.direction,
            timestamp: request.timestamp,
            details,
            matched_entity: None,
            not_pre_registered: false,
            failure: Some(failure),
        }
    }

    pub fn matched_entity_id(&self) -> Option<&str> {
        self.matched_entity.as_ref().map(MatchedEntity::id)
    }

    pub fn matched_visitor_id(&self) -> Option<&str> {
        self.matched_entity.as_ref().and_then(MatchedEntity::visitor_id)
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Registry outcome before it is logged.
struct Resolution {
    details: ScanDetails,
    matched: Option<MatchedEntity>,
    message: String,
}

impl Resolution {
    fn log_entry(&self, request: &ReconcileRequest) -> StorageResult<NewScanLog> {
        let mut scan_result = serde_json::to_value(&self.details)?;
        if let (Some(object), Some(entity)) = (scan_result.as_object_mut(), &self.matched) {
            object.insert("matched_entity".to_string(), serde_json::to_value(entity)?);
        }

        Ok(NewScanLog {
            security_officer_id: request.officer_id.clone(),
            scanned_id: self.details.subject().to_string(),
            scan_type: request.scan_type,
            scan_result,
            geo_location: request.location.fix().map(|fix| fix.to_point()),
            timestamp: request.timestamp,
            direction: request.direction,
            visitor_id: self
                .matched
                .as_ref()
                .and_then(MatchedEntity::visitor_id)
                .map(str::to_string),
        })
    }
}

/// Reconciles decoded scans against a registry.
///
/// # Examples
///
/// ```no_run
/// use chrono::Utc;
/// use gatepass_core::{ScanDirection, ScanType};
/// use gatepass_storage::{Database, ReconcileRequest, ScanReconciler, SqliteRegistry};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::in_memory().await?;
/// let reconciler = ScanReconciler::new(SqliteRegistry::new(db.pool().clone()));
///
/// let request = ReconcileRequest::new(
///     "8001015009087",
///     ScanType::IdDocument,
///     ScanDirection::Ingress,
///     Utc::now(),
/// );
/// let result = reconciler.reconcile(&request).await;
/// println!("{}", result.message);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ScanReconciler<R> {
    registry: R,
}

impl<R: RegistryStore> ScanReconciler<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Reconcile one decoded scan. Writes at most one scan log entry.
    pub async fn reconcile(&self, request: &ReconcileRequest) -> ScanResult {
        let payload = match ScanPayload::parse(
            request.scan_type,
            &request.scanned_id,
            request.timestamp.date_naive(),
        ) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(scan_type = %request.scan_type, error = %err, "scan payload not recognised");
                return ScanResult::failed(
                    request,
                    None,
                    ReconcileFailure::Recognition,
                    &err.to_string(),
                );
            }
        };

        let resolution = match self.resolve(&payload).await {
            Ok(resolution) => resolution,
            Err(err) => {
                error!(scan_type = %request.scan_type, error = %err, "registry lookup failed");
                return ScanResult::failed(
                    request,
                    Some(ScanDetails::unmatched(&payload)),
                    ReconcileFailure::Lookup,
                    &err.to_string(),
                );
            }
        };

        if let Err(err) = self.append_log(request, &resolution).await {
            error!(scan_type = %request.scan_type, error = %err, "scan log insert failed");
            return ScanResult::failed(
                request,
                Some(resolution.details),
                ReconcileFailure::Lookup,
                &err.to_string(),
            );
        }

        let not_pre_registered = resolution.matched.is_none();
        ScanResult {
            success: true,
            message: resolution.message,
            scan_type: request.scan_type,
            direction: request.direction,
            timestamp: request.timestamp,
            details: Some(resolution.details),
            matched_entity: resolution.matched,
            not_pre_registered,
            failure: None,
        }
    }

    async fn append_log(
        &self,
        request: &ReconcileRequest,
        resolution: &Resolution,
    ) -> StorageResult<i64> {
        let entry = resolution.log_entry(request)?;
        let log_id = self.registry.insert_scan_log(&entry).await?;

        info!(
            log_id,
            scan_type = %request.scan_type,
            direction = %request.direction,
            scanned_id = %entry.scanned_id,
            matched = resolution.matched.is_some(),
            "scan logged"
        );

        Ok(log_id)
    }

    async fn resolve(&self, payload: &ScanPayload) -> StorageResult<Resolution> {
        match payload {
            ScanPayload::Id(document) => self.resolve_id(document).await,
            ScanPayload::VehicleDisk(disk) => self.resolve_disk(disk).await,
            ScanPayload::Plate(plate) => self.resolve_plate(plate).await,
        }
    }

    async fn resolve_id(&self, document: &IdDocument) -> StorageResult<Resolution> {
        let mut matched_by = None;
        let mut visitor = self
            .registry
            .find_visitor_by_id_number(&document.id_number)
            .await?;

        if visitor.is_some() {
            matched_by = Some(IdMatchKey::IdNumber);
        } else if let Ok(code) = AccessCode::new(&document.id_number) {
            visitor = self.registry.find_visitor_by_access_code(&code).await?;
            if visitor.is_some() {
                matched_by = Some(IdMatchKey::AccessCode);
            }
        }

        let details = ScanDetails::Id {
            document: document.clone(),
            matched_by,
        };

        match visitor {
            Some(visitor) => {
                debug!(visitor_id = %visitor.id, ?matched_by, "id matched visitor");
                Ok(Resolution {
                    message: DisplayMessages::id_verified(&visitor.full_name),
                    matched: Some(MatchedEntity::from_visitor(&visitor)?),
                    details,
                })
            }
            None => Ok(Resolution {
                message: DisplayMessages::id_not_pre_registered(document.display_name()),
                matched: None,
                details,
            }),
        }
    }

    async fn resolve_disk(&self, disk: &LicenceDisk) -> StorageResult<Resolution> {
        let found = self
            .registry
            .find_by_vehicle_registration(&disk.registration)
            .await?;
        let registration = disk.registration.as_str();

        let details = ScanDetails::VehicleDisk { disk: disk.clone() };

        match found {
            Some(found) => {
                let vehicle = match (&disk.make, &disk.model) {
                    (Some(make), Some(model)) => format!("{make} {model}"),
                    _ => found
                        .disk()
                        .vehicle_description()
                        .unwrap_or_else(|| "vehicle".to_string()),
                };

                Ok(Resolution {
                    message: DisplayMessages::vehicle_verified(&vehicle, registration),
                    matched: Some(MatchedEntity::from_vehicle_match(&found)?),
                    details,
                })
            }
            None => Ok(Resolution {
                message: DisplayMessages::vehicle_not_registered(registration),
                matched: None,
                details,
            }),
        }
    }

    async fn resolve_plate(&self, plate: &VehicleRegistration) -> StorageResult<Resolution> {
        let found = match self.registry.find_resident_by_plate(plate).await? {
            Some(resident) => Some(resident),
            None => self.registry.find_by_vehicle_registration(plate).await?,
        };

        let matched = found
            .as_ref()
            .map(MatchedEntity::from_vehicle_match)
            .transpose()?;

        let message = match &matched {
            Some(entity) => DisplayMessages::plate_registered(
                plate.as_str(),
                entity.kind_label(),
                entity.full_name(),
            ),
            None => DisplayMessages::plate_unregistered(plate.as_str()),
        };

        Ok(Resolution {
            details: ScanDetails::Anpr {
                plate: plate.clone(),
                registered: matched.is_some(),
            },
            matched,
            message,
        })
    }

    /// Check a visitor in: status `Active`, `check_in_time` set.
    pub async fn check_in(&self, visitor_id: &str, at: DateTime<Utc>) -> StorageResult<Visitor> {
        let visitor = self
            .registry
            .update_visitor_status(visitor_id, &StatusUpdate::check_in(at))
            .await?;
        info!(visitor_id, "visitor checked in");
        Ok(visitor)
    }

    /// Check a visitor out: status `Completed`, `check_out_time` set.
    pub async fn check_out(&self, visitor_id: &str, at: DateTime<Utc>) -> StorageResult<Visitor> {
        let visitor = self
            .registry
            .update_visitor_status(visitor_id, &StatusUpdate::check_out(at))
            .await?;
        info!(visitor_id, "visitor checked out");
        Ok(visitor)
    }

    /// Manual gate flow: find a visitor by access code, then check in or out.
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` when no visitor holds the code.
    pub async fn process_access_code(
        &self,
        code: &AccessCode,
        direction: ScanDirection,
        at: DateTime<Utc>,
    ) -> StorageResult<Visitor> {
        let visitor = self
            .registry
            .find_visitor_by_access_code(code)
            .await?
            .ok_or_else(|| StorageError::not_found("Visitor", "access_code", code.as_str()))?;

        match direction {
            ScanDirection::Ingress => self.check_in(&visitor.id, at).await,
            ScanDirection::Egress => self.check_out(&visitor.id, at).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use crate::registry::SqliteRegistry;
    use crate::repositories::{ScanLogRepository, SqliteVisitorRepository, VisitorRepository};

    async fn setup() -> (Database, ScanReconciler<SqliteRegistry>) {
        let db = Database::in_memory().await.unwrap();
        let reconciler = ScanReconciler::new(SqliteRegistry::new(db.pool().clone()));
        (db, reconciler)
    }

    #[tokio::test]
    async fn test_recognition_failure_writes_nothing() {
        let (_db, reconciler) = setup().await;
        let request =
            ReconcileRequest::new("AB1", ScanType::IdDocument, ScanDirection::Ingress, Utc::now());

        let result = reconciler.reconcile(&request).await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(ReconcileFailure::Recognition));
        assert!(result.details.is_none());
        assert!(result.message.starts_with("Scan failed: "));
        assert_eq!(reconciler.registry().scan_logs().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_access_code_fallback() {
        let (db, reconciler) = setup().await;
        let visitors = SqliteVisitorRepository::new(db.pool().clone());
        let visitor = Visitor::new("Guest With Code").with_access_code("QR-55120");
        visitors.create(&visitor).await.unwrap();

        let request = ReconcileRequest::new(
            "qr-55120",
            ScanType::IdDocument,
            ScanDirection::Ingress,
            Utc::now(),
        );
        let result = reconciler.reconcile(&request).await;

        assert!(result.success);
        assert_eq!(result.matched_visitor_id(), Some(visitor.id.as_str()));
        assert!(matches!(
            result.details,
            Some(ScanDetails::Id {
                matched_by: Some(IdMatchKey::AccessCode),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_access_code_check_in_and_out() {
        let (db, reconciler) = setup().await;
        let visitors = SqliteVisitorRepository::new(db.pool().clone());
        let visitor = Visitor::new("Courier").with_access_code("DLV-001");
        visitors.create(&visitor).await.unwrap();

        let code = AccessCode::new("dlv-001").unwrap();
        let checked_in = reconciler
            .process_access_code(&code, ScanDirection::Ingress, Utc::now())
            .await
            .unwrap();
        assert_eq!(checked_in.visitor_status().unwrap(), VisitorStatus::Active);

        let checked_out = reconciler
            .process_access_code(&code, ScanDirection::Egress, Utc::now())
            .await
            .unwrap();
        assert_eq!(checked_out.visitor_status().unwrap(), VisitorStatus::Completed);

        let unknown = AccessCode::new("NOPE-1").unwrap();
        assert!(matches!(
            reconciler
                .process_access_code(&unknown, ScanDirection::Ingress, Utc::now())
                .await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_scanned_id_is_normalised_subject() {
        let (_db, reconciler) = setup().await;
        let request = ReconcileRequest::new(
            "abc 123 gp",
            ScanType::Anpr,
            ScanDirection::Egress,
            Utc::now(),
        );
        let result = reconciler.reconcile(&request).await;
        assert!(result.success);
        assert!(result.not_pre_registered);

        let logs = reconciler
            .registry()
            .scan_logs()
            .find_recent(10)
            .await
            .unwrap();
        assert_eq!(logs[0].scanned_id, "ABC123GP");
        assert_eq!(logs[0].scan_type, "ANPR Scan");
        assert_eq!(logs[0].geo_location, None);
    }
}
