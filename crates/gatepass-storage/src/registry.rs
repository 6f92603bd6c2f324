//! Registry store used by the reconciliation engine.
//!
//! [`RegistryStore`] is the narrow set of lookups and writes a scan needs.
//! Every call is a single-row read or write; no scan needs a multi-step
//! transaction. [`SqliteRegistry`] implements it over the repositories.

#![allow(async_fn_in_trait)]

use gatepass_core::{AccessCode, VehicleRegistration};
use sqlx::SqlitePool;
use tracing::trace;

use crate::error::StorageResult;
use crate::models::{NewScanLog, StatusUpdate, VehicleMatch, Visitor};
use crate::repositories::{
    ResidentRepository, ScanLogRepository, SqliteResidentRepository, SqliteScanLogRepository,
    SqliteVehicleDiskRepository, SqliteVisitorRepository, VehicleDiskRepository,
    VisitorRepository,
};

/// Registry operations the scanning core depends on.
///
/// All methods are fallible; any error is a lookup failure for the scan that
/// issued it.
pub trait RegistryStore: Send + Sync {
    /// Visitor with this id number, matched exactly and case-insensitively.
    async fn find_visitor_by_id_number(&self, id_number: &str) -> StorageResult<Option<Visitor>>;

    async fn find_visitor_by_access_code(&self, code: &AccessCode)
    -> StorageResult<Option<Visitor>>;

    /// Owner of a registration, residents taking precedence over visitors.
    async fn find_by_vehicle_registration(
        &self,
        registration: &VehicleRegistration,
    ) -> StorageResult<Option<VehicleMatch>>;

    /// Resident owning a plate. Never returns a visitor match.
    async fn find_resident_by_plate(
        &self,
        plate: &VehicleRegistration,
    ) -> StorageResult<Option<VehicleMatch>>;

    async fn update_visitor_status(
        &self,
        visitor_id: &str,
        update: &StatusUpdate,
    ) -> StorageResult<Visitor>;

    /// Append a scan log entry, returning its row id.
    async fn insert_scan_log(&self, entry: &NewScanLog) -> StorageResult<i64>;
}

/// SQLite-backed registry.
#[derive(Debug, Clone)]
pub struct SqliteRegistry {
    residents: SqliteResidentRepository,
    visitors: SqliteVisitorRepository,
    disks: SqliteVehicleDiskRepository,
    logs: SqliteScanLogRepository,
}

impl SqliteRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            residents: SqliteResidentRepository::new(pool.clone()),
            visitors: SqliteVisitorRepository::new(pool.clone()),
            disks: SqliteVehicleDiskRepository::new(pool.clone()),
            logs: SqliteScanLogRepository::new(pool),
        }
    }

    pub fn scan_logs(&self) -> &SqliteScanLogRepository {
        &self.logs
    }
}

impl RegistryStore for SqliteRegistry {
    async fn find_visitor_by_id_number(&self, id_number: &str) -> StorageResult<Option<Visitor>> {
        self.visitors.find_by_id_number(id_number).await
    }

    async fn find_visitor_by_access_code(
        &self,
        code: &AccessCode,
    ) -> StorageResult<Option<Visitor>> {
        self.visitors.find_by_access_code(code.as_str()).await
    }

    async fn find_by_vehicle_registration(
        &self,
        registration: &VehicleRegistration,
    ) -> StorageResult<Option<VehicleMatch>> {
        let disks = self.disks.find_by_registration(registration).await?;
        trace!(registration = %registration, candidates = disks.len(), "vehicle lookup");

        // Resident-owned disks sort first.
        for disk in disks {
            if let Some(resident_id) = disk.resident_id.as_deref() {
                if let Some(resident) = self.residents.find_by_id(resident_id).await? {
                    return Ok(Some(VehicleMatch::Resident { resident, disk }));
                }
            } else if let Some(visitor_id) = disk.visitor_id.as_deref()
                && let Some(visitor) = self.visitors.find_by_id(visitor_id).await?
            {
                return Ok(Some(VehicleMatch::Visitor { visitor, disk }));
            }
        }

        Ok(None)
    }

    async fn find_resident_by_plate(
        &self,
        plate: &VehicleRegistration,
    ) -> StorageResult<Option<VehicleMatch>> {
        for disk in self.disks.find_by_registration(plate).await? {
            let Some(resident_id) = disk.resident_id.as_deref() else {
                continue;
            };
            if let Some(resident) = self.residents.find_by_id(resident_id).await? {
                return Ok(Some(VehicleMatch::Resident { resident, disk }));
            }
        }

        Ok(None)
    }

    async fn update_visitor_status(
        &self,
        visitor_id: &str,
        update: &StatusUpdate,
    ) -> StorageResult<Visitor> {
        self.visitors.update_status(visitor_id, update).await
    }

    async fn insert_scan_log(&self, entry: &NewScanLog) -> StorageResult<i64> {
        self.logs.create(entry).await
    }
}
