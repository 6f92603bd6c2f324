//! Shared fixtures for the storage integration tests.

#![allow(async_fn_in_trait, dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use gatepass_core::{AccessCode, VehicleRegistration};
use gatepass_storage::models::{NewScanLog, Resident, StatusUpdate, VehicleDisk, VehicleMatch, Visitor};
use gatepass_storage::repositories::{
    ResidentRepository, SqliteResidentRepository, SqliteVehicleDiskRepository,
    SqliteVisitorRepository, VehicleDiskRepository, VisitorRepository,
};
use gatepass_storage::{
    Database, RegistryStore, ScanReconciler, SqliteRegistry, StorageError, StorageResult,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const JANE_ID_NUMBER: &str = "8001015009087";

/// Licence disk payload whose licence number is `ABC123GP`.
pub const POLO_DISK: &str = "%MVL1CC21%0144%4024T07P%1%4024044G7QJ5%ABC123GP%XYZ789A%Hatch back / Luikrug%VOLKSWAGEN%POLO%White / Wit%AAVZZZ6RZBU012345%CBZ123456%2027-03-31%";

pub fn scan_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 7, 45, 0).unwrap()
}

pub async fn setup() -> (Database, ScanReconciler<SqliteRegistry>) {
    let db = Database::in_memory().await.unwrap();
    let reconciler = ScanReconciler::new(SqliteRegistry::new(db.pool().clone()));
    (db, reconciler)
}

pub async fn seed_jane(db: &Database) -> Visitor {
    let visitors = SqliteVisitorRepository::new(db.pool().clone());
    let jane = Visitor::new("Jane Doe")
        .with_id_number(JANE_ID_NUMBER)
        .with_access_code("VIS-2041");
    visitors.create(&jane).await.unwrap();
    jane
}

pub async fn seed_resident_with_vehicle(db: &Database, name: &str, plate: &str) -> Resident {
    let residents = SqliteResidentRepository::new(db.pool().clone());
    let disks = SqliteVehicleDiskRepository::new(db.pool().clone());

    let resident = Resident::new(name).with_unit_number("12");
    residents.create(&resident).await.unwrap();

    let registration = VehicleRegistration::new(plate).unwrap();
    let disk = VehicleDisk::for_resident(&registration, &resident.id).with_vehicle(
        Some("Toyota".to_string()),
        Some("Hilux".to_string()),
        None,
    );
    disks.create(&disk).await.unwrap();
    resident
}

pub async fn seed_visitor_with_vehicle(db: &Database, name: &str, plate: &str) -> Visitor {
    let visitors = SqliteVisitorRepository::new(db.pool().clone());
    let disks = SqliteVehicleDiskRepository::new(db.pool().clone());

    let visitor = Visitor::new(name);
    visitors.create(&visitor).await.unwrap();

    let registration = VehicleRegistration::new(plate).unwrap();
    disks
        .create(&VehicleDisk::for_visitor(&registration, &visitor.id))
        .await
        .unwrap();
    visitor
}

/// Registry whose lookups always fail. Counts insert attempts.
#[derive(Debug, Clone, Default)]
pub struct FailingRegistry {
    inserts: Arc<AtomicUsize>,
}

impl FailingRegistry {
    pub fn insert_attempts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    fn offline<T>() -> StorageResult<T> {
        Err(StorageError::Configuration("registry offline".to_string()))
    }
}

impl RegistryStore for FailingRegistry {
    async fn find_visitor_by_id_number(&self, _id_number: &str) -> StorageResult<Option<Visitor>> {
        Self::offline()
    }

    async fn find_visitor_by_access_code(
        &self,
        _code: &AccessCode,
    ) -> StorageResult<Option<Visitor>> {
        Self::offline()
    }

    async fn find_by_vehicle_registration(
        &self,
        _registration: &VehicleRegistration,
    ) -> StorageResult<Option<VehicleMatch>> {
        Self::offline()
    }

    async fn find_resident_by_plate(
        &self,
        _plate: &VehicleRegistration,
    ) -> StorageResult<Option<VehicleMatch>> {
        Self::offline()
    }

    async fn update_visitor_status(
        &self,
        _visitor_id: &str,
        _update: &StatusUpdate,
    ) -> StorageResult<Visitor> {
        Self::offline()
    }

    async fn insert_scan_log(&self, _entry: &NewScanLog) -> StorageResult<i64> {
        Ok(self.inserts.fetch_add(1, Ordering::SeqCst) as i64 + 1)
    }
}

/// Real registry for lookups whose scan log writes always fail.
#[derive(Debug, Clone)]
pub struct LogRejectingRegistry {
    inner: SqliteRegistry,
}

impl LogRejectingRegistry {
    pub fn new(db: &Database) -> Self {
        Self {
            inner: SqliteRegistry::new(db.pool().clone()),
        }
    }
}

impl RegistryStore for LogRejectingRegistry {
    async fn find_visitor_by_id_number(&self, id_number: &str) -> StorageResult<Option<Visitor>> {
        self.inner.find_visitor_by_id_number(id_number).await
    }

    async fn find_visitor_by_access_code(&self, code: &AccessCode) -> StorageResult<Option<Visitor>> {
        self.inner.find_visitor_by_access_code(code).await
    }

    async fn find_by_vehicle_registration(
        &self,
        registration: &VehicleRegistration,
    ) -> StorageResult<Option<VehicleMatch>> {
        self.inner.find_by_vehicle_registration(registration).await
    }

    async fn find_resident_by_plate(
        &self,
        plate: &VehicleRegistration,
    ) -> StorageResult<Option<VehicleMatch>> {
        self.inner.find_resident_by_plate(plate).await
    }

    async fn update_visitor_status(
        &self,
        visitor_id: &str,
        update: &StatusUpdate,
    ) -> StorageResult<Visitor> {
        self.inner.update_visitor_status(visitor_id, update).await
    }

    async fn insert_scan_log(&self, _entry: &NewScanLog) -> StorageResult<i64> {
        Err(StorageError::Configuration("scan log is read-only".to_string()))
    }
}
