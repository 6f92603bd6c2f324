//! Bulk registry import.
//!
//! Residents, visitors and their vehicle disks are read from a JSON seed
//! file and inserted in a single transaction: either the whole file lands or
//! nothing does.
//!
//! ```json
//! {
//!   "residents": [
//!     { "id": "res-7", "full_name": "Sipho Dlamini", "unit_number": "7",
//!       "vehicles": [ { "registration": "ABC 123 GP", "make": "Toyota", "model": "Corolla" } ] }
//!   ],
//!   "visitors": [
//!     { "full_name": "Jane Doe", "id_number": "8001015009087",
//!       "access_code": "VIS-2041", "host_resident_id": "res-7" }
//!   ]
//! }
//! ```
//!
//! The `insert_*` functions take an open transaction so callers can group
//! them with other writes.

use chrono::NaiveDate;
use gatepass_core::{VehicleRegistration, VisitorStatus};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use tracing::info;

use crate::error::{StorageError, StorageResult};
use crate::models::{Resident, VehicleDisk, Visitor};

/// Vehicle attached to a resident or visitor in a seed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSeed {
    pub registration: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub colour: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidentSeed {
    /// Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub unit_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub vehicles: Vec<VehicleSeed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorSeed {
    #[serde(default)]
    pub id: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub id_number: Option<String>,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub host_resident_id: Option<String>,
    #[serde(default)]
    pub status: Option<VisitorStatus>,
    #[serde(default)]
    pub visit_date: Option<NaiveDate>,
    #[serde(default)]
    pub vehicles: Vec<VehicleSeed>,
}

/// Contents of a registry seed file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySeed {
    #[serde(default)]
    pub residents: Vec<ResidentSeed>,
    #[serde(default)]
    pub visitors: Vec<VisitorSeed>,
}

impl RegistrySeed {
    pub fn from_json(text: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            StorageError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }
}

/// Row counts written by [`import_registry`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub residents: usize,
    pub visitors: usize,
    pub vehicle_disks: usize,
}

/// Import a seed atomically.
///
/// # Errors
///
/// Any invalid registration, duplicate id number / access code or unknown
/// host rolls back the whole import.
pub async fn import_registry(pool: &SqlitePool, seed: &RegistrySeed) -> StorageResult<ImportSummary> {
    let mut tx = pool.begin().await?;
    let mut summary = ImportSummary::default();

    for entry in &seed.residents {
        let mut resident = Resident::new(&entry.full_name);
        if let Some(id) = &entry.id {
            resident = resident.with_id(id);
        }
        resident.unit_number = entry.unit_number.clone();
        resident.phone = entry.phone.clone();

        insert_resident(&mut tx, &resident).await?;
        summary.residents += 1;

        for vehicle in &entry.vehicles {
            let disk = VehicleDisk::for_resident(&parse_registration(vehicle)?, &resident.id)
                .with_vehicle(vehicle.make.clone(), vehicle.model.clone(), vehicle.colour.clone());
            insert_vehicle_disk(&mut tx, &disk).await?;
            summary.vehicle_disks += 1;
        }
    }

    for entry in &seed.visitors {
        let visitor = visitor_from_seed(entry);
        insert_visitor(&mut tx, &visitor).await?;
        summary.visitors += 1;

        for vehicle in &entry.vehicles {
            let disk = VehicleDisk::for_visitor(&parse_registration(vehicle)?, &visitor.id)
                .with_vehicle(vehicle.make.clone(), vehicle.model.clone(), vehicle.colour.clone());
            insert_vehicle_disk(&mut tx, &disk).await?;
            summary.vehicle_disks += 1;
        }
    }

    tx.commit().await?;

    info!(
        residents = summary.residents,
        visitors = summary.visitors,
        vehicle_disks = summary.vehicle_disks,
        "registry imported"
    );

    Ok(summary)
}

fn visitor_from_seed(entry: &VisitorSeed) -> Visitor {
    let mut visitor = Visitor::new(&entry.full_name)
        .with_status(entry.status.unwrap_or(VisitorStatus::Pending));
    if let Some(id) = &entry.id {
        visitor = visitor.with_id(id);
    }
    if let Some(id_number) = &entry.id_number {
        visitor = visitor.with_id_number(id_number);
    }
    if let Some(code) = &entry.access_code {
        visitor = visitor.with_access_code(code);
    }
    if let Some(host) = &entry.host_resident_id {
        visitor = visitor.with_host(host);
    }
    if let Some(date) = entry.visit_date {
        visitor = visitor.with_visit_date(date);
    }
    visitor
}

fn parse_registration(vehicle: &VehicleSeed) -> StorageResult<VehicleRegistration> {
    Ok(VehicleRegistration::new(&vehicle.registration)?)
}

/// Insert a resident within a transaction.
pub async fn insert_resident(
    tx: &mut Transaction<'_, Sqlite>,
    resident: &Resident,
) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO residents (id, full_name, unit_number, phone, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&resident.id)
    .bind(&resident.full_name)
    .bind(&resident.unit_number)
    .bind(&resident.phone)
    .bind(resident.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Insert a visitor within a transaction.
///
/// # Errors
///
/// Fails on a duplicate id number or access code, or an unknown host.
pub async fn insert_visitor(
    tx: &mut Transaction<'_, Sqlite>,
    visitor: &Visitor,
) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO visitors (
            id, full_name, id_number, access_code, host_resident_id, status,
            visit_date, check_in_time, check_out_time, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&visitor.id)
    .bind(&visitor.full_name)
    .bind(&visitor.id_number)
    .bind(&visitor.access_code)
    .bind(&visitor.host_resident_id)
    .bind(&visitor.status)
    .bind(visitor.visit_date)
    .bind(visitor.check_in_time)
    .bind(visitor.check_out_time)
    .bind(visitor.created_at)
    .bind(visitor.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn insert_vehicle_disk(
    tx: &mut Transaction<'_, Sqlite>,
    disk: &VehicleDisk,
) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO vehicle_disks (
            id, registration, make, model, colour,
            resident_id, visitor_id, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&disk.id)
    .bind(&disk.registration)
    .bind(&disk.make)
    .bind(&disk.model)
    .bind(&disk.colour)
    .bind(&disk.resident_id)
    .bind(&disk.visitor_id)
    .bind(disk.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
