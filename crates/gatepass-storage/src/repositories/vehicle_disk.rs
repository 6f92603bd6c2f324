#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::VehicleDisk;
use gatepass_core::VehicleRegistration;
use sqlx::SqlitePool;

/// Repository trait for vehicle licence disks
pub trait VehicleDiskRepository: Send + Sync {
    /// All disks carrying the registration, resident-owned first.
    async fn find_by_registration(
        &self,
        registration: &VehicleRegistration,
    ) -> StorageResult<Vec<VehicleDisk>>;

    async fn create(&self, disk: &VehicleDisk) -> StorageResult<()>;
}

/// SQLite implementation of VehicleDiskRepository
#[derive(Debug, Clone)]
pub struct SqliteVehicleDiskRepository {
    pool: SqlitePool,
}

impl SqliteVehicleDiskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl VehicleDiskRepository for SqliteVehicleDiskRepository {
    async fn find_by_registration(
        &self,
        registration: &VehicleRegistration,
    ) -> StorageResult<Vec<VehicleDisk>> {
        let disks = sqlx::query_as::<_, VehicleDisk>(
            r#"
            SELECT id, registration, make, model, colour,
                   resident_id, visitor_id, created_at
            FROM vehicle_disks
            WHERE registration = ?
            ORDER BY resident_id IS NULL, created_at DESC
            "#,
        )
        .bind(registration.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(disks)
    }

    async fn create(&self, disk: &VehicleDisk) -> StorageResult<()> {
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
        .bind(VehicleRegistration::normalize(&disk.registration))
        .bind(&disk.make)
        .bind(&disk.model)
        .bind(&disk.colour)
        .bind(&disk.resident_id)
        .bind(&disk.visitor_id)
        .bind(disk.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
