#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::{NewScanLog, ScanLog};
use sqlx::SqlitePool;

/// Repository trait for the append-only scan log
pub trait ScanLogRepository: Send + Sync {
    /// Append an entry and return its row id.
    async fn create(&self, entry: &NewScanLog) -> StorageResult<i64>;

    /// Most recent entries first.
    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<ScanLog>>;

    async fn find_by_scanned_id(&self, scanned_id: &str, limit: i64)
    -> StorageResult<Vec<ScanLog>>;

    async fn count(&self) -> StorageResult<i64>;
}

/// SQLite implementation of ScanLogRepository
#[derive(Debug, Clone)]
pub struct SqliteScanLogRepository {
    pool: SqlitePool,
}

impl SqliteScanLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ScanLogRepository for SqliteScanLogRepository {
    async fn create(&self, entry: &NewScanLog) -> StorageResult<i64> {
        let scan_result = serde_json::to_string(&entry.scan_result)?;
        let geo_location = entry.geo_location_json()?;

        let result = sqlx::query(
            r#"
            INSERT INTO scan_logs (
                security_officer_id, scanned_id, scan_type, scan_result,
                geo_location, timestamp, direction, visitor_id
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.security_officer_id)
        .bind(&entry.scanned_id)
        .bind(entry.scan_type.log_label())
        .bind(scan_result)
        .bind(geo_location)
        .bind(entry.timestamp)
        .bind(entry.direction.as_str())
        .bind(&entry.visitor_id)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<ScanLog>> {
        let logs = sqlx::query_as::<_, ScanLog>(
            r#"
            SELECT id, security_officer_id, scanned_id, scan_type, scan_result,
                   geo_location, timestamp, direction, visitor_id, created_at
            FROM scan_logs
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn find_by_scanned_id(
        &self,
        scanned_id: &str,
        limit: i64,
    ) -> StorageResult<Vec<ScanLog>> {
        let logs = sqlx::query_as::<_, ScanLog>(
            r#"
            SELECT id, security_officer_id, scanned_id, scan_type, scan_result,
                   geo_location, timestamp, direction, visitor_id, created_at
            FROM scan_logs
            WHERE scanned_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(scanned_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    async fn count(&self) -> StorageResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scan_logs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
