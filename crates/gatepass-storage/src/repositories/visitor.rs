#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::{StatusUpdate, Visitor};
use chrono::Utc;
use sqlx::SqlitePool;

const VISITOR_COLUMNS: &str = "id, full_name, id_number, access_code, host_resident_id, status, \
     visit_date, check_in_time, check_out_time, created_at, updated_at";

/// Repository trait for visitor records
///
/// Identifier lookups are exact and case-insensitive.
pub trait VisitorRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<Visitor>>;

    async fn find_by_id_number(&self, id_number: &str) -> StorageResult<Option<Visitor>>;

    async fn find_by_access_code(&self, access_code: &str) -> StorageResult<Option<Visitor>>;

    async fn create(&self, visitor: &Visitor) -> StorageResult<()>;

    /// Apply a check-in or check-out and return the updated visitor.
    ///
    /// Times absent from the update are left unchanged.
    async fn update_status(&self, id: &str, update: &StatusUpdate) -> StorageResult<Visitor>;

    async fn count(&self) -> StorageResult<i64>;
}

/// SQLite implementation of VisitorRepository
#[derive(Debug, Clone)]
pub struct SqliteVisitorRepository {
    pool: SqlitePool,
}

impl SqliteVisitorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> StorageResult<Option<Visitor>> {
        // `column` is always one of the constant names below, never user input.
        let sql = format!("SELECT {VISITOR_COLUMNS} FROM visitors WHERE {column} = ? COLLATE NOCASE");

        let visitor = sqlx::query_as::<_, Visitor>(&sql)
            .bind(value.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(visitor)
    }
}

impl VisitorRepository for SqliteVisitorRepository {
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<Visitor>> {
        self.find_one("id", id).await
    }

    async fn find_by_id_number(&self, id_number: &str) -> StorageResult<Option<Visitor>> {
        self.find_one("id_number", id_number).await
    }

    async fn find_by_access_code(&self, access_code: &str) -> StorageResult<Option<Visitor>> {
        self.find_one("access_code", access_code).await
    }

    async fn create(&self, visitor: &Visitor) -> StorageResult<()> {
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
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_status(&self, id: &str, update: &StatusUpdate) -> StorageResult<Visitor> {
        let result = sqlx::query(
            r#"
            UPDATE visitors
            SET status = ?,
                check_in_time = COALESCE(?, check_in_time),
                check_out_time = COALESCE(?, check_out_time),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.status.as_str())
        .bind(update.check_in_time)
        .bind(update.check_out_time)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("Visitor", "id", id));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::not_found("Visitor", "id", id))
    }

    async fn count(&self) -> StorageResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visitors")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
