#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::Resident;
use sqlx::SqlitePool;

/// Repository trait for resident records
pub trait ResidentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<Resident>>;

    async fn create(&self, resident: &Resident) -> StorageResult<()>;

    async fn count(&self) -> StorageResult<i64>;
}

/// SQLite implementation of ResidentRepository
#[derive(Debug, Clone)]
pub struct SqliteResidentRepository {
    pool: SqlitePool,
}

impl SqliteResidentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ResidentRepository for SqliteResidentRepository {
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<Resident>> {
        let resident = sqlx::query_as::<_, Resident>(
            r#"
            SELECT id, full_name, unit_number, phone, created_at
            FROM residents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(resident)
    }

    async fn create(&self, resident: &Resident) -> StorageResult<()> {
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
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count(&self) -> StorageResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM residents")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;

    #[tokio::test]
    async fn test_create_and_find_resident() {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteResidentRepository::new(db.pool().clone());

        let resident = Resident::new("Thandi Mokoena").with_unit_number("12B");
        repo.create(&resident).await.unwrap();

        let found = repo.find_by_id(&resident.id).await.unwrap().unwrap();
        assert_eq!(found.full_name, "Thandi Mokoena");
        assert_eq!(found.unit_number.as_deref(), Some("12B"));
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }
}
