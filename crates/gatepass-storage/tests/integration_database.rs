//! Integration tests for the registry database: pooling, migrations,
//! on-disk files and concurrent scan logging.
//!
//! Run with: cargo test --package gatepass-storage --test integration_database

mod common;

use common::*;
use gatepass_core::{ScanDirection, ScanType};
use gatepass_storage::repositories::ScanLogRepository;
use gatepass_storage::{Database, DatabaseConfig, ReconcileRequest, ScanReconciler, SqliteRegistry};
use std::sync::Arc;
use tokio::sync::Barrier;

#[tokio::test]
async fn test_in_memory_database() {
    let db = Database::in_memory().await.unwrap();
    db.health_check().await.unwrap();
    db.close().await;
}

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='scan_logs'")
            .fetch_one(db.pool())
            .await
            .unwrap();

    assert_eq!(result.0, 1);

    db.close().await;
}

#[tokio::test]
async fn test_file_database_persists_scan_logs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("gatepass.db");
    let path = path.to_string_lossy().to_string();

    {
        let db = Database::new(DatabaseConfig::new(&path)).await.unwrap();
        let reconciler = ScanReconciler::new(SqliteRegistry::new(db.pool().clone()));
        let request =
            ReconcileRequest::new("ABC123GP", ScanType::Anpr, ScanDirection::Ingress, scan_time());
        assert!(reconciler.reconcile(&request).await.success);
        db.close().await;
    }

    let db = Database::new(DatabaseConfig::new(&path).create_if_missing(false))
        .await
        .unwrap();
    let registry = SqliteRegistry::new(db.pool().clone());
    let logs = registry.scan_logs().find_by_scanned_id("ABC123GP", 10).await.unwrap();
    assert_eq!(logs.len(), 1);

    db.close().await;
}

#[tokio::test]
async fn test_missing_file_without_create_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.db");

    let result = Database::new(
        DatabaseConfig::new(path.to_string_lossy()).create_if_missing(false),
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_concurrent_reconciliations_each_log_once() {
    let (db, reconciler) = setup().await;
    seed_jane(&db).await;

    const NUM_CONCURRENT_SCANS: usize = 8;
    let reconciler = Arc::new(reconciler);
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_SCANS));

    let mut handles = vec![];

    for i in 0..NUM_CONCURRENT_SCANS {
        let reconciler = Arc::clone(&reconciler);
        let barrier = Arc::clone(&barrier);

        handles.push(tokio::spawn(async move {
            barrier.wait().await;

            let direction = if i % 2 == 0 {
                ScanDirection::Ingress
            } else {
                ScanDirection::Egress
            };
            let request =
                ReconcileRequest::new(JANE_ID_NUMBER, ScanType::IdDocument, direction, scan_time());
            reconciler.reconcile(&request).await
        }));
    }

    let results: Vec<_> = futures::future::join_all(handles).await;

    for result in results {
        assert!(result.unwrap().success);
    }

    let logs = reconciler
        .registry()
        .scan_logs()
        .find_recent(100)
        .await
        .unwrap();
    assert_eq!(logs.len(), NUM_CONCURRENT_SCANS);
    assert_eq!(logs.iter().filter(|l| l.direction == "egress").count(), 4);

    db.close().await;
}
