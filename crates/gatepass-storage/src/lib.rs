//! Storage layer for the gatepass scanning pipeline.
//!
//! This crate provides SQLite-backed persistence for the estate registry
//! (residents, visitors, vehicle disks) and the append-only scan log, plus the
//! scan reconciliation engine that ties a decoded payload to a registry
//! record.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with embedded migrations
//! - [`repositories`] - One repository trait and SQLite implementation per table
//! - [`RegistryStore`] - The lookups and writes a scan needs, implemented by
//!   [`SqliteRegistry`]
//! - [`payload`] - Parsing of ID card, licence disk and plate payloads
//! - [`ScanReconciler`] - Parse, look up, build a [`ScanResult`] and log it
//! - [`import`] - Transactional bulk import of registry seed files
//!
//! # Reconciliation
//!
//! A reconciliation never returns `Err`. Unusable payloads and store failures
//! come back as a [`ScanResult`] with `success: false` and leave the scan log
//! untouched; everything else (including unknown visitors and unregistered
//! plates) is logged exactly once.
//!
//! ```no_run
//! use chrono::Utc;
//! use gatepass_core::{ScanDirection, ScanType};
//! use gatepass_storage::{Database, DatabaseConfig, ReconcileRequest, ScanReconciler, SqliteRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("gatepass.db")).await?;
//! let reconciler = ScanReconciler::new(SqliteRegistry::new(db.pool().clone()));
//!
//! let request = ReconcileRequest::new("ABC123GP", ScanType::Anpr, ScanDirection::Egress, Utc::now());
//! let result = reconciler.reconcile(&request).await;
//!
//! if result.not_pre_registered {
//!     println!("{} (offer registration)", result.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Repositories Directly
//!
//! ```no_run
//! use gatepass_storage::{Database, DatabaseConfig};
//! use gatepass_storage::repositories::{ScanLogRepository, SqliteScanLogRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("gatepass.db")).await?;
//! let logs = SqliteScanLogRepository::new(db.pool().clone());
//!
//! for entry in logs.find_recent(20).await? {
//!     println!("{} {} {}", entry.timestamp, entry.scan_type, entry.scanned_id);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Schema Notes
//!
//! - Ids are UUID text; `scan_logs` uses an integer row id.
//! - `id_number`, `access_code` and `registration` compare case-insensitively.
//! - `scan_logs` rejects updates through a trigger.

pub mod connection;
pub mod error;
pub mod import;
pub mod messages;
pub mod models;
pub mod payload;
pub mod reconciler;
pub mod registry;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use import::{ImportSummary, RegistrySeed, import_registry};
pub use messages::DisplayMessages;
pub use models::{NewScanLog, Resident, ScanLog, StatusUpdate, VehicleDisk, VehicleMatch, Visitor};
pub use payload::{IdDocument, LicenceDisk, PayloadError, ScanPayload};
pub use reconciler::{
    IdMatchKey, MatchedEntity, ReconcileFailure, ReconcileRequest, ScanDetails, ScanReconciler,
    ScanResult,
};
pub use registry::{RegistryStore, SqliteRegistry};
pub use repositories::{
    ResidentRepository, ScanLogRepository, SqliteResidentRepository, SqliteScanLogRepository,
    SqliteVehicleDiskRepository, SqliteVisitorRepository, VehicleDiskRepository,
    VisitorRepository,
};
