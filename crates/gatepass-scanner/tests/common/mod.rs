//! Shared fixtures for the scanner integration tests.

#![allow(async_fn_in_trait, dead_code)]

use chrono::Utc;
use gatepass_core::{AccessCode, GeoFix, VehicleRegistration};
use gatepass_hardware::mock::{
    MockGeolocation, MockGeolocationHandle, MockStillCamera, MockStillCameraHandle,
    MockVideoCamera, MockVideoCameraHandle,
};
use gatepass_scanner::mock::ScriptedSymbolEngine;
use gatepass_scanner::{CaptureDevices, ChannelNotifier, Notification, ScanSession};
use gatepass_storage::models::{NewScanLog, ScanLog, StatusUpdate, VehicleMatch, Visitor};
use gatepass_storage::repositories::{ScanLogRepository, SqliteScanLogRepository};
use gatepass_storage::{
    Database, RegistrySeed, RegistryStore, ScanReconciler, SqliteRegistry, StorageError,
    StorageResult, import_registry,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

pub const JANE_ID_NUMBER: &str = "8001015009087";

const SEED: &str = r#"{
  "residents": [
    { "id": "res-12", "full_name": "Sipho Dlamini", "unit_number": "12",
      "vehicles": [ { "registration": "ABC 123 GP", "make": "Toyota", "model": "Hilux" } ] }
  ],
  "visitors": [
    { "id": "vis-jane", "full_name": "Jane Doe", "id_number": "8001015009087",
      "access_code": "VIS-2041", "host_resident_id": "res-12", "status": "Approved" },
    { "id": "vis-lerato", "full_name": "Lerato Mokoena",
      "vehicles": [ { "registration": "ABC123GP" } ] }
  ]
}"#;

/// A session over an in-memory registry with a mock live camera and a mock
/// position provider.
pub struct Harness<R> {
    pub session: ScanSession<R>,
    pub camera: MockVideoCameraHandle,
    pub geo: MockGeolocationHandle,
    pub engine: Arc<ScriptedSymbolEngine>,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

impl<R> Harness<R> {
    /// Notifications received so far, by title.
    pub fn notification_titles(&mut self) -> Vec<String> {
        let mut titles = Vec::new();
        while let Ok(note) = self.notifications.try_recv() {
            titles.push(note.title);
        }
        titles
    }
}

pub async fn seeded_db() -> Database {
    let db = Database::in_memory().await.unwrap();
    let seed = RegistrySeed::from_json(SEED).unwrap();
    import_registry(db.pool(), &seed).await.unwrap();
    db
}

pub async fn harness(db: &Database) -> Harness<SqliteRegistry> {
    harness_with(SqliteRegistry::new(db.pool().clone())).await
}

pub async fn harness_with<R: RegistryStore>(registry: R) -> Harness<R> {
    let (camera, camera_handle) = MockVideoCamera::new();
    let (provider, geo) = MockGeolocation::new();
    let engine = Arc::new(ScriptedSymbolEngine::new());
    let (notifier, notifications) = ChannelNotifier::new();

    let session = ScanSession::builder(Arc::new(ScanReconciler::new(registry)))
        .symbol_engine(engine.clone())
        .capture_devices(CaptureDevices::with_video(camera))
        .geolocation(provider)
        .notifier(Arc::new(notifier))
        .open()
        .await;

    Harness {
        session,
        camera: camera_handle,
        geo,
        engine,
        notifications,
    }
}

/// Session with the default decoding engine and a mock live camera.
pub async fn decoding_harness(
    db: &Database,
) -> (ScanSession<SqliteRegistry>, MockVideoCameraHandle) {
    let (camera, handle) = MockVideoCamera::new();
    let reconciler = Arc::new(ScanReconciler::new(SqliteRegistry::new(db.pool().clone())));

    let session = ScanSession::builder(reconciler)
        .capture_devices(CaptureDevices::with_video(camera))
        .notifier(Arc::new(gatepass_scanner::NullNotifier))
        .open()
        .await;
    (session, handle)
}

/// Session with only a native still camera.
pub async fn still_harness(
    db: &Database,
) -> (ScanSession<SqliteRegistry>, MockStillCameraHandle, Arc<ScriptedSymbolEngine>) {
    let (camera, handle) = MockStillCamera::new();
    let engine = Arc::new(ScriptedSymbolEngine::new());
    let reconciler = Arc::new(ScanReconciler::new(SqliteRegistry::new(db.pool().clone())));

    let session = ScanSession::builder(reconciler)
        .symbol_engine(engine.clone())
        .capture_devices(CaptureDevices::with_still(camera))
        .notifier(Arc::new(gatepass_scanner::NullNotifier))
        .open()
        .await;
    (session, handle, engine)
}

pub async fn scan_logs(db: &Database) -> Vec<ScanLog> {
    SqliteScanLogRepository::new(db.pool().clone())
        .find_recent(50)
        .await
        .unwrap()
}

pub fn fix() -> GeoFix {
    GeoFix::new(-26.1076, 28.0567, 9.5, Utc::now()).unwrap()
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::GrayImage::from_fn(8, 8, |x, y| image::Luma([((x + y) * 16) as u8]));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Render `text` as a QR code, four pixels per module with a four-module
/// quiet zone.
pub fn qr_image(text: &str) -> image::GrayImage {
    const SCALE: usize = 4;
    const QUIET_ZONE: usize = 4;

    let code = qrcode::QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width();
    let colors = code.to_colors();
    let side = ((modules + 2 * QUIET_ZONE) * SCALE) as u32;

    image::GrayImage::from_fn(side, side, |x, y| {
        let mx = (x as usize / SCALE).checked_sub(QUIET_ZONE);
        let my = (y as usize / SCALE).checked_sub(QUIET_ZONE);
        match (mx, my) {
            (Some(mx), Some(my))
                if mx < modules
                    && my < modules
                    && colors[my * modules + mx] == qrcode::Color::Dark =>
            {
                image::Luma([0])
            }
            _ => image::Luma([255]),
        }
    })
}

pub fn qr_png(text: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    qr_image(text)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
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
