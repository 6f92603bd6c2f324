pub mod resident;
pub mod scan_log;
pub mod vehicle_disk;
pub mod visitor;

pub use resident::{ResidentRepository, SqliteResidentRepository};
pub use scan_log::{ScanLogRepository, SqliteScanLogRepository};
pub use vehicle_disk::{SqliteVehicleDiskRepository, VehicleDiskRepository};
pub use visitor::{SqliteVisitorRepository, VisitorRepository};
