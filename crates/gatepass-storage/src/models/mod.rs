pub mod resident;
pub mod scan_log;
pub mod vehicle_disk;
pub mod visitor;

pub use resident::Resident;
pub use scan_log::{NewScanLog, ScanLog};
pub use vehicle_disk::{VehicleDisk, VehicleMatch};
pub use visitor::{StatusUpdate, Visitor};
