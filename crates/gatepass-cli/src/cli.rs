use clap::{Args, Parser, Subcommand};
use gatepass_core::{ScanDirection, ScanType};
use std::path::PathBuf;

pub const DEFAULT_DATABASE: &str = "gatepass.db";

#[derive(Parser, Debug)]
#[command(name = "gatepass", version, about = "Gate scanning and visitor registry tools")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "GATEPASS_DB",
        default_value = DEFAULT_DATABASE,
        help = "Path to the registry database"
    )]
    pub database: String,

    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,

    #[arg(short, long, global = true, help = "Log at debug level unless GATEPASS_LOG is set")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending schema migrations.
    Migrate,
    /// Load residents, visitors and vehicle disks from a JSON seed file.
    Import { file: PathBuf },
    /// Reconcile a decoded payload against the registry and log it.
    Reconcile(ScanArgs),
    /// Run a full scan session, decoding a captured image.
    Scan {
        #[arg(long = "type", help = "id, vehicle-disk or anpr")]
        scan_type: ScanType,
        #[arg(long, default_value = "ingress")]
        direction: ScanDirection,
        #[arg(long, required_unless_present = "payload", help = "PNG or JPEG capture to decode")]
        image: Option<PathBuf>,
        #[arg(long, conflicts_with = "image", help = "Plate text, for ANPR scans without an image")]
        payload: Option<String>,
        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,
        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,
        #[arg(long, default_value_t = 10.0)]
        accuracy: f64,
    },
    /// Check a visitor in by access code.
    CheckIn(AccessCodeArgs),
    /// Check a visitor out by access code.
    CheckOut(AccessCodeArgs),
    /// List recent scan log entries.
    Logs {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long, help = "Only entries for this scanned id")]
        scanned_id: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[arg(long = "type", help = "id, vehicle-disk or anpr")]
    pub scan_type: ScanType,
    #[arg(long, default_value = "ingress")]
    pub direction: ScanDirection,
    #[arg(long, help = "Decoded barcode text or plate")]
    pub payload: String,
}

#[derive(Args, Debug, Clone)]
pub struct AccessCodeArgs {
    #[arg(long)]
    pub access_code: String,
}
