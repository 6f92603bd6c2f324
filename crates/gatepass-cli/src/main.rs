use anyhow::{Context, bail};
use chrono::Utc;
use clap::Parser;
use gatepass_core::{AccessCode, GeoFix, ScanDirection, ScanType, VehicleRegistration};
use gatepass_hardware::mock::{MockGeolocation, MockStillCamera, MockVideoCamera};
use gatepass_hardware::types::{CapturedImage, Frame};
use gatepass_scanner::{
    CaptureDevices, EngineError, PlateReading, PlateRecognizer, Presentation, ScanLifecycle,
    ScanSession, SessionConfig,
};
use gatepass_storage::payload::parse_plate;
use gatepass_storage::{
    Database, DatabaseConfig, RegistrySeed, ReconcileRequest, ScanLogRepository, ScanReconciler,
    SqliteRegistry, SqliteScanLogRepository, import_registry,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{AccessCodeArgs, Cli, Commands};

const SCAN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct JsonOut<'a, T: Serialize> {
    ok: bool,
    data: &'a T,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = SessionConfig::from_env();
    debug!(officer_id = %config.officer_id, database = %cli.database, "configuration loaded");

    if let Commands::Migrate = cli.command {
        let db = Database::new(DatabaseConfig::new(&cli.database).auto_migrate(false))
            .await
            .with_context(|| format!("opening {}", cli.database))?;
        db.migrate().await.context("applying migrations")?;
        print_one(cli.json, &cli.database, |path| format!("{path}: migrations applied"))?;
        db.close().await;
        return Ok(ExitCode::SUCCESS);
    }

    let db = Database::new(DatabaseConfig::new(&cli.database))
        .await
        .with_context(|| format!("opening {}", cli.database))?;
    let reconciler = Arc::new(ScanReconciler::new(SqliteRegistry::new(db.pool().clone())));

    let code = match cli.command {
        Commands::Migrate => ExitCode::SUCCESS,
        Commands::Import { file } => {
            let seed = RegistrySeed::from_file(&file)?;
            let summary = import_registry(db.pool(), &seed)
                .await
                .with_context(|| format!("importing {}", file.display()))?;
            print_one(cli.json, &summary, |s| {
                format!(
                    "imported {} residents, {} visitors, {} vehicle disks",
                    s.residents, s.visitors, s.vehicle_disks
                )
            })?;
            ExitCode::SUCCESS
        }
        Commands::Reconcile(scan) => {
            let request = ReconcileRequest::new(
                scan.payload,
                scan.scan_type,
                scan.direction,
                Utc::now(),
            )
            .with_officer(config.officer_id.clone());
            let result = reconciler.reconcile(&request).await;
            let presentation = Presentation::for_result(&result);
            print_one(cli.json, &result, |_| render(&presentation))?;
            if result.is_failure() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Commands::Scan {
            scan_type,
            direction,
            image,
            payload,
            latitude,
            longitude,
            accuracy,
        } => {
            let location = match (latitude, longitude) {
                (Some(lat), Some(lon)) => Some(GeoFix::new(lat, lon, accuracy, Utc::now())?),
                _ => None,
            };
            let input = ScanInput {
                scan_type,
                direction,
                image,
                payload,
            };
            let (state, presentation) =
                run_scan(Arc::clone(&reconciler), config.clone(), input, location).await?;
            print_one(cli.json, &presentation, render)?;
            if state == ScanLifecycle::Resolved {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::CheckIn(AccessCodeArgs { access_code }) => {
            let code = AccessCode::new(&access_code)?;
            let visitor = reconciler
                .process_access_code(&code, ScanDirection::Ingress, Utc::now())
                .await?;
            print_one(cli.json, &visitor, |v| format!("{} checked in", v.full_name))?;
            ExitCode::SUCCESS
        }
        Commands::CheckOut(AccessCodeArgs { access_code }) => {
            let code = AccessCode::new(&access_code)?;
            let visitor = reconciler
                .process_access_code(&code, ScanDirection::Egress, Utc::now())
                .await?;
            print_one(cli.json, &visitor, |v| format!("{} checked out", v.full_name))?;
            ExitCode::SUCCESS
        }
        Commands::Logs { limit, scanned_id } => {
            let logs = SqliteScanLogRepository::new(db.pool().clone());
            let entries = match scanned_id {
                Some(id) => logs.find_by_scanned_id(&id, limit).await?,
                None => logs.find_recent(limit).await?,
            };
            print_one(cli.json, &entries, |entries| {
                entries
                    .iter()
                    .map(|e| {
                        format!(
                            "{}\t{}\t{}\t{}\t{}",
                            e.timestamp.to_rfc3339(),
                            e.direction,
                            e.scan_type,
                            e.scanned_id,
                            e.visitor_id.as_deref().unwrap_or("-")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
            ExitCode::SUCCESS
        }
    };

    db.close().await;
    Ok(code)
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("GATEPASS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Plate recognizer that always reads the plate given on the command line.
struct KnownPlate(VehicleRegistration);

impl PlateRecognizer for KnownPlate {
    fn recognize(&self, _frame: &Frame) -> Result<PlateReading, EngineError> {
        Ok(PlateReading {
            plate: self.0.clone(),
            confidence: 1.0,
        })
    }
}

struct ScanInput {
    scan_type: ScanType,
    direction: ScanDirection,
    image: Option<PathBuf>,
    payload: Option<String>,
}

/// Drive one session end to end.
///
/// An image goes through the native capture path and is decoded once. A
/// typed plate is read from a single frame over a simulated live camera.
async fn run_scan(
    reconciler: Arc<ScanReconciler<SqliteRegistry>>,
    config: SessionConfig,
    input: ScanInput,
    location: Option<GeoFix>,
) -> anyhow::Result<(ScanLifecycle, Presentation)> {
    let mut builder = ScanSession::builder(reconciler)
        .config(config)
        .scan_type(input.scan_type)
        .direction(input.direction);

    let (still, still_handle) = MockStillCamera::new();
    let (video, frames) = MockVideoCamera::new();
    let devices = match (&input.image, &input.payload) {
        (Some(path), _) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            still_handle.queue_image(CapturedImage::Bytes(bytes)).await?;
            CaptureDevices::with_still(still)
        }
        (None, Some(plate)) if input.scan_type == ScanType::Anpr => {
            let plate = parse_plate(plate).context("reading plate")?;
            builder = builder.plate_recognizer(Arc::new(KnownPlate(plate)));
            CaptureDevices::with_video(video)
        }
        (None, Some(_)) => bail!("--payload is only accepted for anpr scans; pass --image"),
        (None, None) => bail!("nothing to scan; pass --image"),
    };

    let (provider, positions) = MockGeolocation::new();
    let mut session = builder
        .capture_devices(devices)
        .geolocation(provider)
        .open()
        .await;

    if let Some(fix) = location {
        let mut status = session.subscribe_location();
        positions.push_fix(fix);
        status.changed().await.context("waiting for position fix")?;
    }

    session.start().await?;
    if input.image.is_none() {
        frames.push_blank_frame().await?;
    }
    let settled = tokio::time::timeout(SCAN_TIMEOUT, session.run_until_settled()).await;

    let state = match settled {
        Ok(state) => state?,
        Err(_) => {
            session.close().await;
            bail!("scan did not settle within {:?}", SCAN_TIMEOUT);
        }
    };

    info!(session_id = %session.id(), %state, "scan settled");
    let presentation = session.presentation();
    session.close().await;
    Ok((state, presentation))
}

fn render(presentation: &Presentation) -> String {
    let mut out = format!("{}: {}", presentation.title, presentation.message);
    for line in &presentation.details {
        out.push_str("\n  ");
        out.push_str(line);
    }
    if !presentation.actions.is_empty() {
        let actions: Vec<String> = presentation.actions.iter().map(ToString::to_string).collect();
        out.push_str(&format!("\n  actions: {}", actions.join(", ")));
    }
    out
}

fn print_one<T: Serialize>(json: bool, data: &T, row: impl Fn(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", row(data));
    }
    Ok(())
}
