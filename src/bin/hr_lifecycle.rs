//! HR lifecycle engine binary.
//!
//! # Usage
//!
//! ```bash
//! # Execute one batch run over the file-backed stores
//! hr-lifecycle run
//!
//! # Start the read-only preview API
//! HR_HOST=127.0.0.1 HR_PORT=8080 hr-lifecycle serve
//! ```
//!
//! # Environment Variables
//!
//! * `HR_CONFIG_DIR` - Directory holding `policy.yaml` (default: ./config)
//! * `HR_SNAPSHOT_PATH` - JSON array of employee records (default: ./data/employees.json)
//! * `HR_DEDUP_PATH` - Dedup store file (default: ./data/dedup.json)
//! * `HR_OUTBOX_PATH` - JSON-lines event outbox (default: ./data/outbox.jsonl)
//! * `HR_LOCK_LEASE_MINUTES` - Age after which an abandoned dedup lock is reclaimed (default: 360)
//! * `HR_EVALUATION_DATE` - Date to evaluate as today, `YYYY-MM-DD` (default: today, UTC)
//! * `HR_HOST` - Server host (default: 0.0.0.0)
//! * `HR_PORT` - Server port (default: 8080)
//! * `HR_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `HR_POLICY_<FIELD>` - Overrides a single policy threshold

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use hr_lifecycle_engine::api::{AppState, create_router};
use hr_lifecycle_engine::config::ConfigLoader;
use hr_lifecycle_engine::engine::LifecycleEngine;
use hr_lifecycle_engine::store::{
    DEFAULT_LOCK_LEASE, JsonFileDedupStore, JsonFileRecordSource, JsonLinesSink,
};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error>;

/// Settings read from the environment.
#[derive(Debug, Clone)]
struct Settings {
    config_dir: PathBuf,
    snapshot_path: PathBuf,
    dedup_path: PathBuf,
    outbox_path: PathBuf,
    lock_lease: Duration,
    evaluation_date: Option<NaiveDate>,
    host: String,
    port: u16,
    log_level: String,
}

impl Settings {
    fn from_env() -> Result<Self, BoxError> {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };

        let evaluation_date = match std::env::var("HR_EVALUATION_DATE") {
            Ok(raw) => Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|e| format!("HR_EVALUATION_DATE '{}': {}", raw, e))?,
            ),
            Err(_) => None,
        };
        let port: u16 = match std::env::var("HR_PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|e| format!("HR_PORT '{}': {}", raw, e))?,
            Err(_) => 8080,
        };
        let lock_lease = match std::env::var("HR_LOCK_LEASE_MINUTES") {
            Ok(raw) => {
                let minutes: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|e| format!("HR_LOCK_LEASE_MINUTES '{}': {}", raw, e))?;
                Duration::from_secs(minutes * 60)
            }
            Err(_) => DEFAULT_LOCK_LEASE,
        };

        Ok(Self {
            config_dir: var("HR_CONFIG_DIR", "./config").into(),
            snapshot_path: var("HR_SNAPSHOT_PATH", "./data/employees.json").into(),
            dedup_path: var("HR_DEDUP_PATH", "./data/dedup.json").into(),
            outbox_path: var("HR_OUTBOX_PATH", "./data/outbox.jsonl").into(),
            lock_lease,
            evaluation_date,
            host: var("HR_HOST", "0.0.0.0"),
            port,
            log_level: std::env::var("HR_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
        })
    }

    fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    init_tracing(&settings.log_level);

    let engine = LifecycleEngine::new(
        ConfigLoader::load_with_env(&settings.config_dir)?.into_policy(),
    )?;

    match std::env::args().nth(1).as_deref() {
        Some("run") => run_once(&engine, &settings),
        Some("serve") => tokio::runtime::Runtime::new()?.block_on(serve(engine, &settings)),
        other => Err(format!(
            "unknown command {:?}; expected `run` or `serve`",
            other.unwrap_or("")
        )
        .into()),
    }
}

/// Executes one batch run against the file-backed stores.
fn run_once(engine: &LifecycleEngine, settings: &Settings) -> Result<(), BoxError> {
    let evaluation_date = settings
        .evaluation_date
        .unwrap_or_else(|| Utc::now().date_naive());

    let source = JsonFileRecordSource::new(&settings.snapshot_path);
    let mut store =
        JsonFileDedupStore::open_with_lease(&settings.dedup_path, settings.lock_lease)?;
    let mut sink = JsonLinesSink::new(&settings.outbox_path);

    let report = engine.run(&source, &mut store, &mut sink, evaluation_date)?;

    tracing::info!(
        run_id = %report.run_id,
        records_read = report.records_read,
        candidates = report.candidates,
        suppressed = report.suppressed,
        events = report.events.len(),
        outbox = %settings.outbox_path.display(),
        "Batch run finished"
    );
    Ok(())
}

/// Serves the preview API until Ctrl+C or SIGTERM.
async fn serve(engine: LifecycleEngine, settings: &Settings) -> Result<(), BoxError> {
    let app = create_router(AppState::new(engine));
    let addr: SocketAddr = settings.server_addr().parse()?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
