//! Focus Monitor Host
//!
//! Wires a capture device, the frame scorer, and the attention monitor
//! together, reports progress while running, and prints the session report
//! when the stream ends or the user interrupts it.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use attention::FrameScorer;
use camera_capture::ReplayCamera;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};
use session_tracker::{
    AttentionMonitor, MonitorConfig, MonitorError, ProgressReport, SessionRecord, SessionReport,
    SessionStatusPublisher, StatusSnapshot, SummarySink,
};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Host errors
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("No frame source configured (set frames_dir or pass --frames)")]
    NoFrameSource,

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),

    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Host configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Detection loop and scoring settings
    pub monitor: MonitorConfig,

    /// Directory of frames replayed as the camera
    pub frames_dir: Option<PathBuf>,

    /// Replay the frames forever instead of ending after the last one
    pub loop_frames: bool,

    pub log_format: LogFormat,

    /// Print Prometheus metrics when the session ends
    pub render_metrics: bool,
}

/// Load configuration from an optional file and `FOCUS_` environment variables.
///
/// Nested keys use `__`, e.g. `FOCUS_MONITOR__EVALUATIONS_PER_SECOND=5`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, HostError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("FOCUS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Initialize logging
pub fn init_logging(format: LogFormat) -> Result<(), HostError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true);

    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };
    result.map_err(|e| HostError::Logging(e.to_string()))
}

/// Install the Prometheus recorder; render the handle to get the exposition text
pub fn install_metrics() -> Result<PrometheusHandle, HostError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| HostError::Metrics(e.to_string()))
}

/// Prints each finished session as one JSON line on stdout
pub struct JsonLineSink;

impl SummarySink for JsonLineSink {
    fn deliver(&self, record: &SessionRecord) {
        match serde_json::to_string(record) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Could not serialize session {}: {}", record.session_id, e),
        }
    }
}

/// Build a monitor replaying `app.frames_dir` and run it until the stream
/// ends or Ctrl-C is pressed
pub async fn run(app: AppConfig) -> Result<Option<SessionRecord>, HostError> {
    let frames_dir = app.frames_dir.clone().ok_or(HostError::NoFrameSource)?;
    let camera = Arc::new(ReplayCamera::new(frames_dir).looping(app.loop_frames));
    let scorer = FrameScorer::with_blob_detectors(app.monitor.scoring.clone(), &app.monitor.detectors);
    let monitor = AttentionMonitor::new(app.monitor, camera, scorer).with_sink(Arc::new(JsonLineSink));

    run_monitor(&monitor, shutdown_signal()).await
}

/// Run one session on `monitor` until `shutdown` resolves or the run ends
pub async fn run_monitor(
    monitor: &AttentionMonitor,
    shutdown: impl Future<Output = ()>,
) -> Result<Option<SessionRecord>, HostError> {
    let session_id = monitor.start().await?;
    info!("Session {} started", session_id);

    let reporter = spawn_reporter(monitor.publisher(), monitor.config().report_interval());
    let mut updates = monitor.publisher().subscribe();

    tokio::select! {
        _ = shutdown => info!("Shutdown requested"),
        _ = wait_for_end(&mut updates) => info!("Capture ended"),
    }

    let record = monitor.stop().await;
    reporter.abort();

    let aggregate = monitor.snapshot().aggregate;
    println!("{}", SessionReport { aggregate: &aggregate });
    Ok(record)
}

/// Log a progress line every `period` while the run is active
fn spawn_reporter(publisher: Arc<SessionStatusPublisher>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let snapshot = publisher.read();
            if !snapshot.status.running {
                break;
            }
            info!(
                "{}",
                ProgressReport {
                    status: &snapshot.status,
                    aggregate: &snapshot.aggregate,
                }
            );
        }
    })
}

async fn wait_for_end(updates: &mut watch::Receiver<StatusSnapshot>) {
    loop {
        let running = updates.borrow_and_update().status.running;
        if !running || updates.changed().await.is_err() {
            return;
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
