//! Focus Monitor - Main Entry Point

use std::path::PathBuf;

use clap::Parser;
use focus_monitor::{init_logging, install_metrics, load_config, run, LogFormat};
use tracing::{info, warn};

/// Focus Monitor - webcam attention tracking
#[derive(Parser)]
#[command(name = "focus-monitor")]
#[command(version)]
#[command(about = "Score camera frames for attention and report focused time", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of frames to replay as the camera
    #[arg(short, long)]
    frames: Option<PathBuf>,

    /// Replay the frames forever
    #[arg(long = "loop")]
    loop_frames: bool,

    /// Frame evaluations per second
    #[arg(long)]
    rate: Option<f64>,

    /// Print Prometheus metrics when the session ends
    #[arg(long)]
    metrics: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut app = load_config(cli.config.as_deref())?;
    if let Some(frames) = cli.frames {
        app.frames_dir = Some(frames);
    }
    if let Some(rate) = cli.rate {
        app.monitor.evaluations_per_second = rate;
    }
    app.loop_frames |= cli.loop_frames;
    app.render_metrics |= cli.metrics;
    if cli.json_logs {
        app.log_format = LogFormat::Json;
    }

    init_logging(app.log_format)?;
    info!("=== Focus Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let metrics = if app.render_metrics {
        Some(install_metrics()?)
    } else {
        None
    };

    let record = run(app).await?;
    if record.is_none() {
        warn!("Session ended without a record");
    }

    if let Some(handle) = metrics {
        print!("{}", handle.render());
    }

    Ok(())
}
