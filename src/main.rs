// src/main.rs

use anyhow::Result;
use bedwatch::pipeline::{load_detections, log_event, JsonlSink, ZonePipeline};
use bedwatch::types::{Config, PolicyKind};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Replay tracked person detections through the bed-zone fall-risk monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Zone file (YAML): bed polygon, thresholds, policy
    #[arg(short, long)]
    zones: PathBuf,

    /// Tracked detections, one JSON object per line
    #[arg(short, long)]
    detections: PathBuf,

    /// Write fired events here as JSON lines
    #[arg(short, long)]
    events_out: Option<PathBuf>,

    /// Override the zone file's frame rate (dt floor)
    #[arg(long)]
    fps: Option<f64>,

    /// Override the zone file's policy
    #[arg(long, value_enum)]
    policy: Option<PolicyKind>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.zones)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bedwatch={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🛏️  Bed watch starting (camera {})", config.camera_id);

    let policy = args.policy.unwrap_or(config.policy);
    let mut pipeline = ZonePipeline::with_policy(&config, policy)?;
    if let Some(fps) = args.fps {
        if fps.is_finite() && fps > 0.0 {
            pipeline = pipeline.with_fps_hint(fps);
        } else {
            warn!("Ignoring --fps {}: must be positive", fps);
        }
    }

    let mut jsonl = match &args.events_out {
        Some(path) => Some(JsonlSink::create(path)?),
        None => None,
    };

    let detections = load_detections(&args.detections)?;
    for det in &detections {
        if pipeline.process(det).is_none() {
            continue;
        }
        for event in pipeline.drain_events() {
            log_event(&event);
            if let Some(sink) = jsonl.as_mut() {
                sink.write(&event)?;
            }
        }
    }

    let summary = pipeline.summary();
    info!("\n========================================");
    info!("  Detections: {} ({} person)", summary.detections_seen, summary.detections_fed);
    info!("  🟡 Heads-ups: {}", summary.heads_ups);
    if summary.alerts > 0 {
        warn!("  🚨 Alerts: {}", summary.alerts);
    } else {
        info!("  🚨 Alerts: 0");
    }
    info!(
        "  Tracks: {} active, {} evicted",
        summary.active_tracks, summary.tracks_evicted
    );
    info!("  Throughput: {:.0} detections/s", summary.throughput);
    if let (Some(sink), Some(path)) = (&jsonl, &args.events_out) {
        info!("  💾 {} event(s) written to {}", sink.written(), path.display());
    }
    info!("========================================");

    Ok(())
}
