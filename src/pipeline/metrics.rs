// src/pipeline/metrics.rs
//
// Run counters for the zone pipeline. Logged as a summary at the end of a
// replay; cheap enough to bump on every detection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub detections_seen: Arc<AtomicU64>,
    pub detections_fed: Arc<AtomicU64>,
    pub heads_ups: Arc<AtomicU64>,
    pub alerts: Arc<AtomicU64>,
    pub tracks_evicted: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            detections_seen: Arc::new(AtomicU64::new(0)),
            detections_fed: Arc::new(AtomicU64::new(0)),
            heads_ups: Arc::new(AtomicU64::new(0)),
            alerts: Arc::new(AtomicU64::new(0)),
            tracks_evicted: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Detections processed per wall-clock second since construction.
    pub fn throughput(&self) -> f64 {
        let seen = self.detections_seen.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            seen as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self, active_tracks: usize) -> MetricsSummary {
        MetricsSummary {
            detections_seen: self.detections_seen.load(Ordering::Relaxed),
            detections_fed: self.detections_fed.load(Ordering::Relaxed),
            heads_ups: self.heads_ups.load(Ordering::Relaxed),
            alerts: self.alerts.load(Ordering::Relaxed),
            tracks_evicted: self.tracks_evicted.load(Ordering::Relaxed),
            active_tracks,
            throughput: self.throughput(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub detections_seen: u64,
    pub detections_fed: u64,
    pub heads_ups: u64,
    pub alerts: u64,
    pub tracks_evicted: u64,
    pub active_tracks: usize,
    pub throughput: f64,
    pub elapsed_secs: f64,
}
