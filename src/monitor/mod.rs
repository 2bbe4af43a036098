// src/monitor/mod.rs
//
// Zone dwell-time monitor.
//
// Signal flow (per update):
//   (track_id, bottom_center, bbox_wh, now, fps_hint)
//     → TrackStore lookup/create → dt since last observation
//     → ZonePolicy (hysteresis | simple) → Option<event>
//
// The monitor is generic over the policy so both variants share the same
// config/state shapes while keeping their own reset and cooldown rules.

mod hysteresis;
mod simple;
mod track_store;

pub use hysteresis::{HysteresisEvent, HysteresisPolicy, HysteresisThresholds};
pub use simple::{SimpleDwellPolicy, SimpleThresholds};
pub use track_store::{frame_period, TrackState, TrackStore, DEFAULT_FPS};

use anyhow::{ensure, Context, Result};
use tracing::{debug, info};

use crate::geometry::{polygon_area, validate_polygon, Point};
use crate::types::TrackId;

pub type HysteresisMonitor = ZoneMonitor<HysteresisPolicy>;
pub type SimpleZoneMonitor = ZoneMonitor<SimpleDwellPolicy>;

/// A policy-specific threshold record that can check itself.
pub trait Thresholds {
    fn validate(&self) -> Result<()>;
}

/// Shared guard for threshold fields: finite and strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "threshold `{}` must be a positive number, got {}",
        name,
        value
    );
    Ok(())
}

/// Monitored polygon plus thresholds. Validated once at construction and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ZoneConfig<T> {
    bed_polygon: Vec<Point>,
    thresholds: T,
}

impl<T: Thresholds> ZoneConfig<T> {
    pub fn new(bed_polygon: Vec<Point>, thresholds: T) -> Result<Self> {
        validate_polygon(&bed_polygon).context("invalid zone polygon")?;
        thresholds.validate().context("invalid zone thresholds")?;
        Ok(Self {
            bed_polygon,
            thresholds,
        })
    }
}

impl<T> ZoneConfig<T> {
    pub fn bed_polygon(&self) -> &[Point] {
        &self.bed_polygon
    }

    pub fn thresholds(&self) -> &T {
        &self.thresholds
    }
}

/// One position update after the monitor has resolved timing.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    pub track_id: TrackId,
    pub bottom_center: Point,
    /// Bounding box (width, height) in pixels.
    pub bbox_wh: (f64, f64),
    pub now: f64,
    /// Elapsed seconds since the track's previous observation, ≥ one frame.
    pub dt: f64,
}

/// Stateless transition rule applied to one track per update.
pub trait ZonePolicy {
    type Thresholds: Thresholds;
    type Output;

    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        config: &ZoneConfig<Self::Thresholds>,
        track: &mut TrackState,
        obs: &Observation,
    ) -> Option<Self::Output>;
}

pub struct ZoneMonitor<P: ZonePolicy> {
    config: ZoneConfig<P::Thresholds>,
    policy: P,
    tracks: TrackStore,
}

impl<P: ZonePolicy + Default> ZoneMonitor<P> {
    pub fn new(config: ZoneConfig<P::Thresholds>) -> Self {
        Self::with_policy(config, P::default())
    }
}

impl<P: ZonePolicy> ZoneMonitor<P> {
    pub fn with_policy(config: ZoneConfig<P::Thresholds>, policy: P) -> Self {
        info!(
            "✓ Zone monitor ready: policy={}, polygon={} vertices, area={:.0}px²",
            policy.name(),
            config.bed_polygon().len(),
            polygon_area(config.bed_polygon())
        );
        Self {
            config,
            policy,
            tracks: TrackStore::new(),
        }
    }

    /// Feed one position update for `track_id`.
    ///
    /// Updates for the same track must arrive in non-decreasing `now` order;
    /// anything else is tolerated but counts as a single frame of elapsed time.
    pub fn update(
        &mut self,
        track_id: TrackId,
        bottom_center: Point,
        bbox_wh: (f64, f64),
        now: f64,
        fps_hint: f64,
    ) -> Option<P::Output> {
        let track = self.tracks.get_or_create(track_id);
        let dt = track.advance(now, fps_hint);

        let obs = Observation {
            track_id,
            bottom_center,
            bbox_wh,
            now,
            dt,
        };
        let output = self.policy.evaluate(&self.config, track, &obs);

        debug!(
            "Track {} @ {:.2}s: state={} dwell={:.2}s dt={:.3}",
            track_id,
            now,
            track.last_state.as_str(),
            track.risk_dwell_seconds,
            dt
        );
        output
    }

    pub fn config(&self) -> &ZoneConfig<P::Thresholds> {
        &self.config
    }

    pub fn track(&self, track_id: TrackId) -> Option<&TrackState> {
        self.tracks.get(track_id)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn remove_track(&mut self, track_id: TrackId) -> Option<TrackState> {
        self.tracks.remove(track_id)
    }

    /// Forget tracks not observed for more than `max_idle_sec`.
    pub fn evict_idle(&mut self, now: f64, max_idle_sec: f64) -> Vec<TrackId> {
        self.tracks.evict_idle(now, max_idle_sec)
    }

    pub fn reset(&mut self) {
        self.tracks.clear();
    }
}
