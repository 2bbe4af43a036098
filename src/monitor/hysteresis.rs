// src/monitor/hysteresis.rs
//
// Two-tier policy: SAFE / PREFALL states, HEADS_UP and ALERT events.
//
// A short excursion past the bed edge only produces a HEADS_UP; sustained
// dwell escalates to ALERT, which opens a cooldown window. Inside that window
// ALERT is suppressed but HEADS_UP can still go out, so the operator keeps
// hearing about a new excursion without an alert storm.
//
// HEADS_UP is edge-triggered: it fires on the update where dwell climbs past
// T1 and re-arms only after dwell drops back below T1 (safe reset or decay).

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ensure_positive, Observation, Thresholds, TrackState, ZoneConfig, ZonePolicy};
use crate::geometry::{distance_to_polygon_boundary, point_in_polygon};
use crate::types::{AlertKind, ZoneState};

/// Widths at or below this are treated as a collapsed bbox.
const MIN_BBOX_WIDTH: f64 = 1e-6;
/// Aspect ratio reported for a collapsed bbox; reads as "lying down".
const ASPECT_SENTINEL: f64 = 10.0;
/// Upright posture required for the fully-safe condition (h / w).
const SAFE_ASPECT_MAX: f64 = 1.8;
/// Posture at or above this counts toward pre-fall near the safe band.
const LYING_ASPECT_MIN: f64 = 2.2;
/// Extra margin (px) beyond `d1_safe_min` in which posture alone is risky.
const LYING_EDGE_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisThresholds {
    /// Minimum boundary distance (px) to qualify as fully safe.
    pub d1_safe_min: f64,
    /// Boundary distance (px) below which a point is near-edge.
    pub d2_edge: f64,
    /// Seconds of risk dwell before HEADS_UP.
    #[serde(alias = "T1_heads_up")]
    pub t1_heads_up: f64,
    /// Seconds of risk dwell before ALERT.
    #[serde(alias = "T2_alert")]
    pub t2_alert: f64,
    /// Seconds an ALERT suppresses the next ALERT.
    pub cooldown_sec: f64,
}

impl Default for HysteresisThresholds {
    fn default() -> Self {
        Self {
            d1_safe_min: 60.0,
            d2_edge: 45.0,
            t1_heads_up: 8.0,
            t2_alert: 18.0,
            cooldown_sec: 45.0,
        }
    }
}

impl Thresholds for HysteresisThresholds {
    fn validate(&self) -> Result<()> {
        ensure_positive("d1_safe_min", self.d1_safe_min)?;
        ensure_positive("d2_edge", self.d2_edge)?;
        ensure_positive("t1_heads_up", self.t1_heads_up)?;
        ensure_positive("t2_alert", self.t2_alert)?;
        ensure_positive("cooldown_sec", self.cooldown_sec)?;
        ensure!(
            self.t1_heads_up <= self.t2_alert,
            "t1_heads_up ({}) must not exceed t2_alert ({})",
            self.t1_heads_up,
            self.t2_alert
        );
        Ok(())
    }
}

/// Emitted when an update fires an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HysteresisEvent {
    pub state: ZoneState,
    pub kind: AlertKind,
    /// Risk dwell at the moment the event fired.
    pub dwell_seconds: f64,
    /// Whether an earlier ALERT's cooldown was still running.
    pub in_cooldown: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HysteresisPolicy;

fn aspect_ratio((w, h): (f64, f64)) -> f64 {
    if w > MIN_BBOX_WIDTH {
        h / w
    } else {
        ASPECT_SENTINEL
    }
}

impl ZonePolicy for HysteresisPolicy {
    type Thresholds = HysteresisThresholds;
    type Output = HysteresisEvent;

    fn name(&self) -> &'static str {
        "hysteresis"
    }

    fn evaluate(
        &self,
        config: &ZoneConfig<HysteresisThresholds>,
        track: &mut TrackState,
        obs: &Observation,
    ) -> Option<HysteresisEvent> {
        let th = config.thresholds();
        let polygon = config.bed_polygon();

        let aspect = aspect_ratio(obs.bbox_wh);
        let inside = point_in_polygon(obs.bottom_center, polygon);
        let edge_dist = distance_to_polygon_boundary(obs.bottom_center, polygon);

        let in_safe = inside && edge_dist >= th.d1_safe_min && aspect < SAFE_ASPECT_MAX;
        let prefall = !inside
            || edge_dist < th.d2_edge
            || (aspect >= LYING_ASPECT_MIN && edge_dist < th.d1_safe_min + LYING_EDGE_MARGIN);

        let mut kind = None;
        let mut in_cooldown = false;

        if in_safe {
            track.last_state = ZoneState::Safe;
            track.reset_dwell();
        } else if prefall {
            track.last_state = ZoneState::Prefall;
            track.add_dwell(obs.dt);
            let dwell = track.risk_dwell_seconds;
            in_cooldown = track.in_cooldown(obs.now);

            if in_cooldown {
                if dwell >= th.t1_heads_up && !track.heads_up_sent {
                    kind = Some(AlertKind::HeadsUp);
                }
            } else if dwell >= th.t2_alert {
                track.start_cooldown(obs.now, th.cooldown_sec);
                kind = Some(AlertKind::Alert);
            } else if dwell >= th.t1_heads_up && !track.heads_up_sent {
                kind = Some(AlertKind::HeadsUp);
            }
        } else {
            // Ambiguous band: keep the label, bleed off dwell
            track.decay_dwell(obs.dt);
        }

        if kind.is_some() {
            track.heads_up_sent = true;
        } else if track.risk_dwell_seconds < th.t1_heads_up {
            track.heads_up_sent = false;
        }

        let kind = kind?;
        let dwell_seconds = track.risk_dwell_seconds;
        match kind {
            AlertKind::Alert => warn!(
                "🚨 Track {} ALERT at {:.2}s: dwell={:.1}s, edge_dist={:.1}px, cooldown until {:.2}s",
                obs.track_id, obs.now, dwell_seconds, edge_dist, track.cooldown_until
            ),
            AlertKind::HeadsUp => info!(
                "🟡 Track {} HEADS_UP at {:.2}s: dwell={:.1}s{}",
                obs.track_id,
                obs.now,
                dwell_seconds,
                if in_cooldown { " (cooldown)" } else { "" }
            ),
        }

        Some(HysteresisEvent {
            state: track.last_state,
            kind,
            dwell_seconds,
            in_cooldown,
        })
    }
}
