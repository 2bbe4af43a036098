// src/monitor/simple.rs
//
// Single-tier dwell policy: one risk condition (outside the bed or within
// `d2_edge` of its boundary), one event (ALERT).
//
// Unlike the hysteresis policy, firing resets dwell to zero, so a second
// ALERT needs both the cooldown to expire and a fresh `t_alert` of dwell.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ensure_positive, Observation, Thresholds, TrackState, ZoneConfig, ZonePolicy};
use crate::geometry::{distance_to_polygon_boundary, point_in_polygon, Point};
use crate::types::{AlertKind, ZoneState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleThresholds {
    /// Near-edge distance (px).
    pub d2_edge: f64,
    /// Seconds in the pre-fall zone before ALERT.
    #[serde(alias = "T_alert")]
    pub t_alert: f64,
    /// Seconds to suppress repeats after an ALERT.
    pub cooldown_sec: f64,
}

impl Default for SimpleThresholds {
    fn default() -> Self {
        Self {
            d2_edge: 45.0,
            t_alert: 10.0,
            cooldown_sec: 30.0,
        }
    }
}

impl Thresholds for SimpleThresholds {
    fn validate(&self) -> Result<()> {
        ensure_positive("d2_edge", self.d2_edge)?;
        ensure_positive("t_alert", self.t_alert)?;
        ensure_positive("cooldown_sec", self.cooldown_sec)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleDwellPolicy;

impl SimpleDwellPolicy {
    /// Outside the bed, or inside but closer than `d2_edge` to its edge.
    pub fn in_prefall(p: Point, polygon: &[Point], d2_edge: f64) -> bool {
        if !point_in_polygon(p, polygon) {
            return true;
        }
        distance_to_polygon_boundary(p, polygon) < d2_edge
    }
}

impl ZonePolicy for SimpleDwellPolicy {
    type Thresholds = SimpleThresholds;
    type Output = AlertKind;

    fn name(&self) -> &'static str {
        "simple"
    }

    fn evaluate(
        &self,
        config: &ZoneConfig<SimpleThresholds>,
        track: &mut TrackState,
        obs: &Observation,
    ) -> Option<AlertKind> {
        let th = config.thresholds();

        if !Self::in_prefall(obs.bottom_center, config.bed_polygon(), th.d2_edge) {
            track.last_state = ZoneState::Safe;
            track.decay_dwell(obs.dt);
            return None;
        }

        track.last_state = ZoneState::Prefall;
        track.add_dwell(obs.dt);

        if track.in_cooldown(obs.now) || track.risk_dwell_seconds < th.t_alert {
            return None;
        }

        warn!(
            "🚨 Track {} ALERT at {:.2}s: dwell={:.1}s, next possible after {:.2}s",
            obs.track_id,
            obs.now,
            track.risk_dwell_seconds,
            obs.now + th.cooldown_sec
        );
        track.start_cooldown(obs.now, th.cooldown_sec);
        track.reset_dwell();
        Some(AlertKind::Alert)
    }
}
