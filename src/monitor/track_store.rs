// src/monitor/track_store.rs
//
// Per-track bookkeeping for one zone monitor. Entries are created lazily on
// the first observation of a track id and are only removed through the
// explicit eviction calls; a tracker that drops an id leaves its state here
// until someone sweeps it.

use std::collections::HashMap;
use tracing::debug;

use crate::types::{TrackId, ZoneState};

/// Frame rate assumed when the caller's fps hint is unusable (≤ 0, NaN, ∞).
pub const DEFAULT_FPS: f64 = 30.0;

/// Length of one frame at `fps_hint`, falling back to [`DEFAULT_FPS`].
pub fn frame_period(fps_hint: f64) -> f64 {
    if fps_hint.is_finite() && fps_hint > 0.0 {
        1.0 / fps_hint
    } else {
        1.0 / DEFAULT_FPS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackState {
    pub last_state: ZoneState,
    /// Timestamp of the most recent update; `None` until the first one.
    pub last_observed: Option<f64>,
    /// Accumulated seconds in a risk condition. Never negative.
    pub risk_dwell_seconds: f64,
    /// Absolute time before which ALERT re-firing is suppressed.
    pub cooldown_until: f64,
    /// Set once a notice has gone out for the current climb above the
    /// heads-up threshold; cleared when dwell falls back below it.
    pub heads_up_sent: bool,
}

impl Default for TrackState {
    fn default() -> Self {
        Self {
            last_state: ZoneState::Safe,
            last_observed: None,
            risk_dwell_seconds: 0.0,
            cooldown_until: 0.0,
            heads_up_sent: false,
        }
    }
}

impl TrackState {
    /// Record an observation at `now` and return the elapsed time since the
    /// previous one, floored to a single frame period. Duplicate or
    /// out-of-order timestamps therefore count as one frame, never negative.
    pub fn advance(&mut self, now: f64, fps_hint: f64) -> f64 {
        let floor = frame_period(fps_hint);
        let dt = match self.last_observed {
            // f64::max drops a NaN delta in favour of the floor
            Some(prev) => (now - prev).max(floor),
            None => floor,
        };
        self.last_observed = Some(now);
        dt
    }

    pub fn add_dwell(&mut self, dt: f64) {
        self.risk_dwell_seconds += dt;
    }

    /// Decay dwell at half the rate it accumulates, clamped at zero.
    pub fn decay_dwell(&mut self, dt: f64) {
        self.risk_dwell_seconds = (self.risk_dwell_seconds - dt * 0.5).max(0.0);
    }

    pub fn reset_dwell(&mut self) {
        self.risk_dwell_seconds = 0.0;
    }

    pub fn in_cooldown(&self, now: f64) -> bool {
        now < self.cooldown_until
    }

    /// Extend the cooldown window. Never moves it backwards, so a replayed
    /// (earlier) timestamp cannot shorten a window already granted.
    pub fn start_cooldown(&mut self, now: f64, cooldown_sec: f64) {
        self.cooldown_until = self.cooldown_until.max(now + cooldown_sec);
    }

    /// Seconds since the last observation, or `None` if never observed.
    pub fn idle_for(&self, now: f64) -> Option<f64> {
        self.last_observed.map(|t| now - t)
    }
}

#[derive(Debug, Default)]
pub struct TrackStore {
    tracks: HashMap<TrackId, TrackState>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, track_id: TrackId) -> &mut TrackState {
        self.tracks.entry(track_id).or_insert_with(|| {
            debug!("🆕 Track {} first seen", track_id);
            TrackState::default()
        })
    }

    pub fn get(&self, track_id: TrackId) -> Option<&TrackState> {
        self.tracks.get(&track_id)
    }

    pub fn remove(&mut self, track_id: TrackId) -> Option<TrackState> {
        self.tracks.remove(&track_id)
    }

    /// Drop every track whose last observation is more than `max_idle_sec`
    /// before `now`. Returns the evicted ids in ascending order.
    pub fn evict_idle(&mut self, now: f64, max_idle_sec: f64) -> Vec<TrackId> {
        let mut evicted: Vec<TrackId> = self
            .tracks
            .iter()
            .filter(|(_, st)| st.idle_for(now).is_some_and(|idle| idle > max_idle_sec))
            .map(|(id, _)| *id)
            .collect();
        evicted.sort_unstable();

        for id in &evicted {
            self.tracks.remove(id);
            debug!("🗑️  Track {} evicted (idle > {:.1}s)", id, max_idle_sec);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackId, &TrackState)> {
        self.tracks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_period_fallback() {
        assert!((frame_period(10.0) - 0.1).abs() < 1e-12);
        assert!((frame_period(0.0) - 1.0 / DEFAULT_FPS).abs() < 1e-12);
        assert!((frame_period(-5.0) - 1.0 / DEFAULT_FPS).abs() < 1e-12);
        assert!((frame_period(f64::NAN) - 1.0 / DEFAULT_FPS).abs() < 1e-12);
    }

    #[test]
    fn test_advance_floors_to_one_frame() {
        let mut st = TrackState::default();

        // First observation has no predecessor
        assert!((st.advance(5.0, 10.0) - 0.1).abs() < 1e-12);
        // Normal gap
        assert!((st.advance(5.5, 10.0) - 0.5).abs() < 1e-12);
        // Duplicate timestamp
        assert!((st.advance(5.5, 10.0) - 0.1).abs() < 1e-12);
        // Out of order
        assert!((st.advance(4.0, 10.0) - 0.1).abs() < 1e-12);
        assert_eq!(st.last_observed, Some(4.0));
    }

    #[test]
    fn test_decay_never_negative() {
        let mut st = TrackState::default();
        st.add_dwell(0.1);
        st.decay_dwell(0.1);
        assert!((st.risk_dwell_seconds - 0.05).abs() < 1e-12);
        st.decay_dwell(1.0);
        assert_eq!(st.risk_dwell_seconds, 0.0);
    }

    #[test]
    fn test_cooldown_never_moves_backwards() {
        let mut st = TrackState::default();
        st.start_cooldown(100.0, 45.0);
        assert_eq!(st.cooldown_until, 145.0);
        st.start_cooldown(50.0, 45.0);
        assert_eq!(st.cooldown_until, 145.0);
        assert!(st.in_cooldown(144.9));
        assert!(!st.in_cooldown(145.0));
    }

    #[test]
    fn test_store_creates_once_per_id() {
        let mut store = TrackStore::new();
        store.get_or_create(7).add_dwell(1.0);
        store.get_or_create(7).add_dwell(1.0);
        store.get_or_create(9);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(7).map(|s| s.risk_dwell_seconds), Some(2.0));
        assert!(store.get(8).is_none());
    }

    #[test]
    fn test_evict_idle() {
        let mut store = TrackStore::new();
        store.get_or_create(1).advance(0.0, 30.0);
        store.get_or_create(2).advance(50.0, 30.0);
        store.get_or_create(3).advance(10.0, 30.0);

        let evicted = store.evict_idle(70.0, 30.0);
        assert_eq!(evicted, vec![1, 3]);
        assert_eq!(store.len(), 1);
        assert!(store.get(2).is_some());

        assert!(store.remove(2).is_some());
        assert!(store.is_empty());
    }
}
