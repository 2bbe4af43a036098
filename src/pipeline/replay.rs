// src/pipeline/replay.rs
//
// Drives a zone monitor from tracked detections, one per line of JSON.
//
//   Detection (JSONL) → person-class filter → bottom-center of bbox
//     → AnyMonitor (hysteresis | simple) → ZoneEvent → AlertBus
//
// The detection timestamp is the only clock the monitor sees, so replaying
// a recording yields the same events every time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use super::event_bus::{AlertBus, ZoneEvent};
use super::metrics::{MetricsSummary, PipelineMetrics};
use crate::geometry::Point;
use crate::monitor::{HysteresisMonitor, SimpleZoneMonitor};
use crate::types::{AlertKind, BoundingBox, Config, PolicyKind, TrackId, ZoneState};

/// Minimum spacing (s) between idle-track sweeps.
const EVICTION_SWEEP_SEC: f64 = 1.0;
const ALERT_BUS_CAPACITY: usize = 256;

/// One tracked object on one frame, as exported by the detector/tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub frame_id: u64,
    /// Seconds on the stream's clock.
    pub timestamp: f64,
    pub track_id: TrackId,
    #[serde(default)]
    pub class_id: u32,
    pub bbox: BoundingBox,
}

/// Parse JSON-lines detections. Blank lines and `#` comments are skipped.
pub fn read_detections<R: BufRead>(reader: R) -> Result<Vec<Detection>> {
    let mut detections = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let det: Detection = serde_json::from_str(trimmed)
            .with_context(|| format!("Malformed detection on line {}", idx + 1))?;
        detections.push(det);
    }
    Ok(detections)
}

pub fn load_detections(path: impl AsRef<Path>) -> Result<Vec<Detection>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open detections {}", path.display()))?;
    let detections = read_detections(BufReader::new(file))?;
    info!(
        "Loaded {} detections from {}",
        detections.len(),
        path.display()
    );
    Ok(detections)
}

/// Policy-independent view of a fired event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub kind: AlertKind,
    pub state: Option<ZoneState>,
    pub dwell_seconds: Option<f64>,
    pub in_cooldown: bool,
}

/// Runtime choice between the two monitor policies.
pub enum AnyMonitor {
    Hysteresis(HysteresisMonitor),
    Simple(SimpleZoneMonitor),
}

impl AnyMonitor {
    pub fn from_config(config: &Config, policy: PolicyKind) -> Result<Self> {
        Ok(match policy {
            PolicyKind::Hysteresis => Self::Hysteresis(HysteresisMonitor::new(config.hysteresis_zone()?)),
            PolicyKind::Simple => Self::Simple(SimpleZoneMonitor::new(config.simple_zone()?)),
        })
    }

    pub fn policy(&self) -> PolicyKind {
        match self {
            Self::Hysteresis(_) => PolicyKind::Hysteresis,
            Self::Simple(_) => PolicyKind::Simple,
        }
    }

    pub fn update(
        &mut self,
        track_id: TrackId,
        bottom_center: Point,
        bbox_wh: (f64, f64),
        now: f64,
        fps_hint: f64,
    ) -> Option<Verdict> {
        match self {
            Self::Hysteresis(m) => m
                .update(track_id, bottom_center, bbox_wh, now, fps_hint)
                .map(|ev| Verdict {
                    kind: ev.kind,
                    state: Some(ev.state),
                    dwell_seconds: Some(ev.dwell_seconds),
                    in_cooldown: ev.in_cooldown,
                }),
            Self::Simple(m) => m
                .update(track_id, bottom_center, bbox_wh, now, fps_hint)
                .map(|kind| Verdict {
                    kind,
                    state: None,
                    dwell_seconds: None,
                    in_cooldown: false,
                }),
        }
    }

    pub fn evict_idle(&mut self, now: f64, max_idle_sec: f64) -> Vec<TrackId> {
        match self {
            Self::Hysteresis(m) => m.evict_idle(now, max_idle_sec),
            Self::Simple(m) => m.evict_idle(now, max_idle_sec),
        }
    }

    pub fn track_count(&self) -> usize {
        match self {
            Self::Hysteresis(m) => m.track_count(),
            Self::Simple(m) => m.track_count(),
        }
    }
}

pub struct ZonePipeline {
    camera_id: String,
    person_class_id: u32,
    fps_hint: f64,
    track_ttl_sec: Option<f64>,
    last_sweep: Option<f64>,
    monitor: AnyMonitor,
    bus: AlertBus,
    metrics: PipelineMetrics,
}

impl ZonePipeline {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_policy(config, config.policy)
    }

    pub fn with_policy(config: &Config, policy: PolicyKind) -> Result<Self> {
        let monitor = AnyMonitor::from_config(config, policy)
            .with_context(|| format!("Failed to build {} monitor", policy.as_str()))?;
        Ok(Self {
            camera_id: config.camera_id.clone(),
            person_class_id: config.person_class_id,
            fps_hint: config.fps,
            track_ttl_sec: config.track_ttl_sec,
            last_sweep: None,
            monitor,
            bus: AlertBus::new(ALERT_BUS_CAPACITY),
            metrics: PipelineMetrics::new(),
        })
    }

    /// Override the zone file's frame rate (e.g. with the probed stream rate).
    pub fn with_fps_hint(mut self, fps_hint: f64) -> Self {
        self.fps_hint = fps_hint;
        self
    }

    /// Feed one detection. Returns the event it fired, if any; the same
    /// event is also queued on the alert bus.
    pub fn process(&mut self, det: &Detection) -> Option<ZoneEvent> {
        self.metrics.inc(&self.metrics.detections_seen);
        if det.class_id != self.person_class_id {
            return None;
        }

        self.sweep_idle(det.timestamp);
        self.metrics.inc(&self.metrics.detections_fed);

        let bottom_center = det.bbox.bottom_center();
        let verdict = self.monitor.update(
            det.track_id,
            bottom_center,
            det.bbox.size(),
            det.timestamp,
            self.fps_hint,
        )?;

        match verdict.kind {
            AlertKind::HeadsUp => self.metrics.inc(&self.metrics.heads_ups),
            AlertKind::Alert => self.metrics.inc(&self.metrics.alerts),
        }

        let event = ZoneEvent {
            camera_id: self.camera_id.clone(),
            track_id: det.track_id,
            frame_id: det.frame_id,
            timestamp: det.timestamp,
            kind: verdict.kind,
            state: verdict.state,
            dwell_seconds: verdict.dwell_seconds,
            in_cooldown: verdict.in_cooldown,
            bottom_center,
        };
        self.bus.publish(event.clone());
        Some(event)
    }

    pub fn process_all<'a>(&mut self, detections: impl IntoIterator<Item = &'a Detection>) -> usize {
        detections
            .into_iter()
            .filter(|det| self.process(det).is_some())
            .count()
    }

    fn sweep_idle(&mut self, now: f64) {
        let Some(ttl) = self.track_ttl_sec else {
            return;
        };
        let due = match self.last_sweep {
            Some(last) => now - last >= EVICTION_SWEEP_SEC || now < last,
            None => true,
        };
        if !due {
            return;
        }

        let evicted = self.monitor.evict_idle(now, ttl);
        if !evicted.is_empty() {
            debug!("Evicted {} idle track(s): {:?}", evicted.len(), evicted);
            self.metrics
                .add(&self.metrics.tracks_evicted, evicted.len() as u64);
        }
        self.last_sweep = Some(now);
    }

    pub fn drain_events(&mut self) -> Vec<ZoneEvent> {
        self.bus.drain()
    }

    pub fn pending_events(&self) -> usize {
        self.bus.pending_count()
    }

    pub fn monitor(&self) -> &AnyMonitor {
        &self.monitor
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn summary(&self) -> MetricsSummary {
        self.metrics.summary(self.monitor.track_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ZONES: &str = r#"
camera_id: cam07
fps: 10
person_class_id: 0
bed_polygon: [[100, 100], [300, 100], [300, 300], [100, 300]]
thresholds:
  t1_heads_up: 0.95
  t2_alert: 1.95
  cooldown_sec: 30
simple_thresholds:
  t_alert: 0.95
  cooldown_sec: 30
"#;

    /// Person whose feet sit 10px left of the bed.
    fn off_bed(frame_id: u64, track_id: TrackId) -> Detection {
        Detection {
            frame_id,
            timestamp: frame_id as f64 / 10.0,
            track_id,
            class_id: 0,
            bbox: BoundingBox {
                left: 65.0,
                top: 140.0,
                width: 50.0,
                height: 60.0,
            },
        }
    }

    #[test]
    fn test_bottom_center_feeds_monitor() {
        let det = off_bed(0, 1);
        assert_eq!(det.bbox.bottom_center(), Point::new(90.0, 200.0));
    }

    #[test]
    fn test_hysteresis_pipeline_emits_heads_up_then_alert() {
        let cfg = Config::from_yaml_str(ZONES).unwrap();
        let mut pipeline = ZonePipeline::new(&cfg).unwrap();
        assert_eq!(pipeline.monitor().policy(), PolicyKind::Hysteresis);

        let dets: Vec<Detection> = (0..30).map(|f| off_bed(f, 4)).collect();
        assert_eq!(pipeline.process_all(&dets), 2);

        let events = pipeline.drain_events();
        let kinds: Vec<AlertKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![AlertKind::HeadsUp, AlertKind::Alert]);
        assert_eq!(events[1].camera_id, "cam07");
        assert_eq!(events[1].frame_id, 19);
        assert_eq!(events[1].state, Some(ZoneState::Prefall));
        assert!(events[1].dwell_seconds.unwrap() >= 1.95);

        let summary = pipeline.summary();
        assert_eq!(summary.detections_fed, 30);
        assert_eq!(summary.heads_ups, 1);
        assert_eq!(summary.alerts, 1);
        assert_eq!(summary.active_tracks, 1);
    }

    #[test]
    fn test_simple_pipeline_and_class_filter() {
        let cfg = Config::from_yaml_str(ZONES).unwrap();
        let mut pipeline = ZonePipeline::with_policy(&cfg, PolicyKind::Simple).unwrap();

        let mut dets: Vec<Detection> = (0..15).map(|f| off_bed(f, 1)).collect();
        // A non-person object parked off the bed is ignored
        dets.extend((0..15).map(|f| Detection {
            class_id: 2,
            ..off_bed(f, 99)
        }));

        assert_eq!(pipeline.process_all(&dets), 1);
        let events = pipeline.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AlertKind::Alert);
        assert_eq!(events[0].track_id, 1);
        assert_eq!(events[0].state, None);

        let summary = pipeline.summary();
        assert_eq!(summary.detections_seen, 30);
        assert_eq!(summary.detections_fed, 15);
        assert_eq!(summary.active_tracks, 1);
    }

    #[test]
    fn test_idle_tracks_are_swept() {
        let mut cfg = Config::from_yaml_str(ZONES).unwrap();
        cfg.track_ttl_sec = Some(5.0);
        let mut pipeline = ZonePipeline::new(&cfg).unwrap();

        pipeline.process(&off_bed(0, 1));
        pipeline.process(&off_bed(0, 2));
        // Only track 2 keeps reporting
        for f in (10..=100).step_by(10) {
            pipeline.process(&off_bed(f, 2));
        }

        assert_eq!(pipeline.monitor().track_count(), 1);
        assert_eq!(pipeline.summary().tracks_evicted, 1);
    }

    #[test]
    fn test_read_detections_skips_comments() {
        let input = r#"
# recorded from cam07
{"frame_id": 0, "timestamp": 0.0, "track_id": 3, "bbox": {"left": 1, "top": 2, "width": 3, "height": 4}}

{"frame_id": 1, "timestamp": 0.1, "track_id": 3, "class_id": 5, "bbox": {"left": 1, "top": 2, "width": 3, "height": 4}}
"#;
        let dets = read_detections(Cursor::new(input)).unwrap();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].class_id, 0);
        assert_eq!(dets[1].class_id, 5);
        assert_eq!(dets[1].bbox.size(), (3.0, 4.0));
    }

    #[test]
    fn test_read_detections_reports_line() {
        let input = "{\"frame_id\": 0, \"timestamp\": 0.0, \"track_id\": 1, \"bbox\": {\"left\": 0, \"top\": 0, \"width\": 1, \"height\": 1}}\nnot json\n";
        let err = read_detections(Cursor::new(input)).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}
