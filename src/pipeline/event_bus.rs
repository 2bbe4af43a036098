// src/pipeline/event_bus.rs
//
// Decoupled alert delivery. The zone pipeline publishes events here and the
// sinks (console, JSONL) drain them, so neither side reaches into the other.

use serde::Serialize;
use std::collections::VecDeque;
use tracing::warn;

use crate::geometry::Point;
use crate::types::{AlertKind, TrackId, ZoneState};

/// One fired alert, in the form handed to output sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneEvent {
    pub camera_id: String,
    pub track_id: TrackId,
    pub frame_id: u64,
    pub timestamp: f64,
    pub kind: AlertKind,
    /// Only the hysteresis policy reports a state label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ZoneState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dwell_seconds: Option<f64>,
    pub in_cooldown: bool,
    pub bottom_center: Point,
}

pub struct AlertBus {
    events: VecDeque<ZoneEvent>,
    max_pending: usize,
}

impl AlertBus {
    pub fn new(max_pending: usize) -> Self {
        let max_pending = max_pending.max(1);
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
        }
    }

    pub fn publish(&mut self, event: ZoneEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Alert bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<ZoneEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(track_id: TrackId) -> ZoneEvent {
        ZoneEvent {
            camera_id: "cam01".to_string(),
            track_id,
            frame_id: track_id * 10,
            timestamp: track_id as f64,
            kind: AlertKind::Alert,
            state: None,
            dwell_seconds: None,
            in_cooldown: false,
            bottom_center: Point::new(0.0, 0.0),
        }
    }

    #[test]
    fn test_bus_drops_oldest_when_full() {
        let mut bus = AlertBus::new(2);
        bus.publish(event(1));
        bus.publish(event(2));
        bus.publish(event(3));
        assert_eq!(bus.pending_count(), 2);

        let drained: Vec<TrackId> = bus.drain().iter().map(|e| e.track_id).collect();
        assert_eq!(drained, vec![2, 3]);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_event_json_shape() {
        let mut ev = event(4);
        ev.state = Some(ZoneState::Prefall);
        ev.kind = AlertKind::HeadsUp;
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["kind"], "HEADS_UP");
        assert_eq!(json["state"], "PREFALL");
        assert!(json.get("dwell_seconds").is_none());
        assert_eq!(json["bottom_center"]["x"], 0.0);
    }
}
