// src/pipeline/sinks.rs

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

use super::event_bus::ZoneEvent;
use crate::types::AlertKind;

/// Console sink: one log line per event.
pub fn log_event(event: &ZoneEvent) {
    let dwell = event
        .dwell_seconds
        .map(|d| format!(" dwell={:.1}s", d))
        .unwrap_or_default();
    let cooldown = if event.in_cooldown { " (cooldown)" } else { "" };

    match event.kind {
        AlertKind::Alert => warn!(
            "[{}] 🚨 track {} ALERT at {:.2}s (frame {}) bc=({:.0}, {:.0}){}{}",
            event.camera_id,
            event.track_id,
            event.timestamp,
            event.frame_id,
            event.bottom_center.x,
            event.bottom_center.y,
            dwell,
            cooldown
        ),
        AlertKind::HeadsUp => info!(
            "[{}] 🟡 track {} HEADS_UP at {:.2}s (frame {}) bc=({:.0}, {:.0}){}{}",
            event.camera_id,
            event.track_id,
            event.timestamp,
            event.frame_id,
            event.bottom_center.x,
            event.bottom_center.y,
            dwell,
            cooldown
        ),
    }
}

/// Appends events as JSON lines.
pub struct JsonlSink<W: Write> {
    writer: W,
    written: usize,
}

impl JsonlSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn write(&mut self, event: &ZoneEvent) -> Result<()> {
        let json_line = serde_json::to_string(event)?;
        writeln!(self.writer, "{}", json_line)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::types::ZoneState;

    #[test]
    fn test_jsonl_sink_writes_one_line_per_event() {
        let event = ZoneEvent {
            camera_id: "cam01".to_string(),
            track_id: 12,
            frame_id: 180,
            timestamp: 18.0,
            kind: AlertKind::Alert,
            state: Some(ZoneState::Prefall),
            dwell_seconds: Some(18.0),
            in_cooldown: false,
            bottom_center: Point::new(90.0, 200.0),
        };

        let mut sink = JsonlSink::new(Vec::new());
        sink.write(&event).unwrap();
        sink.write(&event).unwrap();
        log_event(&event);
        assert_eq!(sink.written(), 2);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["track_id"], 12);
        assert_eq!(parsed["kind"], "ALERT");
        assert_eq!(parsed["state"], "PREFALL");
    }
}
