use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::monitor::{HysteresisThresholds, SimpleThresholds};

/// Stable per-subject identifier handed out by the upstream tracker.
pub type TrackId = u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_camera_id")]
    pub camera_id: String,
    /// Nominal stream frame rate, used as the dt floor.
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default)]
    pub policy: PolicyKind,
    /// Detector class treated as a person.
    #[serde(default)]
    pub person_class_id: u32,
    /// Tracks idle longer than this are dropped. `None` keeps them forever.
    #[serde(default)]
    pub track_ttl_sec: Option<f64>,
    pub bed_polygon: Vec<(f64, f64)>,
    #[serde(default)]
    pub thresholds: HysteresisThresholds,
    #[serde(default)]
    pub simple_thresholds: SimpleThresholds,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_camera_id() -> String {
    "cam01".to_string()
}

fn default_fps() -> f64 {
    30.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Two-tier HEADS_UP / ALERT with posture signal
    #[default]
    Hysteresis,
    /// Single ALERT tier, dwell resets on fire
    Simple,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hysteresis => "hysteresis",
            Self::Simple => "simple",
        }
    }
}

/// Spatial classification of a track against the bed zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneState {
    Safe,
    Prefall,
}

impl ZoneState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Prefall => "PREFALL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    HeadsUp,
    Alert,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeadsUp => "HEADS_UP",
            Self::Alert => "ALERT",
        }
    }
}

/// Detector bounding box in frame pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Midpoint of the bottom edge, used as the ground-contact point.
    pub fn bottom_center(&self) -> Point {
        Point::new(self.left + self.width * 0.5, self.top + self.height)
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}
