//! Bed-zone fall-risk monitor.
//!
//! Watches the ground-contact point (bottom-center of the bbox) of each
//! tracked person against a configured bed polygon, accumulates dwell time
//! in risky positions and emits discrete HEADS_UP / ALERT events.
//!
//! Two policies share one monitor shape:
//!
//! - [`monitor::HysteresisPolicy`]: SAFE / PREFALL states, posture signal,
//!   HEADS_UP then ALERT, cooldown suppresses only ALERT.
//! - [`monitor::SimpleDwellPolicy`]: single ALERT tier, dwell resets on fire.
//!
//! All time comes from the caller, so identical input sequences always
//! produce identical events.
//!
//! ```ignore
//! use bedwatch::geometry::Point;
//! use bedwatch::monitor::{HysteresisMonitor, HysteresisThresholds, ZoneConfig};
//!
//! let bed = vec![
//!     Point::new(100.0, 100.0),
//!     Point::new(300.0, 100.0),
//!     Point::new(300.0, 300.0),
//!     Point::new(100.0, 300.0),
//! ];
//! let mut monitor = HysteresisMonitor::new(ZoneConfig::new(bed, HysteresisThresholds::default())?);
//! if let Some(ev) = monitor.update(7, Point::new(90.0, 200.0), (50.0, 60.0), 12.4, 30.0) {
//!     println!("{} {}", ev.state.as_str(), ev.kind.as_str());
//! }
//! ```

pub mod config;
pub mod geometry;
pub mod monitor;
pub mod pipeline;
pub mod types;

pub use geometry::Point;
pub use monitor::{
    HysteresisEvent, HysteresisMonitor, HysteresisThresholds, SimpleThresholds, SimpleZoneMonitor,
    ZoneConfig, ZoneMonitor,
};
pub use types::{AlertKind, BoundingBox, Config, PolicyKind, TrackId, ZoneState};
