// src/pipeline/mod.rs

pub mod event_bus;
pub mod metrics;
pub mod replay;
pub mod sinks;

pub use event_bus::{AlertBus, ZoneEvent};
pub use metrics::{MetricsSummary, PipelineMetrics};
pub use replay::{load_detections, read_detections, AnyMonitor, Detection, Verdict, ZonePipeline};
pub use sinks::{log_event, JsonlSink};
