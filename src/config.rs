use crate::geometry::Point;
use crate::monitor::{HysteresisThresholds, SimpleThresholds, ZoneConfig};
use crate::pipeline::AnyMonitor;
use crate::types::Config;
use anyhow::{ensure, Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read zone file {}", path.display()))?;
        let config = Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid zone file {}", path.display()))?;
        info!(
            "✓ Zone file loaded: camera={}, policy={}, {} polygon vertices",
            config.camera_id,
            config.policy.as_str(),
            config.bed_polygon.len()
        );
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        ensure!(
            config.fps.is_finite() && config.fps > 0.0,
            "fps must be positive, got {}",
            config.fps
        );
        if let Some(ttl) = config.track_ttl_sec {
            ensure!(
                ttl.is_finite() && ttl > 0.0,
                "track_ttl_sec must be positive, got {}",
                ttl
            );
        }
        Ok(config)
    }

    pub fn polygon(&self) -> Vec<Point> {
        self.bed_polygon.iter().copied().map(Point::from).collect()
    }

    pub fn hysteresis_zone(&self) -> Result<ZoneConfig<HysteresisThresholds>> {
        ZoneConfig::new(self.polygon(), self.thresholds)
    }

    pub fn simple_zone(&self) -> Result<ZoneConfig<SimpleThresholds>> {
        ZoneConfig::new(self.polygon(), self.simple_thresholds)
    }

    /// Monitor for the policy named in the zone file.
    pub fn zone_monitor(&self) -> Result<AnyMonitor> {
        AnyMonitor::from_config(self, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PolicyKind;

    const FULL: &str = r#"
camera_id: ward3-bed2
fps: 15
policy: simple
person_class_id: 2
track_ttl_sec: 90
bed_polygon: [[100, 100], [300, 100], [300, 300], [100, 300]]
thresholds:
  d1_safe_min: 55
  T2_alert: 20
simple_thresholds:
  T_alert: 12
logging:
  level: debug
"#;

    #[test]
    fn test_full_zone_file() {
        let cfg = Config::from_yaml_str(FULL).unwrap();
        assert_eq!(cfg.camera_id, "ward3-bed2");
        assert_eq!(cfg.fps, 15.0);
        assert_eq!(cfg.policy, PolicyKind::Simple);
        assert_eq!(cfg.person_class_id, 2);
        assert_eq!(cfg.track_ttl_sec, Some(90.0));
        assert_eq!(cfg.logging.level, "debug");

        // Explicit keys override, the rest keep their defaults
        assert_eq!(cfg.thresholds.d1_safe_min, 55.0);
        assert_eq!(cfg.thresholds.t2_alert, 20.0);
        assert_eq!(cfg.thresholds.t1_heads_up, 8.0);
        assert_eq!(cfg.simple_thresholds.t_alert, 12.0);
        assert_eq!(cfg.simple_thresholds.cooldown_sec, 30.0);

        assert_eq!(cfg.polygon()[2], Point::new(300.0, 300.0));
        assert!(cfg.hysteresis_zone().is_ok());
        assert!(cfg.simple_zone().is_ok());
        assert_eq!(cfg.zone_monitor().unwrap().policy(), PolicyKind::Simple);
    }

    #[test]
    fn test_minimal_zone_file_uses_defaults() {
        let cfg = Config::from_yaml_str("bed_polygon: [[0, 0], [10, 0], [10, 10]]").unwrap();
        assert_eq!(cfg.camera_id, "cam01");
        assert_eq!(cfg.fps, 30.0);
        assert_eq!(cfg.policy, PolicyKind::Hysteresis);
        assert_eq!(cfg.thresholds, HysteresisThresholds::default());
        assert_eq!(cfg.track_ttl_sec, None);
    }

    #[test]
    fn test_bad_zone_files_fail_fast() {
        assert!(Config::from_yaml_str("camera_id: x").is_err());
        assert!(Config::from_yaml_str("fps: 0\nbed_polygon: [[0, 0], [10, 0], [10, 10]]").is_err());

        let two_points = Config::from_yaml_str("bed_polygon: [[0, 0], [10, 0]]").unwrap();
        assert!(two_points.hysteresis_zone().is_err());

        let negative = Config::from_yaml_str(
            "bed_polygon: [[0, 0], [10, 0], [10, 10]]\nsimple_thresholds:\n  d2_edge: -1",
        )
        .unwrap();
        assert!(negative.simple_zone().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load("/nonexistent/zones.yaml").is_err());
    }
}
