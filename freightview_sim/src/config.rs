//! Harness configuration, loadable from a JSON file.

use freightview_core::{MovementConfig, SpeedTable, TrackerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SimError;

/// Configuration for a simulation or serve run.
///
/// Every key is optional in the JSON file; missing keys take the defaults
/// below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master seed for determinism (default: 42)
    pub seed: u64,

    /// Simulated seconds per tick (default: 3.0)
    pub tick_interval_secs: f64,

    /// Remaining distance under which a shipment is delivered, km (default: 50)
    pub arrival_threshold_km: f64,

    /// Coordinate gap treated as "at the destination", degrees (default: 0.01)
    pub tolerance_deg: f64,

    /// Cruise speeds by priority, km/h (default: 80 / 60 / 40)
    pub speeds_kmh: SpeedTable,

    /// Simulated seconds per real second (default: 1.0)
    pub time_scale: f64,

    /// Where shipments are persisted (default: none)
    pub data_file: Option<PathBuf>,

    /// Replacement city catalog in JSON (default: built-in world catalog)
    pub cities_file: Option<PathBuf>,

    /// Seed the sample fleet when nothing was restored (default: true)
    pub seed_samples: bool,

    /// Snapshots buffered per viewer before it starts lagging (default: 64)
    pub broadcast_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        let movement = MovementConfig::default();
        Self {
            seed: 42,
            tick_interval_secs: 3.0,
            arrival_threshold_km: movement.arrival_threshold_km,
            tolerance_deg: movement.tolerance_deg,
            speeds_kmh: movement.speeds_kmh,
            time_scale: movement.time_scale,
            data_file: None,
            cities_file: None,
            seed_samples: true,
            broadcast_capacity: 64,
        }
    }
}

impl SimConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        let raw = std::fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        let config: SimConfig = serde_json::from_str(&raw).map_err(|e| SimError::json(path, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.tick_interval()?;
        if self.broadcast_capacity == 0 {
            return Err(SimError::Config("broadcast_capacity must be at least 1".into()));
        }
        self.movement().validate()?;
        Ok(())
    }

    pub fn movement(&self) -> MovementConfig {
        MovementConfig {
            arrival_threshold_km: self.arrival_threshold_km,
            tolerance_deg: self.tolerance_deg,
            speeds_kmh: self.speeds_kmh.clone(),
            time_scale: self.time_scale,
            ..MovementConfig::default()
        }
    }

    /// The tick interval as a `Duration`; must be positive and representable.
    pub fn tick_interval(&self) -> Result<Duration, SimError> {
        let secs = self.tick_interval_secs;
        match Duration::try_from_secs_f64(secs) {
            Ok(interval) if !interval.is_zero() => Ok(interval),
            _ => Err(SimError::Config(format!(
                "tick_interval_secs must be a positive number of seconds, got {secs}"
            ))),
        }
    }

    pub fn tracker(&self) -> Result<TrackerConfig, SimError> {
        Ok(TrackerConfig {
            tick_interval: self.tick_interval()?,
            movement: self.movement(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sim_config_default() {
        let config = SimConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.tick_interval_secs, 3.0);
        assert!(config.seed_samples);
        assert!(config.validate().is_ok());
        assert_eq!(config.tracker().unwrap(), TrackerConfig::default());
    }

    #[test]
    fn test_partial_file_takes_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tick_interval_secs": 1.0, "speeds_kmh": {{"high": 120.0}}}}"#).unwrap();

        let config = SimConfig::load(file.path()).unwrap();

        assert_eq!(config.tick_interval_secs, 1.0);
        assert_eq!(config.speeds_kmh.high, 120.0);
        assert_eq!(config.speeds_kmh.low, 40.0);
        assert_eq!(config.arrival_threshold_km, 50.0);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let config = SimConfig {
            tick_interval_secs: 0.0,
            ..SimConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::Config(_))));

        for secs in [-3.0, f64::NAN, f64::INFINITY, 1e20] {
            let config = SimConfig {
                tick_interval_secs: secs,
                ..SimConfig::default()
            };
            assert!(matches!(config.validate(), Err(SimError::Config(_))), "{secs}");
            assert!(config.tracker().is_err(), "{secs}");
        }

        let config = SimConfig {
            arrival_threshold_km: -1.0,
            ..SimConfig::default()
        };
        assert!(matches!(config.validate(), Err(SimError::Core(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SimConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_is_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(SimConfig::load(file.path()), Err(SimError::Json { .. })));
    }
}
