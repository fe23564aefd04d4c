//! Tunables for inking and collaboration.

use crate::error::{InkError, InkResult};
use crate::sync::UserRole;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Inking settings. Every field has a default, so partial JSON is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkingConfig {
    /// Width and height of the eraser probe in ink units
    pub eraser_size: f64,
    pub point_erase_interval_ms: u64,
    pub laser_max_points: usize,
    /// Time for the laser trail to fade while the pointer is still
    pub laser_trail_ms: u64,
    pub sync: SyncConfig,
}

impl Default for InkingConfig {
    fn default() -> Self {
        Self {
            eraser_size: 10.0,
            point_erase_interval_ms: 40,
            laser_max_points: 20,
            laser_trail_ms: 200,
            sync: SyncConfig::default(),
        }
    }
}

impl InkingConfig {
    pub fn from_json_str(json: &str) -> InkResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> InkResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| InkError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn point_erase_interval(&self) -> Duration {
        Duration::from_millis(self.point_erase_interval_ms)
    }

    pub fn laser_trail(&self) -> Duration {
        Duration::from_millis(self.laser_trail_ms)
    }
}

/// Collaboration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Coalescing window for outgoing points; 0 sends every point at once
    pub batch_window_ms: u64,
    /// Drop interior points deviating less than this from their neighbors
    pub point_reduction_threshold: Option<f64>,
    pub stale_wet_stroke_timeout_ms: u64,
    pub stale_check_interval_ms: u64,
    /// Roles whose wet ink is displayed
    pub allowed_roles: Vec<UserRole>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_window_ms: 30,
            point_reduction_threshold: None,
            stale_wet_stroke_timeout_ms: 15_000,
            stale_check_interval_ms: 1_000,
            allowed_roles: UserRole::ALL.to_vec(),
        }
    }
}

impl SyncConfig {
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }

    pub fn stale_wet_stroke_timeout(&self) -> Duration {
        Duration::from_millis(self.stale_wet_stroke_timeout_ms)
    }

    pub fn stale_check_interval(&self) -> Duration {
        Duration::from_millis(self.stale_check_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = InkingConfig::default();
        assert_eq!(config.eraser_size, 10.0);
        assert_eq!(config.point_erase_interval(), Duration::from_millis(40));
        assert_eq!(config.sync.batch_window(), Duration::from_millis(30));
        assert_eq!(config.sync.stale_wet_stroke_timeout(), Duration::from_secs(15));
        assert_eq!(config.sync.allowed_roles.len(), 4);
        assert!(config.sync.point_reduction_threshold.is_none());
    }

    #[test]
    fn test_partial_json() {
        let config =
            InkingConfig::from_json_str(r#"{"eraser_size": 24, "sync": {"batch_window_ms": 0}}"#)
                .unwrap();
        assert_eq!(config.eraser_size, 24.0);
        assert_eq!(config.sync.batch_window_ms, 0);
        assert_eq!(config.laser_max_points, 20);
        assert_eq!(config.sync.stale_check_interval_ms, 1_000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"sync": {{"allowed_roles": ["presenter"]}}}}"#).unwrap();

        let config = InkingConfig::load(file.path()).unwrap();
        assert_eq!(config.sync.allowed_roles, vec![UserRole::Presenter]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = InkingConfig::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(InkError::Io(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            InkingConfig::from_json_str("{\"eraser_size\": \"big\"}"),
            Err(InkError::Serialization(_))
        ));
    }
}
