//! Application constants and tunable triage/queue settings.
//!
//! Every field has a default, so a config file only needs the values a site
//! actually changes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ReferenceRanges;

/// Application-level constants
pub const APP_NAME: &str = "Nabha Triage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "nabha_triage=info,warn"
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Queue tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Events buffered per subscriber before the oldest are dropped.
    pub event_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { event_capacity: 256 }
    }
}

/// Top-level configuration for one intake desk.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub ranges: ReferenceRanges,
    pub queue: QueueConfig,
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

impl TriageConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), "Triage config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.ranges;
        let thresholds = [
            ("temperature_max_f", r.temperature_max_f),
            ("systolic_max", r.systolic_max),
            ("diastolic_max", r.diastolic_max),
            ("heart_rate_min", r.heart_rate_min),
            ("heart_rate_max", r.heart_rate_max),
            ("glucose_min", r.glucose_min),
            ("glucose_max", r.glucose_max),
        ];
        if let Some((name, _)) = thresholds.iter().find(|(_, v)| !v.is_finite() || *v <= 0.0) {
            return Err(ConfigError::Invalid(format!("{name} must be a positive number")));
        }
        if r.heart_rate_min > r.heart_rate_max {
            return Err(ConfigError::Invalid("heart rate range is inverted".into()));
        }
        if r.glucose_min > r.glucose_max {
            return Err(ConfigError::Invalid("glucose range is inverted".into()));
        }
        if self.queue.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_filter_names_crate() {
        assert!(default_log_filter().contains("nabha_triage"));
    }

    #[test]
    fn defaults_are_valid() {
        let config = TriageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.queue.event_capacity, 256);
        assert_eq!(config.ranges.temperature_max_f, 100.4);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = TriageConfig::from_json_str(r#"{"ranges": {"glucose_max": 180.0}}"#).unwrap();
        assert_eq!(config.ranges.glucose_max, 180.0);
        assert_eq!(config.ranges.glucose_min, 70.0);
        assert_eq!(config.queue, QueueConfig::default());

        assert_eq!(TriageConfig::from_json_str("{}").unwrap(), TriageConfig::default());
    }

    #[test]
    fn inverted_range_rejected() {
        let err = TriageConfig::from_json_str(
            r#"{"ranges": {"heart_rate_min": 120.0, "heart_rate_max": 100.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_capacity_and_bad_threshold_rejected() {
        assert!(matches!(
            TriageConfig::from_json_str(r#"{"queue": {"event_capacity": 0}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TriageConfig::from_json_str(r#"{"ranges": {"systolic_max": -1.0}}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            TriageConfig::from_json_str("{ranges:"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"queue": {{"event_capacity": 16}}}}"#).unwrap();

        let config = TriageConfig::load(file.path()).unwrap();
        assert_eq!(config.queue.event_capacity, 16);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TriageConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
