use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scoring::ScoringConfig;

/// Fallback AQI when the air quality provider is unavailable
pub const DEFAULT_AQI: f64 = 50.0;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub location: Location,

    /// Fixed UTC offset such as "+09:00". The system time zone when absent.
    #[serde(default)]
    pub utc_offset: Option<String>,

    /// History file; defaults to ~/.config/condition-forecast/history.json
    #[serde(default)]
    pub history_path: Option<PathBuf>,

    /// How long recorded hours are kept, e.g. "30d"
    #[serde(default = "default_retention")]
    pub retention: String,

    /// Per-request timeout for provider calls, e.g. "10s"
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    #[serde(default = "default_aqi")]
    pub aqi_default: f64,

    #[serde(default)]
    pub scoring: Option<ScoringConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

fn default_retention() -> String {
    "30d".to_string()
}

fn default_request_timeout() -> String {
    "10s".to_string()
}

fn default_aqi() -> f64 {
    DEFAULT_AQI
}

impl Config {
    pub fn retention(&self) -> Result<chrono::Duration> {
        let std = humantime::parse_duration(self.retention.trim())
            .with_context(|| format!("Invalid retention '{}'", self.retention))?;
        chrono::Duration::from_std(std)
            .with_context(|| format!("Retention '{}' is out of range", self.retention))
    }

    pub fn request_timeout(&self) -> Result<std::time::Duration> {
        humantime::parse_duration(self.request_timeout.trim())
            .with_context(|| format!("Invalid request_timeout '{}'", self.request_timeout))
    }

    pub fn utc_offset(&self) -> Result<Option<FixedOffset>> {
        self.utc_offset
            .as_deref()
            .map(|s| {
                s.trim()
                    .parse::<FixedOffset>()
                    .map_err(|e| anyhow::anyhow!("Invalid utc_offset '{}': {}", s, e))
            })
            .transpose()
    }

    /// Scoring section, or the built-in model when absent
    pub fn scoring(&self) -> ScoringConfig {
        self.scoring.clone().unwrap_or_default()
    }

    pub fn check_location(&self) -> Result<()> {
        let Location { lat, lon } = self.location;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            anyhow::bail!("Location out of range: lat {}, lon {}", lat, lon);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Option<Config> {
        serde_saphyr::from_str(yaml).ok()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse("location: { lat: 35.68, lon: 139.69 }\n").unwrap();
        assert_eq!(config.location.lat, 35.68);
        assert_eq!(config.aqi_default, 50.0);
        assert_eq!(config.retention().unwrap(), chrono::Duration::days(30));
        assert_eq!(
            config.request_timeout().unwrap(),
            std::time::Duration::from_secs(10)
        );
        assert!(config.utc_offset().unwrap().is_none());
        assert_eq!(config.scoring(), ScoringConfig::default());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
location:
  lat: 51.5
  lon: -0.12
utc_offset: "+09:00"
history_path: /tmp/cf-history.json
retention: 14d
request_timeout: 3s
aqi_default: 40
scoring:
  pressure_curve: banded
"#;
        let config = parse(yaml).unwrap();
        assert_eq!(config.retention().unwrap(), chrono::Duration::days(14));
        assert_eq!(
            config.utc_offset().unwrap(),
            FixedOffset::east_opt(9 * 3600)
        );
        assert_eq!(config.history_path, Some(PathBuf::from("/tmp/cf-history.json")));
        assert_eq!(config.aqi_default, 40.0);
        assert_eq!(
            config.scoring().pressure_curve,
            crate::scoring::PressureCurve::Banded
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(parse("location: { lat: 1, lon: 2 }\nqueries: []\n").is_none());
    }

    #[test]
    fn test_bad_durations() {
        let config = parse("location: { lat: 1, lon: 2 }\nretention: soon\n").unwrap();
        assert!(config.retention().is_err());
        let config = parse("location: { lat: 1, lon: 2 }\nutc_offset: nowhere\n").unwrap();
        assert!(config.utc_offset().is_err());
    }

    #[test]
    fn test_location_range() {
        let config = parse("location: { lat: 91, lon: 0 }\n").unwrap();
        assert!(config.check_location().is_err());
    }
}
