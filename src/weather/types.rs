use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One weather observation or forecast point.
///
/// Every measurement is optional. A missing value stays missing all the way
/// through scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,   // °C
    pub humidity: Option<f64>,      // %
    pub pressure: Option<f64>,      // hPa
    pub cloud_coverage: Option<f64>, // %
    pub wind_speed: Option<f64>,    // m/s
    pub feels_like: Option<f64>,    // °C
    pub visibility: Option<f64>,    // m
    pub rain_volume: Option<f64>,   // mm over the provider's step
    pub description: Option<String>,
    /// Local hour of sunrise, when the provider reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunrise_hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunset_hour: Option<u32>,
}

impl RawSample {
    /// A sample at `timestamp` with nothing measured.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            temperature: None,
            humidity: None,
            pressure: None,
            cloud_coverage: None,
            wind_speed: None,
            feels_like: None,
            visibility: None,
            rain_volume: None,
            description: None,
            sunrise_hour: None,
            sunset_hour: None,
        }
    }

    fn numeric_fields(&self) -> [Option<f64>; 8] {
        [
            self.temperature,
            self.humidity,
            self.pressure,
            self.cloud_coverage,
            self.wind_speed,
            self.feels_like,
            self.visibility,
            self.rain_volume,
        ]
    }

    /// True when every present numeric field is finite.
    pub fn is_finite(&self) -> bool {
        self.numeric_fields()
            .iter()
            .all(|v| v.map_or(true, f64::is_finite))
    }

    /// True when at least one scored signal (temperature, humidity,
    /// pressure, cloud cover) was measured. Wind, visibility and rain alone
    /// do not make a sample usable.
    pub fn has_measurements(&self) -> bool {
        [
            self.temperature,
            self.humidity,
            self.pressure,
            self.cloud_coverage,
        ]
        .iter()
        .any(Option::is_some)
    }

    /// Copy of this sample moved to another timestamp.
    pub fn at(&self, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            ..self.clone()
        }
    }
}
