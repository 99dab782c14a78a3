use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::factors::Factor;

/// Main scoring configuration.
///
/// Holds the thresholds every factor function reads, plus one weight profile
/// for the hourly timeline and one for the per-day outlook. Every field is
/// optional in YAML and falls back to the built-in model.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   pressure_curve: banded
///   hourly_weights:
///     temperature: 0.2
///     temperature_delta_12h: 0.05
///     humidity: 0.15
///     illumination: 0.15
///     air_quality: 0.1
///     pressure: 0.1
///     schedule: 0.25
///   thresholds:
///     temperature:
///       optimal_min: 18
///       optimal_max: 22
///       comfort_min: 12
///       comfort_max: 27
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Which pressure curve the registry uses for the `pressure` factor
    pub pressure_curve: PressureCurve,

    /// Weights for hourly scoring (72-hour timeline)
    pub hourly_weights: Weights,

    /// Weights for whole-day scoring (daily outlook)
    pub daily_weights: Weights,

    /// Breakpoints and penalty rates for every factor function
    pub thresholds: Thresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pressure_curve: PressureCurve::Floor,
            hourly_weights: Weights::hourly_default(),
            daily_weights: Weights::daily_default(),
            thresholds: Thresholds::default(),
        }
    }
}

/// Shape of the pressure factor.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PressureCurve {
    /// 100 at/above the comfort floor, linear decay to 0 at the lower bound
    #[default]
    Floor,
    /// 100 inside 1010-1020 hPa, piecewise-linear penalties on both sides
    Banded,
}

/// Factor weights. Expected to sum to 1.0; only validated as a warning.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct Weights(BTreeMap<Factor, f64>);

impl Weights {
    pub fn new(weights: impl IntoIterator<Item = (Factor, f64)>) -> Self {
        Self(weights.into_iter().collect())
    }

    /// Weight profile for hourly scores. Pressure swing is reported but not weighted.
    pub fn hourly_default() -> Self {
        Self::new([
            (Factor::Temperature, 0.15),
            (Factor::TemperatureDelta12h, 0.10),
            (Factor::Humidity, 0.15),
            (Factor::Illumination, 0.15),
            (Factor::AirQuality, 0.10),
            (Factor::Pressure, 0.10),
            (Factor::PressureDelta12h, 0.0),
            (Factor::Schedule, 0.25),
        ])
    }

    /// Weight profile for whole-day scores.
    pub fn daily_default() -> Self {
        Self::new([
            (Factor::Temperature, 0.15),
            (Factor::TemperatureDifference, 0.10),
            (Factor::Humidity, 0.15),
            (Factor::Illumination, 0.15),
            (Factor::AirQuality, 0.10),
            (Factor::Pressure, 0.10),
            (Factor::Schedule, 0.25),
        ])
    }

    pub fn get(&self, factor: Factor) -> Option<f64> {
        self.0.get(&factor).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        self.0.iter().map(|(f, w)| (*f, *w))
    }

    /// Factors named by this profile, including zero-weight ones.
    pub fn factors(&self) -> impl Iterator<Item = Factor> + '_ {
        self.0.keys().copied()
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Breakpoints for every factor function.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub temperature: TemperatureBands,
    /// Whole-day max/min spread
    pub temperature_difference: SpreadPenalty,
    /// Trailing 12h temperature swing
    pub temperature_delta_12h: SpreadPenalty,
    pub humidity: HumidityBands,
    pub illumination: IlluminationWindow,
    pub air_quality: AirQualityBands,
    pub pressure: PressureBands,
    /// Trailing 12h pressure swing (hPa)
    pub pressure_delta_12h: SpreadPenalty,
    pub schedule: SchedulePenalties,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature: TemperatureBands::default(),
            temperature_difference: SpreadPenalty::daily_spread(),
            temperature_delta_12h: SpreadPenalty::default(),
            humidity: HumidityBands::default(),
            illumination: IlluminationWindow::default(),
            air_quality: AirQualityBands::default(),
            pressure: PressureBands::default(),
            pressure_delta_12h: SpreadPenalty::default(),
            schedule: SchedulePenalties::default(),
        }
    }
}

/// Temperature plateau and falloff (°C).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TemperatureBands {
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub comfort_min: f64,
    pub comfort_max: f64,
    /// Score at either edge of the comfort band
    pub comfort_edge_score: f64,
    /// Points lost per °C below the comfort band
    pub cold_rate: f64,
    /// Points lost per °C above the comfort band
    pub hot_rate: f64,
    pub cold_floor: f64,
    pub hot_floor: f64,
}

impl Default for TemperatureBands {
    fn default() -> Self {
        Self {
            optimal_min: 5.0,
            optimal_max: 10.0,
            comfort_min: 0.0,
            comfort_max: 20.0,
            comfort_edge_score: 70.0,
            cold_rate: 5.0,
            hot_rate: 5.0,
            cold_floor: 10.0,
            hot_floor: 20.0,
        }
    }
}

/// Tolerance-then-linear-penalty shape shared by the spread and delta factors.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SpreadPenalty {
    /// Spread at or below this scores 100
    pub tolerance: f64,
    /// Points lost per unit beyond the tolerance
    pub rate: f64,
    pub floor: f64,
}

impl Default for SpreadPenalty {
    fn default() -> Self {
        Self {
            tolerance: 5.0,
            rate: 10.0,
            floor: 0.0,
        }
    }
}

impl SpreadPenalty {
    /// Daily max/min spread: 10°C tolerance, 3 pts/°C, floor 10.
    pub fn daily_spread() -> Self {
        Self {
            tolerance: 10.0,
            rate: 3.0,
            floor: 10.0,
        }
    }
}

/// Relative humidity comfort band (%).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HumidityBands {
    pub comfort_min: f64,
    pub comfort_max: f64,
    pub low_rate: f64,
    pub high_rate: f64,
    pub low_floor: f64,
    pub high_floor: f64,
    /// At or above this temperature the penalty is multiplied
    pub hot_temperature: f64,
    pub hot_multiplier: f64,
}

impl Default for HumidityBands {
    fn default() -> Self {
        Self {
            comfort_min: 40.0,
            comfort_max: 60.0,
            low_rate: 1.5,
            high_rate: 2.0,
            low_floor: 40.0,
            high_floor: 30.0,
            hot_temperature: 20.0,
            hot_multiplier: 1.5,
        }
    }
}

/// Daylight window used when a sample carries no sunrise/sunset.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IlluminationWindow {
    pub default_sunrise: u32,
    pub default_sunset: u32,
    pub night_score: f64,
}

impl Default for IlluminationWindow {
    fn default() -> Self {
        Self {
            default_sunrise: 6,
            default_sunset: 18,
            night_score: 70.0,
        }
    }
}

/// Step function over AQI bands, checked in order.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AirQualityBands {
    pub bands: Vec<AqiBand>,
    /// Score above the last band
    pub worst_score: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AqiBand {
    /// Inclusive upper AQI bound
    pub max: f64,
    pub score: f64,
}

impl Default for AirQualityBands {
    fn default() -> Self {
        Self {
            bands: vec![
                AqiBand { max: 50.0, score: 100.0 },
                AqiBand { max: 100.0, score: 80.0 },
                AqiBand { max: 150.0, score: 50.0 },
            ],
            worst_score: 20.0,
        }
    }
}

/// Pressure comfort floor (hPa).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PressureBands {
    /// At or above this the score is 100
    pub comfort_floor: f64,
    /// At or below this the score is 0
    pub zero_floor: f64,
}

impl Default for PressureBands {
    fn default() -> Self {
        Self {
            comfort_floor: 1015.0,
            zero_floor: 990.0,
        }
    }
}

/// Point deductions for whole-day schedule load.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulePenalties {
    pub meeting: f64,
    pub outdoor: f64,
    pub sleep_interruption: f64,
    pub meal_interruption: f64,
    pub floor: f64,
}

impl Default for SchedulePenalties {
    fn default() -> Self {
        Self {
            meeting: 15.0,
            outdoor: 10.0,
            sleep_interruption: 20.0,
            meal_interruption: 10.0,
            floor: 10.0,
        }
    }
}
