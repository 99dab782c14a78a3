use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::config::{
    AirQualityBands, HumidityBands, IlluminationWindow, PressureBands, SchedulePenalties,
    SpreadPenalty, TemperatureBands,
};
use crate::calendar::ScheduleFlags;

/// One named signal contributing to the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Temperature,
    TemperatureDifference,
    #[serde(rename = "temperature_delta_12h")]
    TemperatureDelta12h,
    Humidity,
    Illumination,
    AirQuality,
    Pressure,
    #[serde(rename = "pressure_delta_12h")]
    PressureDelta12h,
    Schedule,
}

impl Factor {
    pub const ALL: [Factor; 9] = [
        Factor::Temperature,
        Factor::TemperatureDifference,
        Factor::TemperatureDelta12h,
        Factor::Humidity,
        Factor::Illumination,
        Factor::AirQuality,
        Factor::Pressure,
        Factor::PressureDelta12h,
        Factor::Schedule,
    ];

    /// Name used in config files and JSON.
    pub fn key(&self) -> &'static str {
        match self {
            Factor::Temperature => "temperature",
            Factor::TemperatureDifference => "temperature_difference",
            Factor::TemperatureDelta12h => "temperature_delta_12h",
            Factor::Humidity => "humidity",
            Factor::Illumination => "illumination",
            Factor::AirQuality => "air_quality",
            Factor::Pressure => "pressure",
            Factor::PressureDelta12h => "pressure_delta_12h",
            Factor::Schedule => "schedule",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Factor::Temperature => "Temperature",
            Factor::TemperatureDifference => "Daily temp range",
            Factor::TemperatureDelta12h => "12h temp swing",
            Factor::Humidity => "Humidity",
            Factor::Illumination => "Daylight",
            Factor::AirQuality => "Air quality",
            Factor::Pressure => "Pressure",
            Factor::PressureDelta12h => "12h pressure swing",
            Factor::Schedule => "Schedule",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sub-scores keyed by factor, each in [0, 100]. Missing factors are legal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorScoreSet(BTreeMap<Factor, f64>);

impl FactorScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, factor: Factor, score: f64) {
        self.0.insert(factor, clamp_score(score));
    }

    pub fn get(&self, factor: Factor) -> Option<f64> {
        self.0.get(&factor).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        self.0.iter().map(|(f, s)| (*f, *s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Factor, f64)> for FactorScoreSet {
    fn from_iter<I: IntoIterator<Item = (Factor, f64)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (factor, score) in iter {
            set.insert(factor, score);
        }
        set
    }
}

pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Linear ramp from `(x0, y0)` to `(x1, y1)`. A degenerate span yields `y1`.
fn ramp(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    let span = x1 - x0;
    if span <= 0.0 {
        return y1;
    }
    y0 + (x - x0) / span * (y1 - y0)
}

/// 100 on the optimal plateau, ramping to the edge score across the comfort
/// band, then falling linearly to a per-side floor.
pub fn temperature(temp: f64, bands: &TemperatureBands) -> f64 {
    let edge = bands.comfort_edge_score;
    let score = if temp >= bands.optimal_min && temp <= bands.optimal_max {
        100.0
    } else if temp < bands.optimal_min {
        if temp >= bands.comfort_min {
            ramp(temp, bands.comfort_min, bands.optimal_min, edge, 100.0)
        } else {
            (edge - (bands.comfort_min - temp) * bands.cold_rate).max(bands.cold_floor)
        }
    } else if temp <= bands.comfort_max {
        ramp(temp, bands.optimal_max, bands.comfort_max, 100.0, edge)
    } else {
        (edge - (temp - bands.comfort_max) * bands.hot_rate).max(bands.hot_floor)
    };
    clamp_score(score)
}

/// Tolerance followed by a linear per-unit penalty, floored.
pub fn spread_penalty(spread: f64, penalty: &SpreadPenalty) -> f64 {
    if spread <= penalty.tolerance {
        return 100.0;
    }
    clamp_score((100.0 - (spread - penalty.tolerance) * penalty.rate).max(penalty.floor))
}

/// Whole-day max/min spread. An unknown bound means no penalty.
pub fn temperature_difference(
    temp_max: Option<f64>,
    temp_min: Option<f64>,
    penalty: &SpreadPenalty,
) -> f64 {
    match (temp_max, temp_min) {
        (Some(max), Some(min)) => spread_penalty(max - min, penalty),
        _ => 100.0,
    }
}

pub fn temperature_delta_12h(delta: f64, penalty: &SpreadPenalty) -> f64 {
    spread_penalty(delta, penalty)
}

pub fn pressure_delta_12h(delta: f64, penalty: &SpreadPenalty) -> f64 {
    spread_penalty(delta, penalty)
}

/// Humidity outside the comfort band costs more when it is hot.
pub fn humidity(humidity: f64, temperature: f64, bands: &HumidityBands) -> f64 {
    if humidity >= bands.comfort_min && humidity <= bands.comfort_max {
        return 100.0;
    }

    let multiplier = if temperature >= bands.hot_temperature {
        bands.hot_multiplier
    } else {
        1.0
    };

    let score = if humidity < bands.comfort_min {
        let diff = bands.comfort_min - humidity;
        (100.0 - diff * bands.low_rate * multiplier).max(bands.low_floor)
    } else {
        let diff = humidity - bands.comfort_max;
        (100.0 - diff * bands.high_rate * multiplier).max(bands.high_floor)
    };
    clamp_score(score)
}

/// Daylight hours score inversely to cloud cover; night hours are neutral.
pub fn illumination(
    cloud_coverage: f64,
    hour: u32,
    sunrise_hour: Option<u32>,
    sunset_hour: Option<u32>,
    window: &IlluminationWindow,
) -> f64 {
    let sunrise = sunrise_hour.unwrap_or(window.default_sunrise);
    let sunset = sunset_hour.unwrap_or(window.default_sunset);

    if hour < sunrise || hour >= sunset {
        return window.night_score;
    }
    clamp_score(100.0 - cloud_coverage)
}

/// AQI only matters when there is outdoor exposure.
pub fn air_quality(aqi: f64, has_outdoor_plans: bool, bands: &AirQualityBands) -> f64 {
    if !has_outdoor_plans {
        return 100.0;
    }
    bands
        .bands
        .iter()
        .find(|band| aqi <= band.max)
        .map(|band| band.score)
        .unwrap_or(bands.worst_score)
}

/// 100 at/above the comfort floor, linear down to 0 at the lower bound.
pub fn pressure(pressure_hpa: f64, bands: &PressureBands) -> f64 {
    if pressure_hpa >= bands.comfort_floor {
        return 100.0;
    }
    if pressure_hpa <= bands.zero_floor {
        return 0.0;
    }
    clamp_score(ramp(pressure_hpa, bands.zero_floor, bands.comfort_floor, 0.0, 100.0))
}

/// Knots of the banded pressure curve (hPa, score).
const PRESSURE_KNOTS: [(f64, f64); 8] = [
    (980.0, 20.0),
    (990.0, 40.0),
    (1000.0, 80.0),
    (1010.0, 100.0),
    (1020.0, 100.0),
    (1030.0, 50.0),
    (1040.0, 30.0),
    (1050.0, 15.0),
];

/// Alternative curve penalising both low and high pressure.
pub fn pressure_banded(pressure_hpa: f64) -> f64 {
    let (low_p, low_s) = PRESSURE_KNOTS[0];
    let (high_p, high_s) = PRESSURE_KNOTS[PRESSURE_KNOTS.len() - 1];

    if pressure_hpa < low_p {
        return (low_s - (low_p - pressure_hpa) * 2.0).max(10.0);
    }
    if pressure_hpa > high_p {
        return (high_s - (pressure_hpa - high_p) * 2.0).max(10.0);
    }

    PRESSURE_KNOTS
        .windows(2)
        .find(|pair| pressure_hpa <= pair[1].0)
        .map(|pair| ramp(pressure_hpa, pair[0].0, pair[1].0, pair[0].1, pair[1].1))
        .unwrap_or(high_s)
}

/// Whole-day schedule load: fixed deduction per active flag, floored.
pub fn schedule(flags: &ScheduleFlags, penalties: &SchedulePenalties) -> f64 {
    let mut score = 100.0;
    if flags.has_meetings {
        score -= penalties.meeting;
    }
    if flags.has_outdoor_activities {
        score -= penalties.outdoor;
    }
    if flags.sleep_interruption {
        score -= penalties.sleep_interruption;
    }
    if flags.meal_interruption {
        score -= penalties.meal_interruption;
    }
    clamp_score(score.max(penalties.floor))
}

/// Hourly schedule load is binary: anything booked at this hour scores 0.
pub fn schedule_hourly(busy: bool) -> f64 {
    if busy {
        0.0
    } else {
        100.0
    }
}
