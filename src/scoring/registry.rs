//! Named factor functions.
//!
//! Each factor maps to a plain function over a [`FactorInput`]. A function
//! returns `None` when the signal it needs is missing, so absence reaches
//! the composite scorer instead of being papered over with a default.

use std::collections::BTreeMap;

use super::config::{PressureCurve, Thresholds};
use super::factors::{self, Factor, FactorScoreSet};
use crate::calendar::ScheduleFlags;
use crate::weather::RawSample;

pub type FactorFn = fn(&FactorInput<'_>, &Thresholds) -> Option<f64>;

/// How the schedule factor sees the calendar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduleLoad {
    /// Whole-day flags, scored with fixed penalties
    Day(ScheduleFlags),
    /// Whether anything is booked at this hour
    Hour { busy: bool },
}

/// Everything a factor function may read for one scoring point.
#[derive(Debug, Clone)]
pub struct FactorInput<'a> {
    pub sample: &'a RawSample,
    /// Local hour of day (0-23)
    pub hour: u32,
    /// Whole-day (max, min) temperature, when known
    pub temperature_range: Option<(f64, f64)>,
    pub temp_delta_12h: Option<f64>,
    pub pressure_delta_12h: Option<f64>,
    pub aqi: Option<f64>,
    pub outdoor_exposure: bool,
    pub schedule: ScheduleLoad,
}

impl<'a> FactorInput<'a> {
    pub fn new(sample: &'a RawSample, hour: u32, schedule: ScheduleLoad) -> Self {
        Self {
            sample,
            hour,
            temperature_range: None,
            temp_delta_12h: None,
            pressure_delta_12h: None,
            aqi: None,
            outdoor_exposure: false,
            schedule,
        }
    }
}

fn score_temperature(input: &FactorInput<'_>, th: &Thresholds) -> Option<f64> {
    let temp = input.sample.temperature?;
    Some(factors::temperature(temp, &th.temperature))
}

fn score_temperature_difference(input: &FactorInput<'_>, th: &Thresholds) -> Option<f64> {
    let (max, min) = match input.temperature_range {
        Some((max, min)) => (Some(max), Some(min)),
        None => (None, None),
    };
    Some(factors::temperature_difference(
        max,
        min,
        &th.temperature_difference,
    ))
}

fn score_temperature_delta_12h(input: &FactorInput<'_>, th: &Thresholds) -> Option<f64> {
    let delta = input.temp_delta_12h?;
    Some(factors::temperature_delta_12h(delta, &th.temperature_delta_12h))
}

fn score_humidity(input: &FactorInput<'_>, th: &Thresholds) -> Option<f64> {
    match (input.sample.humidity, input.sample.temperature) {
        (Some(humidity), Some(temp)) => Some(factors::humidity(humidity, temp, &th.humidity)),
        _ => None,
    }
}

fn score_illumination(input: &FactorInput<'_>, th: &Thresholds) -> Option<f64> {
    let cloud = input.sample.cloud_coverage?;
    Some(factors::illumination(
        cloud,
        input.hour,
        input.sample.sunrise_hour,
        input.sample.sunset_hour,
        &th.illumination,
    ))
}

fn score_air_quality(input: &FactorInput<'_>, th: &Thresholds) -> Option<f64> {
    if !input.outdoor_exposure {
        return Some(100.0);
    }
    let aqi = input.aqi?;
    Some(factors::air_quality(aqi, true, &th.air_quality))
}

fn score_pressure(input: &FactorInput<'_>, th: &Thresholds) -> Option<f64> {
    let pressure = input.sample.pressure?;
    Some(factors::pressure(pressure, &th.pressure))
}

fn score_pressure_banded(input: &FactorInput<'_>, _th: &Thresholds) -> Option<f64> {
    let pressure = input.sample.pressure?;
    Some(factors::pressure_banded(pressure))
}

fn score_pressure_delta_12h(input: &FactorInput<'_>, th: &Thresholds) -> Option<f64> {
    let delta = input.pressure_delta_12h?;
    Some(factors::pressure_delta_12h(delta, &th.pressure_delta_12h))
}

fn score_schedule(input: &FactorInput<'_>, th: &Thresholds) -> Option<f64> {
    Some(match input.schedule {
        ScheduleLoad::Day(flags) => factors::schedule(&flags, &th.schedule),
        ScheduleLoad::Hour { busy } => factors::schedule_hourly(busy),
    })
}

/// Table of factor functions keyed by factor.
#[derive(Clone)]
pub struct FactorRegistry {
    functions: BTreeMap<Factor, FactorFn>,
}

impl std::fmt::Debug for FactorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

impl Default for FactorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl FactorRegistry {
    /// Every factor with its built-in function.
    pub fn standard() -> Self {
        let mut registry = Self {
            functions: BTreeMap::new(),
        };
        registry.register(Factor::Temperature, score_temperature);
        registry.register(Factor::TemperatureDifference, score_temperature_difference);
        registry.register(Factor::TemperatureDelta12h, score_temperature_delta_12h);
        registry.register(Factor::Humidity, score_humidity);
        registry.register(Factor::Illumination, score_illumination);
        registry.register(Factor::AirQuality, score_air_quality);
        registry.register(Factor::Pressure, score_pressure);
        registry.register(Factor::PressureDelta12h, score_pressure_delta_12h);
        registry.register(Factor::Schedule, score_schedule);
        registry
    }

    /// Standard registry with the configured pressure curve swapped in.
    pub fn with_pressure_curve(curve: PressureCurve) -> Self {
        let mut registry = Self::standard();
        if curve == PressureCurve::Banded {
            registry.register(Factor::Pressure, score_pressure_banded);
        }
        registry
    }

    /// Register or replace the function for a factor.
    pub fn register(&mut self, factor: Factor, function: FactorFn) {
        self.functions.insert(factor, function);
    }

    pub fn get(&self, factor: Factor) -> Option<FactorFn> {
        self.functions.get(&factor).copied()
    }

    /// Score the requested factors. Unregistered factors and factors whose
    /// signal is missing are left out of the set.
    pub fn evaluate(
        &self,
        factors: impl IntoIterator<Item = Factor>,
        input: &FactorInput<'_>,
        thresholds: &Thresholds,
    ) -> FactorScoreSet {
        let mut scores = FactorScoreSet::new();
        for factor in factors {
            let Some(function) = self.get(factor) else {
                log::debug!("No function registered for factor {:?}", factor);
                continue;
            };
            if let Some(score) = function(input, thresholds) {
                if score.is_finite() {
                    scores.insert(factor, score);
                }
            }
        }
        scores
    }
}
