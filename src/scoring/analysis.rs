//! Human-readable risk notes and recommendations for a scored point.

use serde::Serialize;

use super::engine::EvaluationTier;
use super::factors::{Factor, FactorScoreSet};
use crate::calendar::ScheduleFlags;
use crate::weather::RawSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    Cold,
    Heat,
    Muggy,
    DimDaylight,
    PoorAir,
    LowPressure,
    BusySchedule,
}

impl RiskKind {
    pub fn impact(&self) -> &'static str {
        match self {
            RiskKind::Cold => "Getting chilled can drag your condition down",
            RiskKind::Heat => "Risk of fatigue and dehydration",
            RiskKind::Muggy => "Heat combined with humidity can hit hard",
            RiskKind::DimDaylight => "You may feel foggy without daylight",
            RiskKind::PoorAir => "Outdoor activity may leave you feeling worse",
            RiskKind::LowPressure => "Low pressure can bring headaches and grogginess",
            RiskKind::BusySchedule => "Risk of stress and missed sleep or meals",
        }
    }

    fn recommendations(&self) -> &'static [&'static str] {
        match self {
            RiskKind::Cold => &["Dress warmly"],
            RiskKind::Heat => &["Drink water often and stay somewhere cool"],
            RiskKind::Muggy => &[
                "Keep humidity in check with the air conditioner",
                "Consider running a dehumidifier",
            ],
            RiskKind::DimDaylight => &[
                "Spend daytime hours near a window",
                "Step outside for some daylight if you can",
            ],
            RiskKind::PoorAir => &[
                "Consider wearing a mask",
                "Consider running an air purifier",
            ],
            RiskKind::LowPressure => &[
                "Keep headache medication at hand",
                "Take short breaks often",
            ],
            RiskKind::BusySchedule => &[],
        }
    }
}

/// A factor that scored low enough to call out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskNote {
    pub factor: Factor,
    pub kind: RiskKind,
    pub issue: String,
    pub impact: &'static str,
}

impl RiskNote {
    fn new(factor: Factor, kind: RiskKind, issue: String) -> Self {
        Self {
            factor,
            kind,
            issue,
            impact: kind.impact(),
        }
    }
}

/// Signals the analysis reads besides the factor scores.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub sample: &'a RawSample,
    pub aqi: Option<f64>,
    pub flags: ScheduleFlags,
}

fn below(scores: &FactorScoreSet, factor: Factor, limit: f64) -> bool {
    scores.get(factor).is_some_and(|s| s < limit)
}

/// Collect risk notes for factors that fell below their alert level.
pub fn analyze(scores: &FactorScoreSet, ctx: &AnalysisContext<'_>) -> Vec<RiskNote> {
    let mut notes = Vec::new();
    let temp = ctx.sample.temperature;

    if below(scores, Factor::Temperature, 70.0) {
        match temp {
            Some(t) if t < 5.0 => notes.push(RiskNote::new(
                Factor::Temperature,
                RiskKind::Cold,
                format!("Very cold ({:.1}°C)", t),
            )),
            Some(t) if t > 20.0 => notes.push(RiskNote::new(
                Factor::Temperature,
                RiskKind::Heat,
                format!("Hot ({:.1}°C)", t),
            )),
            _ => {}
        }
    }

    if below(scores, Factor::Humidity, 70.0) {
        if let (Some(t), Some(h)) = (temp, ctx.sample.humidity) {
            if t >= 20.0 {
                notes.push(RiskNote::new(
                    Factor::Humidity,
                    RiskKind::Muggy,
                    format!("Hot and humid ({:.1}°C, {:.0}%)", t, h),
                ));
            }
        }
    }

    if below(scores, Factor::Illumination, 70.0) {
        notes.push(RiskNote::new(
            Factor::Illumination,
            RiskKind::DimDaylight,
            "Not much daylight".to_string(),
        ));
    }

    if ctx.flags.has_outdoor_activities && below(scores, Factor::AirQuality, 80.0) {
        let issue = match ctx.aqi {
            Some(aqi) => format!("Outdoor plans with poor air quality (AQI {:.0})", aqi),
            None => "Outdoor plans with poor air quality".to_string(),
        };
        notes.push(RiskNote::new(Factor::AirQuality, RiskKind::PoorAir, issue));
    }

    if below(scores, Factor::Pressure, 80.0) {
        let issue = match ctx.sample.pressure {
            Some(p) => format!("Low pressure ({:.0} hPa)", p),
            None => "Low pressure".to_string(),
        };
        notes.push(RiskNote::new(Factor::Pressure, RiskKind::LowPressure, issue));
    }

    if below(scores, Factor::Schedule, 80.0) {
        let mut issues = Vec::new();
        if ctx.flags.has_meetings {
            issues.push("meetings");
        }
        if ctx.flags.has_outdoor_activities {
            issues.push("outings");
        }
        if ctx.flags.sleep_interruption {
            issues.push("plans cutting into sleep");
        }
        if ctx.flags.meal_interruption {
            issues.push("plans cutting into meals");
        }
        let issue = if issues.is_empty() {
            "Busy schedule".to_string()
        } else {
            format!("Busy schedule: {}", issues.join(", "))
        };
        notes.push(RiskNote::new(Factor::Schedule, RiskKind::BusySchedule, issue));
    }

    notes
}

fn tier_recommendations(tier: EvaluationTier) -> &'static [&'static str] {
    match tier {
        EvaluationTier::Good => &["Carry on with your usual routine"],
        EvaluationTier::Caution => &[
            "Keep activity within comfortable limits",
            "Take short breaks often",
            "Stay well hydrated",
        ],
        EvaluationTier::Concern => &[
            "Scale back how much you take on",
            "Aim for at least seven hours of sleep",
            "Eat balanced meals",
            "Skip outings you don't need",
        ],
        EvaluationTier::Warning => &[
            "Make rest your priority",
            "Only go out when you must",
            "See a doctor if you feel unwell",
        ],
    }
}

/// Tier advice followed by per-risk advice, without repeats.
pub fn recommendations(tier: EvaluationTier, risks: &[RiskNote]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let per_risk = risks.iter().flat_map(|r| r.kind.recommendations().iter());
    for line in tier_recommendations(tier).iter().chain(per_risk) {
        if !out.iter().any(|existing| existing == line) {
            out.push((*line).to_string());
        }
    }
    out
}
