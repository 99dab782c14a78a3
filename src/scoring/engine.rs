use serde::{Deserialize, Serialize};

use super::config::{ScoringConfig, Thresholds, Weights};
use super::factors::{Factor, FactorScoreSet};
use super::registry::{FactorInput, FactorRegistry};

/// Qualitative band for a total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationTier {
    Good,
    Caution,
    Concern,
    Warning,
}

impl EvaluationTier {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => EvaluationTier::Good,
            60..=79 => EvaluationTier::Caution,
            40..=59 => EvaluationTier::Concern,
            _ => EvaluationTier::Warning,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EvaluationTier::Good => "Good",
            EvaluationTier::Caution => "Caution",
            EvaluationTier::Concern => "Concern",
            EvaluationTier::Warning => "Warning",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            EvaluationTier::Good => "You should be in good shape. Carry on as usual.",
            EvaluationTier::Caution => "Take it a little easy and avoid overdoing things.",
            EvaluationTier::Concern => {
                "You may feel off. Prioritise sleep and proper meals."
            }
            EvaluationTier::Warning => "Conditions are rough. Make rest your priority.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: Factor,
    pub score: f64,
    pub weight: f64,
    /// weight x score
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total_score: u32,
    pub tier: EvaluationTier,
    /// A weighted factor had no score and contributed nothing
    pub incomplete: bool,
    pub breakdown: Vec<FactorContribution>,
}

/// Weighted sum of factor scores, rounded into [0, 100].
///
/// Factors the weights name but the set lacks add nothing to the sum and
/// mark the result incomplete.
pub fn compute_total(scores: &FactorScoreSet, weights: &Weights) -> ScoreResult {
    let mut weighted_sum = 0.0;
    let mut incomplete = false;
    let mut breakdown = Vec::new();

    for (factor, weight) in weights.iter() {
        match scores.get(factor) {
            Some(score) => {
                let contribution = weight * score;
                weighted_sum += contribution;
                breakdown.push(FactorContribution {
                    factor,
                    score,
                    weight,
                    contribution,
                });
            }
            None if weight > 0.0 => incomplete = true,
            None => {}
        }
    }

    let total_score = weighted_sum.round().clamp(0.0, 100.0) as u32;

    ScoreResult {
        total_score,
        tier: EvaluationTier::from_score(total_score),
        incomplete,
        breakdown,
    }
}

/// A weight profile bound to thresholds and a factor registry.
#[derive(Debug, Clone)]
pub struct Scorer {
    weights: Weights,
    thresholds: Thresholds,
    registry: FactorRegistry,
}

impl Scorer {
    pub fn new(weights: Weights, thresholds: Thresholds, registry: FactorRegistry) -> Self {
        Self {
            weights,
            thresholds,
            registry,
        }
    }

    /// Scorer for hourly timeline points.
    pub fn hourly(config: &ScoringConfig) -> Self {
        Self::new(
            config.hourly_weights.clone(),
            config.thresholds.clone(),
            FactorRegistry::with_pressure_curve(config.pressure_curve),
        )
    }

    /// Scorer for whole-day outlook points.
    pub fn daily(config: &ScoringConfig) -> Self {
        Self::new(
            config.daily_weights.clone(),
            config.thresholds.clone(),
            FactorRegistry::with_pressure_curve(config.pressure_curve),
        )
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Score every factor this profile names.
    pub fn compute_factor_scores(&self, input: &FactorInput<'_>) -> FactorScoreSet {
        self.registry
            .evaluate(self.weights.factors(), input, &self.thresholds)
    }

    pub fn compute_total(&self, scores: &FactorScoreSet) -> ScoreResult {
        compute_total(scores, &self.weights)
    }

    pub fn score(&self, input: &FactorInput<'_>) -> (FactorScoreSet, ScoreResult) {
        let scores = self.compute_factor_scores(input);
        let result = self.compute_total(&scores);
        (scores, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ScheduleFlags;
    use crate::scoring::ScheduleLoad;
    use crate::weather::RawSample;
    use chrono::{TimeZone, Utc};

    fn uniform(weights: &Weights, score: f64) -> FactorScoreSet {
        weights.factors().map(|f| (f, score)).collect()
    }

    #[test]
    fn test_all_hundred_totals_hundred() {
        for weights in [Weights::hourly_default(), Weights::daily_default()] {
            let result = compute_total(&uniform(&weights, 100.0), &weights);
            assert_eq!(result.total_score, 100);
            assert_eq!(result.tier, EvaluationTier::Good);
            assert!(!result.incomplete);
        }
    }

    #[test]
    fn test_all_zero_totals_zero() {
        for weights in [Weights::hourly_default(), Weights::daily_default()] {
            let result = compute_total(&uniform(&weights, 0.0), &weights);
            assert_eq!(result.total_score, 0);
            assert_eq!(result.tier, EvaluationTier::Warning);
        }
    }

    #[test]
    fn test_weighted_sum_rounds() {
        let weights = Weights::new([(Factor::Temperature, 0.5), (Factor::Humidity, 0.5)]);
        let scores: FactorScoreSet = [(Factor::Temperature, 70.0), (Factor::Humidity, 75.0)]
            .into_iter()
            .collect();
        // 35 + 37.5 = 72.5 rounds half up
        let result = compute_total(&scores, &weights);
        assert_eq!(result.total_score, 73);
        assert_eq!(result.tier, EvaluationTier::Caution);
        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.breakdown[1].contribution, 37.5);
    }

    #[test]
    fn test_missing_weighted_factor_marks_incomplete() {
        let weights = Weights::new([(Factor::Temperature, 0.5), (Factor::Humidity, 0.5)]);
        let scores: FactorScoreSet = [(Factor::Temperature, 60.0)].into_iter().collect();
        let result = compute_total(&scores, &weights);
        assert!(result.incomplete);
        // The missing half contributes nothing
        assert_eq!(result.total_score, 30);
        assert_eq!(result.tier, EvaluationTier::Warning);
        assert_eq!(result.breakdown.len(), 1);
    }

    #[test]
    fn test_few_present_factors_do_not_total_hundred() {
        let weights = Weights::hourly_default();
        let scores: FactorScoreSet = [(Factor::AirQuality, 100.0), (Factor::Schedule, 100.0)]
            .into_iter()
            .collect();
        let result = compute_total(&scores, &weights);
        assert!(result.incomplete);
        // 0.10 x 100 + 0.25 x 100
        assert_eq!(result.total_score, 35);
    }

    #[test]
    fn test_missing_zero_weight_factor_is_complete() {
        let weights = Weights::hourly_default();
        let scores: FactorScoreSet = weights
            .factors()
            .filter(|f| *f != Factor::PressureDelta12h)
            .map(|f| (f, 100.0))
            .collect();
        let result = compute_total(&scores, &weights);
        assert!(!result.incomplete);
        assert_eq!(result.total_score, 100);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(EvaluationTier::from_score(100), EvaluationTier::Good);
        assert_eq!(EvaluationTier::from_score(80), EvaluationTier::Good);
        assert_eq!(EvaluationTier::from_score(79), EvaluationTier::Caution);
        assert_eq!(EvaluationTier::from_score(60), EvaluationTier::Caution);
        assert_eq!(EvaluationTier::from_score(59), EvaluationTier::Concern);
        assert_eq!(EvaluationTier::from_score(40), EvaluationTier::Concern);
        assert_eq!(EvaluationTier::from_score(39), EvaluationTier::Warning);
        assert_eq!(EvaluationTier::from_score(0), EvaluationTier::Warning);
    }

    #[test]
    fn test_daily_scorer_end_to_end() {
        // Mild winter day: 8°C, 55%, 1015 hPa, clear skies, one meeting
        let sample = RawSample {
            temperature: Some(8.0),
            humidity: Some(55.0),
            pressure: Some(1015.0),
            cloud_coverage: Some(0.0),
            ..RawSample::empty(Utc.with_ymd_and_hms(2026, 2, 10, 3, 0, 0).unwrap())
        };
        let flags = ScheduleFlags {
            has_meetings: true,
            ..ScheduleFlags::default()
        };
        let mut input = FactorInput::new(&sample, 12, ScheduleLoad::Day(flags));
        input.aqi = Some(40.0);

        let scorer = Scorer::daily(&ScoringConfig::default());
        let (scores, result) = scorer.score(&input);

        assert_eq!(scores.get(Factor::Schedule), Some(85.0));
        assert_eq!(scores.get(Factor::TemperatureDifference), Some(100.0));
        // 0.75 x 100 + 0.25 x 85 = 96.25
        assert_eq!(result.total_score, 96);
        assert!(!result.incomplete);
    }

    #[test]
    fn test_hourly_scorer_busy_hour() {
        let sample = RawSample {
            temperature: Some(8.0),
            humidity: Some(55.0),
            pressure: Some(1015.0),
            cloud_coverage: Some(0.0),
            ..RawSample::empty(Utc.with_ymd_and_hms(2026, 2, 10, 3, 0, 0).unwrap())
        };
        let mut input = FactorInput::new(&sample, 12, ScheduleLoad::Hour { busy: true });
        input.temp_delta_12h = Some(0.0);
        input.pressure_delta_12h = Some(0.0);

        let scorer = Scorer::hourly(&ScoringConfig::default());
        let (_, result) = scorer.score(&input);
        // Everything perfect except the schedule (0.25 weight)
        assert_eq!(result.total_score, 75);
        assert_eq!(result.tier, EvaluationTier::Caution);
    }
}
