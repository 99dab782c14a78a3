use super::config::{ScoringConfig, SpreadPenalty, Thresholds, Weights};

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    check_weights("scoring.hourly_weights", &config.hourly_weights, &mut errors);
    check_weights("scoring.daily_weights", &config.daily_weights, &mut errors);
    check_thresholds(&config.thresholds, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Weight profiles that do not sum to 1.0. Not fatal; the caller logs these.
pub fn weight_sum_warnings(config: &ScoringConfig) -> Vec<String> {
    [
        ("scoring.hourly_weights", &config.hourly_weights),
        ("scoring.daily_weights", &config.daily_weights),
    ]
    .into_iter()
    .filter_map(|(path, weights)| {
        let sum = weights.sum();
        ((sum - 1.0).abs() > 1e-6).then(|| format!("{}: weights sum to {:.3}, not 1.0", path, sum))
    })
    .collect()
}

fn check_weights(path: &str, weights: &Weights, errors: &mut Vec<String>) {
    if weights.is_empty() {
        errors.push(format!("{}: at least one factor must be weighted", path));
        return;
    }
    for (factor, weight) in weights.iter() {
        if !weight.is_finite() || weight < 0.0 {
            errors.push(format!(
                "{}.{}: must be a non-negative number, got {}",
                path, factor.key(), weight
            ));
        }
    }
}

fn check_floor(path: &str, value: f64, errors: &mut Vec<String>) {
    if !(0.0..=100.0).contains(&value) {
        errors.push(format!("{}: must be within 0-100, got {}", path, value));
    }
}

fn check_order(path: &str, low: f64, high: f64, errors: &mut Vec<String>) {
    if low > high {
        errors.push(format!("{}: lower bound {} exceeds upper bound {}", path, low, high));
    }
}

fn check_spread(path: &str, spread: &SpreadPenalty, errors: &mut Vec<String>) {
    if spread.tolerance < 0.0 {
        errors.push(format!("{}.tolerance: must be non-negative", path));
    }
    if spread.rate < 0.0 {
        errors.push(format!("{}.rate: must be non-negative", path));
    }
    check_floor(&format!("{}.floor", path), spread.floor, errors);
}

fn check_thresholds(th: &Thresholds, errors: &mut Vec<String>) {
    let t = &th.temperature;
    check_order("scoring.thresholds.temperature.optimal_min", t.optimal_min, t.optimal_max, errors);
    check_order("scoring.thresholds.temperature.comfort_min", t.comfort_min, t.optimal_min, errors);
    check_order("scoring.thresholds.temperature.comfort_max", t.optimal_max, t.comfort_max, errors);
    check_floor("scoring.thresholds.temperature.comfort_edge_score", t.comfort_edge_score, errors);
    check_floor("scoring.thresholds.temperature.cold_floor", t.cold_floor, errors);
    check_floor("scoring.thresholds.temperature.hot_floor", t.hot_floor, errors);

    check_spread("scoring.thresholds.temperature_difference", &th.temperature_difference, errors);
    check_spread("scoring.thresholds.temperature_delta_12h", &th.temperature_delta_12h, errors);
    check_spread("scoring.thresholds.pressure_delta_12h", &th.pressure_delta_12h, errors);

    let h = &th.humidity;
    check_order("scoring.thresholds.humidity.comfort_min", h.comfort_min, h.comfort_max, errors);
    check_floor("scoring.thresholds.humidity.low_floor", h.low_floor, errors);
    check_floor("scoring.thresholds.humidity.high_floor", h.high_floor, errors);

    let i = &th.illumination;
    if i.default_sunrise > 23 || i.default_sunset > 24 {
        errors.push("scoring.thresholds.illumination: hours must be within 0-24".to_string());
    }
    check_order(
        "scoring.thresholds.illumination.default_sunrise",
        f64::from(i.default_sunrise),
        f64::from(i.default_sunset),
        errors,
    );
    check_floor("scoring.thresholds.illumination.night_score", i.night_score, errors);

    let aq = &th.air_quality;
    for (idx, pair) in aq.bands.windows(2).enumerate() {
        if pair[0].max >= pair[1].max {
            errors.push(format!(
                "scoring.thresholds.air_quality.bands[{}].max: bands must be in ascending order",
                idx + 1
            ));
        }
    }
    for (idx, band) in aq.bands.iter().enumerate() {
        check_floor(
            &format!("scoring.thresholds.air_quality.bands[{}].score", idx),
            band.score,
            errors,
        );
    }
    check_floor("scoring.thresholds.air_quality.worst_score", aq.worst_score, errors);

    let p = &th.pressure;
    check_order("scoring.thresholds.pressure.zero_floor", p.zero_floor, p.comfort_floor, errors);

    check_floor("scoring.thresholds.schedule.floor", th.schedule.floor, errors);
}
