use chrono::{DateTime, TimeZone, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt::Display;
use std::io::IsTerminal;

use crate::fetch::{CurrentCondition, ForecastReport};
use crate::history::HistoryStats;
use crate::scoring::EvaluationTier;
use crate::timeline::{DailyOutlook, ScoredHour, Timeline};
use crate::weather::RawSample;

const BAR_WIDTH: usize = 20;
const RULE: &str = "─────────────────────";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Fixed-width bar for a 0-100 score: "[█████░░░...]"
pub fn score_bar(score: u32) -> String {
    let filled = ((score.min(100) as f64 / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}]",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled)
    )
}

/// Score with an asterisk when some weighted factor was missing
pub fn format_score(score: u32, incomplete: bool) -> String {
    if incomplete {
        format!("{}*", score)
    } else {
        score.to_string()
    }
}

fn paint_tier(text: &str, tier: EvaluationTier, use_colors: bool) -> String {
    if !use_colors {
        return text.to_string();
    }
    match tier {
        EvaluationTier::Good => text.green().to_string(),
        EvaluationTier::Caution => text.yellow().to_string(),
        EvaluationTier::Concern => text.magenta().to_string(),
        EvaluationTier::Warning => text.red().bold().to_string(),
    }
}

fn heading(text: &str, use_colors: bool) -> String {
    if use_colors {
        format!("{}\n{}", text.bold(), RULE.dimmed())
    } else {
        format!("{}\n{}", text, RULE)
    }
}

fn fmt_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1}{}", v, unit),
        None => "-".to_string(),
    }
}

fn local<Tz: TimeZone>(ts: DateTime<Utc>, tz: &Tz, pattern: &str) -> String
where
    Tz::Offset: Display,
{
    ts.with_timezone(tz).format(pattern).to_string()
}

fn format_weather(sample: &RawSample) -> String {
    let mut lines = vec![
        format!(
            "Temperature: {} (feels like {})",
            fmt_value(sample.temperature, "°C"),
            fmt_value(sample.feels_like, "°C")
        ),
        format!("Humidity: {}", fmt_value(sample.humidity, "%")),
        format!("Pressure: {}", fmt_value(sample.pressure, " hPa")),
        format!("Cloud cover: {}", fmt_value(sample.cloud_coverage, "%")),
    ];
    if let Some(description) = &sample.description {
        lines.push(format!("Conditions: {}", description));
    }
    lines.join("\n")
}

/// Detailed report for the current hour
pub fn format_current<Tz: TimeZone>(current: &CurrentCondition, tz: &Tz, use_colors: bool) -> String
where
    Tz::Offset: Display,
{
    let result = &current.result;
    let tier = result.tier;
    let mut out = Vec::new();

    out.push(local(current.timestamp, tz, "%Y-%m-%d %H:%M"));
    let score_line = format!(
        "Condition score: {}/100 {}",
        format_score(result.total_score, result.incomplete),
        score_bar(result.total_score)
    );
    out.push(paint_tier(&score_line, tier, use_colors));
    out.push(format!("Rating: {}", paint_tier(tier.label(), tier, use_colors)));
    out.push(format!("Advice: {}", tier.advice()));
    out.push(String::new());

    out.push(heading("Factor scores", use_colors));
    for part in &result.breakdown {
        let score = part.score.round() as u32;
        out.push(format!(
            "{:<24} {:>3}/100 {}",
            part.factor.label(),
            score,
            score_bar(score)
        ));
    }
    out.push(String::new());

    out.push(heading("Weather", use_colors));
    out.push(format_weather(&current.sample));
    out.push(String::new());

    if current.risks.is_empty() {
        out.push("No particular concerns.".to_string());
    } else {
        out.push(heading("Risks", use_colors));
        for risk in &current.risks {
            out.push(format!("• {}", risk.factor.label()));
            out.push(format!("  Issue: {}", risk.issue));
            out.push(format!("  Impact: {}", risk.impact));
        }
    }
    out.push(String::new());

    out.push(heading("Recommendations", use_colors));
    for line in &current.recommendations {
        out.push(format!("• {}", line));
    }

    out.join("\n")
}

fn format_hour_row<Tz: TimeZone>(
    hour: &ScoredHour,
    tz: &Tz,
    is_now: bool,
    use_colors: bool,
) -> String
where
    Tz::Offset: Display,
{
    let marker = if is_now { ">" } else { " " };
    let when = local(hour.timestamp, tz, "%a %m-%d %H:00");

    let (score, tier) = match (hour.total_score, hour.tier()) {
        (Some(score), Some(tier)) => (score, tier),
        _ => {
            let row = format!("{} {}    -", marker, when);
            return if use_colors { row.dimmed().to_string() } else { row };
        }
    };

    let temperature = hour.raw_sample.as_ref().and_then(|s| s.temperature);
    let row = format!(
        "{} {} {:>4} {} {:<8} {:>7}",
        marker,
        when,
        score,
        score_bar(score),
        tier.label(),
        fmt_value(temperature, "°C")
    );
    paint_tier(&row, tier, use_colors)
}

/// One row per grid hour, with `>` on the hour containing `now`
pub fn format_hourly_table<Tz: TimeZone>(
    timeline: &Timeline,
    tz: &Tz,
    now: DateTime<Utc>,
    use_colors: bool,
) -> String
where
    Tz::Offset: Display,
{
    if timeline.is_empty() {
        return "No hourly data.".to_string();
    }
    let current = timeline.at(now).map(|h| h.timestamp);
    timeline
        .iter()
        .map(|hour| format_hour_row(hour, tz, Some(hour.timestamp) == current, use_colors))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per forecast day
pub fn format_daily(days: &[DailyOutlook], use_colors: bool) -> String {
    if days.is_empty() {
        return "No daily outlook available.".to_string();
    }
    days.iter()
        .map(|day| {
            let result = &day.result;
            let line = format!(
                "{}  {:>4} {} {:<8} {} / {}  rain {:.1}mm",
                day.date.format("%a %m-%d"),
                format_score(result.total_score, result.incomplete),
                score_bar(result.total_score),
                result.tier.label(),
                fmt_value(day.temp_max, "°C"),
                fmt_value(day.temp_min, "°C"),
                day.rain_total
            );
            paint_tier(&line, result.tier, use_colors)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full text report: current hour, daily outlook and hourly table
pub fn format_report<Tz: TimeZone>(report: &ForecastReport, tz: &Tz, use_colors: bool) -> String
where
    Tz::Offset: Display,
{
    let mut sections = Vec::new();
    match &report.current {
        Some(current) => sections.push(format_current(current, tz, use_colors)),
        None => sections.push("No data for the current hour.".to_string()),
    }
    sections.push(format!(
        "{}\n{}",
        heading("Daily outlook", use_colors),
        format_daily(&report.daily, use_colors)
    ));
    sections.push(format!(
        "{}\n{}",
        heading("Hourly", use_colors),
        format_hourly_table(&report.timeline, tz, report.generated_at, use_colors)
    ));
    sections.join("\n\n")
}

/// Summary of recorded daily scores
pub fn format_history_stats(stats: &HistoryStats, days: i64, use_colors: bool) -> String {
    let mut out = vec![heading(&format!("Last {} days", days), use_colors)];
    out.push(format!("Average: {}", stats.average));
    out.push(format!("Best: {}  Worst: {}", stats.max, stats.min));
    out.push(format!("Latest: {}", stats.latest));
    out.push(format!("Trend: {}", stats.trend));
    out.push(String::new());
    for day in &stats.daily {
        let tier = EvaluationTier::from_score(day.average);
        let line = format!(
            "{}  {:>3} {}  ({} h)",
            day.date.format("%a %m-%d"),
            day.average,
            score_bar(day.average),
            day.hours
        );
        out.push(paint_tier(&line, tier, use_colors));
    }
    out.join("\n")
}

/// Pretty JSON for any report value
pub fn format_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{DailyScore, Trend};
    use crate::scoring::{AnalysisContext, Factor, FactorScoreSet, ScoringConfig, Scorer};
    use crate::timeline::HourGrid;
    use chrono::{Duration, FixedOffset, NaiveDate};

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn sample(ts: DateTime<Utc>) -> RawSample {
        RawSample {
            temperature: Some(2.0),
            humidity: Some(50.0),
            pressure: Some(1012.0),
            cloud_coverage: Some(40.0),
            feels_like: Some(-1.0),
            description: Some("light snow".to_string()),
            ..RawSample::empty(ts)
        }
    }

    fn current() -> CurrentCondition {
        let ts = Utc.with_ymd_and_hms(2026, 1, 10, 3, 0, 0).unwrap();
        let raw = sample(ts);
        let scores: FactorScoreSet = [
            (Factor::Temperature, 40.0),
            (Factor::Humidity, 100.0),
            (Factor::Illumination, 60.0),
        ]
        .into_iter()
        .collect();
        let scorer = Scorer::hourly(&ScoringConfig::default());
        let result = scorer.compute_total(&scores);
        let flags = Default::default();
        let risks = crate::scoring::analyze(
            &scores,
            &AnalysisContext {
                sample: &raw,
                aqi: Some(40.0),
                flags,
            },
        );
        let recommendations = crate::scoring::recommendations(result.tier, &risks);
        CurrentCondition {
            timestamp: ts,
            result,
            sample: raw,
            schedule: flags,
            risks,
            recommendations,
        }
    }

    #[test]
    fn test_score_bar() {
        assert_eq!(score_bar(0), format!("[{}]", "░".repeat(20)));
        assert_eq!(score_bar(100), format!("[{}]", "█".repeat(20)));
        assert_eq!(
            score_bar(72),
            format!("[{}{}]", "█".repeat(14), "░".repeat(6))
        );
        // Out-of-range scores are capped
        assert_eq!(score_bar(250), score_bar(100));
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(72, false), "72");
        assert_eq!(format_score(72, true), "72*");
    }

    #[test]
    fn test_format_current_plain() {
        let text = format_current(&current(), &jst(), false);
        assert!(text.starts_with("2026-01-10 12:00"));
        assert!(text.contains("Condition score: "));
        assert!(text.contains("Temperature: 2.0°C (feels like -1.0°C)"));
        assert!(text.contains("Conditions: light snow"));
        assert!(text.contains("Risks"));
        assert!(text.contains("Recommendations"));
        // Plain output carries no escape codes
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_format_current_colored() {
        let text = format_current(&current(), &jst(), true);
        assert!(text.contains('\u{1b}'));
    }

    #[test]
    fn test_hourly_table_marks_now() {
        let grid = HourGrid::starting_at(Utc.with_ymd_and_hms(2026, 1, 9, 15, 0, 0).unwrap(), &jst());
        let timeline = Timeline::from_grid(&grid, |slot| {
            if slot.index == 2 {
                ScoredHour {
                    total_score: Some(81),
                    factor_scores: Some(FactorScoreSet::new()),
                    raw_sample: Some(sample(slot.timestamp)),
                    ..ScoredHour::empty(slot.timestamp, slot.hour)
                }
            } else {
                ScoredHour::empty(slot.timestamp, slot.hour)
            }
        });
        let now = grid.start() + Duration::minutes(150);
        let text = format_hourly_table(&timeline, &jst(), now, false);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 72);
        assert!(lines[0].starts_with("  "));
        assert!(lines[0].ends_with("-"));
        assert!(lines[2].starts_with("> "));
        assert!(lines[2].contains("02:00"));
        assert!(lines[2].contains("Good"));
        assert!(lines[2].contains("2.0°C"));
    }

    #[test]
    fn test_format_daily_empty() {
        assert_eq!(format_daily(&[], false), "No daily outlook available.");
    }

    #[test]
    fn test_format_history_stats() {
        let stats = HistoryStats {
            average: 70,
            max: 85,
            min: 55,
            latest: 85,
            trend: Trend::Up,
            daily: vec![DailyScore {
                date: NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(),
                average: 85,
                hours: 24,
            }],
        };
        let text = format_history_stats(&stats, 7, false);
        assert!(text.starts_with("Last 7 days"));
        assert!(text.contains("Best: 85  Worst: 55"));
        assert!(text.contains("Trend: up"));
        assert!(text.contains("(24 h)"));
    }

    #[test]
    fn test_format_json() {
        let json = format_json(&current()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["timestamp"], "2026-01-10T03:00:00Z");
        assert!(value["result"]["total_score"].is_u64());
        assert!(value["risks"].is_array());
    }
}
