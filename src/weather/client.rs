use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::config::Location;
use crate::http::{get_json, ProviderError};
use crate::weather::types::RawSample;

const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Spacing of the provider's forecast points
pub const FORECAST_STEP_HOURS: i64 = 3;

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastItem>,
    pub city: Option<City>,
}

#[derive(Debug, Deserialize)]
pub struct City {
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastItem {
    pub dt: i64,
    pub main: MainBlock,
    pub wind: Option<WindBlock>,
    pub clouds: Option<CloudBlock>,
    pub visibility: Option<f64>,
    pub rain: Option<RainBlock>,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
pub struct MainBlock {
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct WindBlock {
    pub speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CloudBlock {
    pub all: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RainBlock {
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub description: Option<String>,
}

fn local_hour<Tz: TimeZone>(unix: Option<i64>, tz: &Tz) -> Option<u32> {
    let utc = DateTime::from_timestamp(unix?, 0)?;
    Some(utc.with_timezone(tz).hour())
}

/// Convert a forecast response into samples, sorted by time.
/// Items with an unrepresentable timestamp are dropped.
pub fn parse_forecast<Tz: TimeZone>(response: ForecastResponse, tz: &Tz) -> Vec<RawSample> {
    let (sunrise_hour, sunset_hour) = match &response.city {
        Some(city) => (local_hour(city.sunrise, tz), local_hour(city.sunset, tz)),
        None => (None, None),
    };

    let mut samples: Vec<RawSample> = response
        .list
        .into_iter()
        .filter_map(|item| {
            let timestamp = DateTime::from_timestamp(item.dt, 0)?;
            let rain_volume = match item.rain {
                Some(rain) => rain.three_hours.or(rain.one_hour).or(Some(0.0)),
                None => Some(0.0),
            };
            Some(RawSample {
                timestamp,
                temperature: item.main.temp,
                humidity: item.main.humidity,
                pressure: item.main.pressure,
                cloud_coverage: item.clouds.and_then(|c| c.all),
                wind_speed: item.wind.and_then(|w| w.speed),
                feels_like: item.main.feels_like,
                visibility: item.visibility,
                rain_volume,
                description: item.weather.into_iter().next().and_then(|c| c.description),
                sunrise_hour,
                sunset_hour,
            })
        })
        .collect();

    samples.sort_by_key(|s| s.timestamp);
    samples
}

/// Keep samples inside [start, end), widened by one provider step on each
/// side so the edges of the window still have interpolation neighbours.
pub fn clip_to_window(
    samples: Vec<RawSample>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<RawSample> {
    let margin = Duration::hours(FORECAST_STEP_HOURS);
    samples
        .into_iter()
        .filter(|s| s.timestamp >= start - margin && s.timestamp < end + margin)
        .collect()
}

/// Fetch the 5-day / 3-hour forecast for `location`.
pub async fn fetch_sparse_weather_samples<Tz: TimeZone>(
    client: &Client,
    api_key: &str,
    location: &Location,
    tz: &Tz,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<RawSample>, ProviderError> {
    let url = format!(
        "{}?lat={}&lon={}&appid={}&units=metric",
        FORECAST_URL, location.lat, location.lon, api_key
    );
    let response: ForecastResponse = get_json(client, "OpenWeather", &url, None).await?;
    let samples = clip_to_window(parse_forecast(response, tz), start, end);
    log::debug!("OpenWeather returned {} samples in window", samples.len());
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    const BODY: &str = r#"{
        "cod": "200",
        "list": [
            {
                "dt": 1767236400,
                "main": {"temp": 6.2, "feels_like": 3.1, "humidity": 58, "pressure": 1018},
                "wind": {"speed": 3.4},
                "clouds": {"all": 20},
                "visibility": 10000,
                "weather": [{"main": "Clouds", "description": "few clouds"}]
            },
            {
                "dt": 1767225600,
                "main": {"temp": 4.0, "humidity": 65, "pressure": 1019},
                "clouds": {"all": 75},
                "rain": {"3h": 0.6},
                "weather": []
            }
        ],
        "city": {"name": "Tokyo", "sunrise": 1767217200, "sunset": 1767252600}
    }"#;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    #[test]
    fn test_parse_forecast_sorts_and_maps_fields() {
        let response: ForecastResponse = serde_json::from_str(BODY).unwrap();
        let samples = parse_forecast(response, &jst());
        assert_eq!(samples.len(), 2);
        assert!(samples[0].timestamp < samples[1].timestamp);

        let first = &samples[0];
        assert_eq!(first.temperature, Some(4.0));
        assert_eq!(first.rain_volume, Some(0.6));
        assert_eq!(first.feels_like, None);
        assert_eq!(first.description, None);

        let second = &samples[1];
        assert_eq!(second.cloud_coverage, Some(20.0));
        assert_eq!(second.rain_volume, Some(0.0));
        assert_eq!(second.visibility, Some(10000.0));
        assert_eq!(second.description.as_deref(), Some("few clouds"));
    }

    #[test]
    fn test_empty_main_block_is_not_real_data() {
        let body = r#"{"list": [{"dt": 1767236400, "main": {}}]}"#;
        let response: ForecastResponse = serde_json::from_str(body).unwrap();
        let samples = parse_forecast(response, &Utc);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].rain_volume, Some(0.0));
        assert!(!samples[0].has_measurements());
    }

    #[test]
    fn test_sun_times_in_local_hours() {
        let response: ForecastResponse = serde_json::from_str(BODY).unwrap();
        let samples = parse_forecast(response, &jst());
        // 2025-12-31T21:40Z is 06:40 JST, 2026-01-01T07:30Z is 16:30 JST
        assert_eq!(samples[0].sunrise_hour, Some(6));
        assert_eq!(samples[0].sunset_hour, Some(16));
    }

    #[test]
    fn test_empty_list_parses() {
        let response: ForecastResponse = serde_json::from_str(r#"{"cod":"200"}"#).unwrap();
        assert!(parse_forecast(response, &Utc).is_empty());
    }

    #[test]
    fn test_clip_keeps_one_step_margin() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let samples: Vec<RawSample> = (-3..=6)
            .map(|i| RawSample::empty(base + Duration::hours(3 * i)))
            .collect();
        let start = base;
        let end = base + Duration::hours(12);
        let clipped = clip_to_window(samples, start, end);
        assert_eq!(clipped.first().unwrap().timestamp, base - Duration::hours(3));
        assert_eq!(clipped.last().unwrap().timestamp, base + Duration::hours(12));
    }
}
