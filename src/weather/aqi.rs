use reqwest::Client;
use serde_json::Value;

use crate::config::Location;
use crate::http::{get_json, ProviderError};

const WAQI_URL: &str = "https://api.waqi.info/feed";

/// Pull the AQI out of a WAQI feed response.
///
/// WAQI reports `"status": "error"` with a 200, and uses `"-"` when a station
/// has no reading.
pub fn parse_aqi(body: &Value) -> Result<f64, ProviderError> {
    match body.get("status").and_then(Value::as_str) {
        Some("ok") => {}
        Some(_) => {
            let msg = body
                .get("data")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(ProviderError::Parse(format!("WAQI: {}", msg)));
        }
        None => return Err(ProviderError::Parse("WAQI: missing status".to_string())),
    }

    let aqi = body.get("data").and_then(|d| d.get("aqi"));
    match aqi {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ProviderError::Parse("WAQI: aqi out of range".to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ProviderError::Parse(format!("WAQI: no reading ('{}')", s))),
        _ => Err(ProviderError::Parse("WAQI: missing aqi".to_string())),
    }
}

/// Current AQI at the nearest station to `location`.
pub async fn fetch_aqi(
    client: &Client,
    token: &str,
    location: &Location,
) -> Result<f64, ProviderError> {
    let url = format!(
        "{}/geo:{};{}/?token={}",
        WAQI_URL, location.lat, location.lon, token
    );
    let body: Value = get_json(client, "WAQI", &url, None).await?;
    parse_aqi(&body)
}
