//! Provider credentials, read from the environment only.

/// OpenWeather API key (required for live forecasts)
pub const ENV_OWM_KEY: &str = "CONDITION_FORECAST_OWM_KEY";

/// WAQI token; AQI falls back to the configured default without it
pub const ENV_WAQI_TOKEN: &str = "CONDITION_FORECAST_WAQI_TOKEN";

/// Calendar bearer token; the schedule is empty without it
pub const ENV_CALENDAR_TOKEN: &str = "CONDITION_FORECAST_CALENDAR_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    pub weather_key: Option<String>,
    pub aqi_token: Option<String>,
    pub calendar_token: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            weather_key: get_token_from_env(ENV_OWM_KEY),
            aqi_token: get_token_from_env(ENV_WAQI_TOKEN),
            calendar_token: get_token_from_env(ENV_CALENDAR_TOKEN),
        }
    }
}

/// Returns Some(token) if the env var is set and non-empty, None otherwise.
pub fn get_token_from_env(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(val) => {
            let trimmed = val.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_token_from_env() {
        let var = "CONDITION_FORECAST_TEST_TOKEN_TRIM";
        std::env::set_var(var, "  abc123 \n");
        assert_eq!(get_token_from_env(var), Some("abc123".to_string()));

        std::env::set_var(var, "   ");
        assert_eq!(get_token_from_env(var), None);

        std::env::remove_var(var);
        assert_eq!(get_token_from_env(var), None);
    }
}
