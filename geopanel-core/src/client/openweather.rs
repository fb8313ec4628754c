use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::client::{FetchError, http_client, truncate_body};
use crate::model::{Coordinate, WeatherSnapshot};

const ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";
const SERVICE: &str = "openweather";

/// Current-weather-by-coordinate lookup (metric units).
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self { api_key, http: http_client(timeout)? })
    }

    pub async fn current(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, FetchError> {
        let res = self
            .http
            .get(ENDPOINT)
            .query(&[
                ("lat", coordinate.latitude().to_string()),
                ("lon", coordinate.longitude().to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Transport { service: SERVICE, source })?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|source| FetchError::Transport { service: SERVICE, source })?;

        parse_current(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    description: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: MainBlock,
    weather: Vec<ConditionBlock>,
}

pub fn parse_current(status: u16, body: &str) -> Result<WeatherSnapshot, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::Status {
            service: SERVICE,
            status,
            body: truncate_body(body),
        });
    }

    let parsed: CurrentResponse =
        serde_json::from_str(body).map_err(|source| FetchError::Parse { service: SERVICE, source })?;

    let condition = parsed
        .weather
        .first()
        .map(|c| c.description.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(WeatherSnapshot {
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        temp_min_c: parsed.main.temp_min,
        temp_max_c: parsed.main.temp_max,
        humidity_pct: parsed.main.humidity,
        condition,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONDON_BODY: &str = r#"{
        "name": "London",
        "main": {
            "temp": 14.2,
            "feels_like": 13.1,
            "temp_min": 12.0,
            "temp_max": 16.3,
            "humidity": 72
        },
        "weather": [{"description": "light rain"}]
    }"#;

    #[test]
    fn parses_current_weather() {
        let snapshot = parse_current(200, LONDON_BODY).expect("valid body");

        assert_eq!(snapshot.temperature_c, 14.2);
        assert_eq!(snapshot.feels_like_c, 13.1);
        assert_eq!(snapshot.temp_min_c, 12.0);
        assert_eq!(snapshot.temp_max_c, 16.3);
        assert_eq!(snapshot.humidity_pct, 72);
        assert_eq!(snapshot.condition, "light rain");
    }

    #[test]
    fn empty_conditions_fall_back_to_unknown() {
        let body = r#"{
            "main": {"temp": 1.0, "feels_like": 1.0, "temp_min": 0.0, "temp_max": 2.0, "humidity": 50},
            "weather": []
        }"#;

        let snapshot = parse_current(200, body).expect("valid body");
        assert_eq!(snapshot.condition, "Unknown");
    }

    #[test]
    fn http_error_becomes_status_error() {
        let err = parse_current(401, r#"{"cod":401,"message":"Invalid API key"}"#).unwrap_err();
        match err {
            FetchError::Status { service, status, body } => {
                assert_eq!(service, "openweather");
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_body_becomes_parse_error() {
        let err = parse_current(200, "not json").unwrap_err();
        assert!(matches!(err, FetchError::Parse { service: "openweather", .. }));
    }

    #[test]
    fn missing_fields_never_yield_partial_snapshot() {
        let err = parse_current(200, r#"{"main": {"temp": 3.0}}"#).unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }
}
