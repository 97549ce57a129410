//! OpenWeatherMap current-conditions client.
//!
//! A single blocking GET per call. Non-200 answers are not errors: they come
//! back as `FetchOutcome::Failure` carrying the remote payload, so the caller
//! can show it in place of the report.

use crate::error::{DashboardError, Result};
use crate::structs::AnalysisConfig;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const OPENWEATHERMAP_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Current temperature of a city as reported by the weather service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentReading {
    pub city: String,
    pub temperature: f64,
    pub observed_at: DateTime<Utc>,
}

/// Non-success answer from the weather service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub status: u16,
    pub message: String,
    /// Response body, as JSON when it parses, otherwise as a string.
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(CurrentReading),
    Failure(FetchFailure),
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainBlock,
    dt: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
}

pub struct WeatherClient {
    http: reqwest::blocking::Client,
    base_url: String,
    units: String,
    lang: String,
}

impl WeatherClient {
    /// Builds a client against another endpoint, with an optional timeout.
    /// Without one, the HTTP client's defaults apply.
    pub fn with_base_url(
        config: &AnalysisConfig,
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self::from_client(builder.build()?, config, base_url))
    }

    /// Wraps an already configured HTTP client.
    pub fn from_client(http: reqwest::blocking::Client, config: &AnalysisConfig, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            units: config.units.clone(),
            lang: config.lang.clone(),
        }
    }

    /// Fetches the current temperature for `city`.
    ///
    /// # Errors
    ///
    /// Transport failures return `DashboardError::Http`; a 200 answer without
    /// a numeric `main.temp` returns `DashboardError::Parse`.
    pub fn fetch_current_temperature(&self, city: &str, api_key: &str) -> Result<FetchOutcome> {
        if api_key.trim().is_empty() {
            warn!("API key is empty, the weather service will likely reject the request");
        }

        debug!("GET {} q={} units={} lang={}", self.base_url, city, self.units, self.lang);
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("q", city),
                ("appid", api_key),
                ("units", self.units.as_str()),
                ("lang", self.lang.as_str()),
            ])
            .send()?;

        let status = response.status().as_u16();
        let body = response.text()?;
        debug!("Weather service answered {} ({} bytes)", status, body.len());

        interpret_response(city, status, &body)
    }
}

/// Maps a raw HTTP answer to a `FetchOutcome`.
pub fn interpret_response(city: &str, status: u16, body: &str) -> Result<FetchOutcome> {
    if status != 200 {
        let payload = serde_json::from_str::<Value>(body).unwrap_or_else(|_| Value::String(body.to_string()));
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());
        return Ok(FetchOutcome::Failure(FetchFailure {
            status,
            message,
            payload,
        }));
    }

    let parsed: WeatherResponse = serde_json::from_str(body)
        .map_err(|e| DashboardError::Parse(format!("weather response for {}: {}", city, e)))?;
    let observed_at = parsed
        .dt
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);

    Ok(FetchOutcome::Success(CurrentReading {
        city: city.to_string(),
        temperature: parsed.main.temp,
        observed_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_extracts_main_temp() {
        let outcome = interpret_response("Moscow", 200, r#"{"main": {"temp": 21.5}}"#).unwrap();
        match outcome {
            FetchOutcome::Success(reading) => {
                assert_eq!(reading.temperature, 21.5);
                assert_eq!(reading.city, "Moscow");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_success_uses_observation_time() {
        let body = r#"{"main": {"temp": -2.0, "humidity": 80}, "dt": 1700000000, "name": "Moscow"}"#;
        let FetchOutcome::Success(reading) = interpret_response("Moscow", 200, body).unwrap() else {
            panic!("expected success");
        };
        assert_eq!(reading.observed_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_failure_keeps_payload_unchanged() {
        let body = r#"{"cod": 404, "message": "city not found"}"#;
        let FetchOutcome::Failure(failure) = interpret_response("Atlantis", 404, body).unwrap() else {
            panic!("expected failure");
        };
        assert_eq!(failure.status, 404);
        assert_eq!(failure.message, "city not found");
        assert_eq!(failure.payload, json!({"cod": 404, "message": "city not found"}));
    }

    #[test]
    fn test_failure_with_non_json_body() {
        let FetchOutcome::Failure(failure) = interpret_response("Moscow", 502, "Bad Gateway").unwrap() else {
            panic!("expected failure");
        };
        assert_eq!(failure.message, "Bad Gateway");
        assert_eq!(failure.payload, Value::String("Bad Gateway".to_string()));
    }

    #[test]
    fn test_success_without_temperature_is_parse_error() {
        assert!(matches!(
            interpret_response("Moscow", 200, r#"{"weather": []}"#),
            Err(DashboardError::Parse(_))
        ));
    }
}
