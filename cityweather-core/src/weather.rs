use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::model::CurrentConditions;

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// The weather lookup failed: transport error, non-success status, or a
/// payload without a usable current-weather record.
#[derive(Debug, Error)]
#[error("Failed to fetch weather: {0}")]
pub struct UpstreamError(pub String);

/// Fetches current conditions from the Open-Meteo forecast API.
///
/// No retries and no caching: every call is a fresh request, and staleness
/// is bounded only by the caller's refresh cadence.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            base_url: FORECAST_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    pub async fn fetch_current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentConditions, UpstreamError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current_weather", "true".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| UpstreamError(format!("request failed: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| UpstreamError(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(UpstreamError(format!(
                "status {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        let parsed: ForecastResponse = serde_json::from_str(&body)
            .map_err(|e| UpstreamError(format!("malformed response: {e}")))?;

        Ok(parsed.current_weather.into())
    }
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeatherDto,
}

/// Field names as the API spells them.
#[derive(Debug, Deserialize)]
struct CurrentWeatherDto {
    temperature: f64,
    windspeed: f64,
    winddirection: f64,
    weathercode: i32,
    time: String,
}

impl From<CurrentWeatherDto> for CurrentConditions {
    fn from(w: CurrentWeatherDto) -> Self {
        Self {
            temperature_c: w.temperature,
            wind_speed_kmh: w.windspeed,
            wind_direction_deg: w.winddirection,
            weather_code: w.weathercode,
            observed_at: w.time,
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    let prefix: String = body.chars().take(MAX).collect();
    if prefix.len() < body.len() {
        format!("{prefix}...")
    } else {
        prefix
    }
}
