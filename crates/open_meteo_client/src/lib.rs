//! Open-Meteo forecast API client.
//!
//! Fetches the `current_weather` block for a coordinate and converts it
//! to the shared `Weather` type.

use common::config::WeatherConfig;
use common::{Error, Weather};
use serde::Deserialize;
use tracing::debug;

/// Open-Meteo client. No API key is required.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

/// Response from `/forecast?current_weather=true`.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub current_weather: Option<CurrentWeather>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub windspeed: Option<f64>,
    #[serde(default)]
    pub weathercode: Option<i64>,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("flight-board/0.1")
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .expect("failed to build Open-Meteo HTTP client");

        Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Current conditions at `(lat, lon)`.
    ///
    /// A response without a `current_weather` block yields an empty
    /// `Weather`; transport and status failures are errors.
    pub async fn current_weather(&self, lat: f64, lon: f64) -> Result<Weather, Error> {
        let url = format!("{}/forecast", self.base_url);
        let query = [
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current_weather", "true".to_string()),
        ];

        debug!("Fetching Open-Meteo current weather: {} lat={} lon={}", url, lat, lon);

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::OpenMeteo(format!("HTTP error for ({lat},{lon}): {e}")))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::OpenMeteo(format!(
                "Open-Meteo returned {} for ({lat},{lon}): {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        let payload: ForecastResponse = resp
            .json()
            .await
            .map_err(|e| Error::OpenMeteo(format!("JSON parse error for ({lat},{lon}): {e}")))?;

        Ok(to_weather(payload))
    }
}

fn to_weather(payload: ForecastResponse) -> Weather {
    match payload.current_weather {
        Some(current) => Weather {
            temperature: current.temperature,
            wind_speed: current.windspeed,
            code: current.weathercode,
        },
        None => Weather::default(),
    }
}
