//! OpenSky Network API client.
//!
//! Queries `/states/all` for a bounding box and converts the positional
//! state-vector rows into the shared `StateVector` type.

pub mod rate_limit;

use std::error::Error as StdError;

use common::config::OpenSkyConfig;
use common::{BoundingBox, Error, StateVector};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub use rate_limit::RateLimiter;

// Column positions in a `states/all` row.
const COL_ICAO24: usize = 0;
const COL_CALLSIGN: usize = 1;
const COL_ORIGIN_COUNTRY: usize = 2;
const COL_LONGITUDE: usize = 5;
const COL_LATITUDE: usize = 6;
const COL_BARO_ALTITUDE: usize = 7;
const COL_ON_GROUND: usize = 8;
const COL_VELOCITY: usize = 9;
const COL_TRUE_TRACK: usize = 10;
const COL_VERTICAL_RATE: usize = 11;

/// OpenSky client with connection pooling and a shared request budget.
#[derive(Debug, Clone)]
pub struct OpenSkyClient {
    client: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

/// Response from `/states/all`.
#[derive(Debug, Deserialize)]
pub struct StatesResponse {
    #[serde(default)]
    pub time: Option<i64>,
    /// `null` when nothing is airborne in the box.
    #[serde(default)]
    pub states: Option<Vec<Vec<Value>>>,
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn format_reqwest_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !cause_msg.is_empty() && !message.contains(&cause_msg) {
            message.push_str(": ");
            message.push_str(&cause_msg);
        }
        source = cause.source();
    }

    message
}

impl OpenSkyClient {
    pub fn new(config: &OpenSkyConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("flight-board/0.1")
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .expect("failed to build OpenSky HTTP client");

        Self {
            client,
            base_url: normalize_base_url(&config.base_url),
            limiter: RateLimiter::per_second(config.requests_per_sec),
        }
    }

    /// Fetch every state vector inside `bbox`.
    ///
    /// Rows without a transponder address are skipped.
    pub async fn fetch_states(&self, bbox: BoundingBox) -> Result<Vec<StateVector>, Error> {
        self.limiter.wait().await;

        let url = format!("{}/states/all", self.base_url);
        let query = [
            ("lamin", bbox.lamin.to_string()),
            ("lomin", bbox.lomin.to_string()),
            ("lamax", bbox.lamax.to_string()),
            ("lomax", bbox.lomax.to_string()),
        ];

        debug!(
            "Fetching OpenSky states: {} lamin={} lomin={} lamax={} lomax={}",
            url, bbox.lamin, bbox.lomin, bbox.lamax, bbox.lomax
        );

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| Error::Http(format_reqwest_error(&e)))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::OpenSky(format!(
                "OpenSky returned {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        let payload: StatesResponse = resp
            .json()
            .await
            .map_err(|e| Error::OpenSky(format!("JSON parse error: {}", format_reqwest_error(&e))))?;

        let states = parse_states(payload);
        debug!("Got {} state vectors", states.len());
        Ok(states)
    }
}

/// Convert a `states/all` payload into state vectors, keeping row order.
pub fn parse_states(payload: StatesResponse) -> Vec<StateVector> {
    payload
        .states
        .unwrap_or_default()
        .iter()
        .filter_map(|row| parse_state_row(row))
        .collect()
}

/// Convert one positional row. Returns `None` when the address is missing.
pub fn parse_state_row(row: &[Value]) -> Option<StateVector> {
    let icao24 = row
        .get(COL_ICAO24)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    Some(StateVector {
        icao24,
        callsign: text_at(row, COL_CALLSIGN),
        origin_country: text_at(row, COL_ORIGIN_COUNTRY),
        longitude: number_at(row, COL_LONGITUDE),
        latitude: number_at(row, COL_LATITUDE),
        baro_altitude: number_at(row, COL_BARO_ALTITUDE),
        on_ground: row
            .get(COL_ON_GROUND)
            .and_then(Value::as_bool)
            .unwrap_or(false),
        velocity: number_at(row, COL_VELOCITY),
        true_track: number_at(row, COL_TRUE_TRACK),
        vertical_rate: number_at(row, COL_VERTICAL_RATE),
    })
}

fn text_at(row: &[Value], idx: usize) -> Option<String> {
    row.get(idx)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number_at(row: &[Value], idx: usize) -> Option<f64> {
    row.get(idx).and_then(Value::as_f64)
}
