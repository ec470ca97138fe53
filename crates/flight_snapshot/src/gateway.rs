//! Remote telemetry gateway.
//!
//! Fans a refresh out across every region concurrently, bounds each call
//! with its own deadline, and turns provider failures into per-region
//! reports so one bad region never sinks the others. Weather lookups get
//! the same treatment but collapse to an empty `Weather` on failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::config::SnapshotConfig;
use common::{BoundingBox, Error, Region, StateVector, Weather};
use dashmap::DashMap;
use futures_util::future::join_all;
use open_meteo_client::OpenMeteoClient;
use opensky_client::OpenSkyClient;
use serde::Serialize;
use tracing::{debug, warn};

// ── Provider seams ────────────────────────────────────────────────────

/// Source of live state vectors for a bounding box.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn fetch_states(&self, bbox: BoundingBox) -> Result<Vec<StateVector>, Error>;
}

/// Source of current conditions at a coordinate.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current_weather(&self, lat: f64, lon: f64) -> Result<Weather, Error>;
}

#[async_trait]
impl TelemetrySource for OpenSkyClient {
    async fn fetch_states(&self, bbox: BoundingBox) -> Result<Vec<StateVector>, Error> {
        OpenSkyClient::fetch_states(self, bbox).await
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn current_weather(&self, lat: f64, lon: f64) -> Result<Weather, Error> {
        OpenMeteoClient::current_weather(self, lat, lon).await
    }
}

// ── Region reports ────────────────────────────────────────────────────

/// Outcome of one region query.
///
/// A region that answered with no aircraft is `Ok(vec![])`; a region that
/// could not be queried is `Err`. The two are kept apart so the pipeline
/// can tell "quiet sky" from "no provider".
#[derive(Debug)]
pub struct RegionReport {
    pub region: String,
    pub result: Result<Vec<StateVector>, Error>,
}

impl RegionReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// States returned by the region, empty on failure.
    pub fn states(&self) -> &[StateVector] {
        match &self.result {
            Ok(states) => states,
            Err(_) => &[],
        }
    }
}

/// Last known condition of a region's feed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegionHealth {
    pub last_count: usize,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-region health, keyed by region code.
#[derive(Debug, Clone, Default)]
pub struct HealthBoard {
    inner: Arc<DashMap<String, RegionHealth>>,
}

impl HealthBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_success(&self, region: &str, count: usize) {
        let now = Utc::now();
        let mut entry = self.inner.entry(region.to_string()).or_default();
        entry.last_count = count;
        entry.last_success = Some(now);
        entry.last_error = None;
        entry.consecutive_failures = 0;
        entry.updated_at = Some(now);
    }

    fn record_failure(&self, region: &str, err: &Error) {
        let mut entry = self.inner.entry(region.to_string()).or_default();
        entry.last_count = 0;
        entry.last_error = Some(err.to_string());
        entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
        entry.updated_at = Some(Utc::now());
    }

    pub fn get(&self, region: &str) -> Option<RegionHealth> {
        self.inner.get(region).map(|e| e.clone())
    }

    /// All regions seen so far, sorted by code.
    pub fn entries(&self) -> Vec<(String, RegionHealth)> {
        let mut entries: Vec<(String, RegionHealth)> = self
            .inner
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

// ── Gateway ───────────────────────────────────────────────────────────

/// Query bounds applied by the gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub region_cap: usize,
    pub region_margin_deg: f64,
    pub region_timeout: Duration,
    pub weather_timeout: Duration,
}

impl From<&SnapshotConfig> for GatewaySettings {
    fn from(config: &SnapshotConfig) -> Self {
        Self {
            region_cap: config.region_cap,
            region_margin_deg: config.region_margin_deg,
            region_timeout: Duration::from_millis(config.region_timeout_ms),
            weather_timeout: Duration::from_millis(config.weather_timeout_ms),
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self::from(&SnapshotConfig::default())
    }
}

/// Best-effort access to the telemetry and weather providers.
#[derive(Clone)]
pub struct Gateway {
    telemetry: Arc<dyn TelemetrySource>,
    weather: Arc<dyn WeatherSource>,
    settings: GatewaySettings,
    health: HealthBoard,
}

impl Gateway {
    pub fn new(
        telemetry: Arc<dyn TelemetrySource>,
        weather: Arc<dyn WeatherSource>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            telemetry,
            weather,
            settings,
            health: HealthBoard::new(),
        }
    }

    pub fn health(&self) -> &HealthBoard {
        &self.health
    }

    /// Query one region, keeping at most `region_cap` states in provider order.
    pub async fn fetch_region(&self, region: &Region) -> RegionReport {
        let bbox = region.bounding_box(self.settings.region_margin_deg);
        let deadline = self.settings.region_timeout;

        let result = match tokio::time::timeout(deadline, self.telemetry.fetch_states(bbox)).await {
            Ok(Ok(mut states)) => {
                states.truncate(self.settings.region_cap);
                Ok(states)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::Timeout {
                what: format!("region {}", region.code),
                timeout_ms: deadline.as_millis() as u64,
            }),
        };

        match &result {
            Ok(states) => {
                debug!("{}: {} states", region.code, states.len());
                self.health.record_success(&region.code, states.len());
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", region.code, e);
                self.health.record_failure(&region.code, e);
            }
        }

        RegionReport {
            region: region.code.clone(),
            result,
        }
    }

    /// Query every region concurrently. Reports come back in `regions` order.
    pub async fn fetch_regions(&self, regions: &[Region]) -> Vec<RegionReport> {
        join_all(regions.iter().map(|region| self.fetch_region(region))).await
    }

    /// Current weather at `(lat, lon)`, or an empty `Weather` on any failure.
    pub async fn fetch_weather(&self, lat: f64, lon: f64) -> Weather {
        let deadline = self.settings.weather_timeout;
        match tokio::time::timeout(deadline, self.weather.current_weather(lat, lon)).await {
            Ok(Ok(weather)) => weather,
            Ok(Err(e)) => {
                warn!("Weather fetch failed for ({lat},{lon}): {}", e);
                Weather::default()
            }
            Err(_) => {
                warn!(
                    "Weather fetch timed out for ({lat},{lon}) after {}ms",
                    deadline.as_millis()
                );
                Weather::default()
            }
        }
    }
}
