//! Service configuration types.

use serde::{Deserialize, Serialize};

use crate::types::Region;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Airports whose surrounding airspace is sampled.
    #[serde(default = "default_regions")]
    pub regions: Vec<Region>,

    /// Snapshot sizing and identifier range.
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Live-state provider settings.
    #[serde(default)]
    pub opensky: OpenSkyConfig,

    /// Weather provider settings.
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Fallback store settings.
    #[serde(default)]
    pub persistent: PersistentConfig,
}

/// Snapshot sizing, identifier range, and per-call deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// First synthetic identifier. Lower identifiers belong to the
    /// persistent store.
    #[serde(default = "default_base_id")]
    pub base_id: i64,

    /// Maximum records kept in one snapshot.
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,

    /// Maximum state vectors taken from each region.
    #[serde(default = "default_region_cap")]
    pub region_cap: usize,

    /// Half-width of each region's bounding box in degrees.
    #[serde(default = "default_region_margin")]
    pub region_margin_deg: f64,

    /// Deadline for a single region query.
    #[serde(default = "default_region_timeout")]
    pub region_timeout_ms: u64,

    /// Deadline for a single weather lookup.
    #[serde(default = "default_weather_timeout")]
    pub weather_timeout_ms: u64,
}

/// Live-state provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSkyConfig {
    #[serde(default = "default_opensky_base_url")]
    pub base_url: String,

    /// HTTP client timeout; the per-region deadline is usually tighter.
    #[serde(default = "default_opensky_timeout")]
    pub timeout_ms: u64,

    /// Outbound request budget.
    #[serde(default = "default_requests_per_sec")]
    pub requests_per_sec: u32,
}

/// Weather provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_open_meteo_base_url")]
    pub base_url: String,

    #[serde(default = "default_weather_http_timeout")]
    pub timeout_ms: u64,
}

/// Fallback store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistentConfig {
    /// JSON array of flight records loaded at startup.
    #[serde(default)]
    pub seed_path: Option<String>,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_base_id() -> i64 {
    500
}
fn default_sample_limit() -> usize {
    100
}
fn default_region_cap() -> usize {
    15
}
fn default_region_margin() -> f64 {
    0.2
}
fn default_region_timeout() -> u64 {
    3000
}
fn default_weather_timeout() -> u64 {
    3000
}

fn default_opensky_base_url() -> String {
    "https://opensky-network.org/api".into()
}
fn default_opensky_timeout() -> u64 {
    10_000
}
fn default_requests_per_sec() -> u32 {
    10
}

fn default_open_meteo_base_url() -> String {
    "https://api.open-meteo.com/v1".into()
}
fn default_weather_http_timeout() -> u64 {
    5000
}

/// Ten busiest airports by passenger traffic.
pub fn default_regions() -> Vec<Region> {
    vec![
        Region::new("ATL", 33.64, -84.42),
        Region::new("LHR", 51.47, -0.45),
        Region::new("DXB", 25.25, 55.36),
        Region::new("HND", 35.54, 139.77),
        Region::new("ORD", 41.97, -87.90),
        Region::new("LAX", 33.94, -118.40),
        Region::new("CDG", 49.00, 2.55),
        Region::new("DFW", 32.89, -97.04),
        Region::new("DEN", 39.85, -104.67),
        Region::new("IST", 41.27, 28.75),
    ]
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            base_id: default_base_id(),
            sample_limit: default_sample_limit(),
            region_cap: default_region_cap(),
            region_margin_deg: default_region_margin(),
            region_timeout_ms: default_region_timeout(),
            weather_timeout_ms: default_weather_timeout(),
        }
    }
}

impl Default for OpenSkyConfig {
    fn default() -> Self {
        Self {
            base_url: default_opensky_base_url(),
            timeout_ms: default_opensky_timeout(),
            requests_per_sec: default_requests_per_sec(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_open_meteo_base_url(),
            timeout_ms: default_weather_http_timeout(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            snapshot: SnapshotConfig::default(),
            opensky: OpenSkyConfig::default(),
            weather: WeatherConfig::default(),
            persistent: PersistentConfig::default(),
        }
    }
}
