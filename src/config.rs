//! Configuration loader: merges env vars, .env file, and config.toml.

use common::{Error, ServiceConfig};
use std::path::Path;

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer > 0")))?;
    if parsed == 0 {
        return Err(Error::Config(format!("{env_name} must be an integer > 0")));
    }
    Ok(parsed)
}

fn parse_non_negative_i64(raw: &str, env_name: &str) -> Result<i64, Error> {
    let parsed = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::Config(format!("{env_name} must be an integer >= 0")))?;
    if parsed < 0 {
        return Err(Error::Config(format!("{env_name} must be an integer >= 0")));
    }
    Ok(parsed)
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn validate_config(config: &ServiceConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.regions.is_empty() {
        issues.push("regions must contain at least one region".into());
    }
    for region in &config.regions {
        if region.code.trim().is_empty() {
            issues.push("regions[].code must not be empty".into());
        }
        if !(-90.0..=90.0).contains(&region.lat) {
            issues.push(format!("region {} lat must be in [-90,90]", region.code));
        }
        if !(-180.0..=180.0).contains(&region.lon) {
            issues.push(format!("region {} lon must be in [-180,180]", region.code));
        }
    }

    if config.snapshot.base_id < 0 {
        issues.push("snapshot.base_id must be >= 0".into());
    }
    let live_range_end = i64::try_from(config.snapshot.sample_limit)
        .ok()
        .and_then(|limit| config.snapshot.base_id.checked_add(limit));
    if live_range_end.is_none() {
        issues.push("snapshot.base_id + snapshot.sample_limit must fit in i64".into());
    }
    if config.snapshot.sample_limit == 0 {
        issues.push("snapshot.sample_limit must be > 0".into());
    }
    if config.snapshot.region_cap == 0 {
        issues.push("snapshot.region_cap must be > 0".into());
    }
    if config.snapshot.region_margin_deg <= 0.0 {
        issues.push("snapshot.region_margin_deg must be > 0".into());
    }
    if config.snapshot.region_timeout_ms == 0 {
        issues.push("snapshot.region_timeout_ms must be > 0".into());
    }
    if config.snapshot.weather_timeout_ms == 0 {
        issues.push("snapshot.weather_timeout_ms must be > 0".into());
    }

    if config.opensky.base_url.trim().is_empty() {
        issues.push("opensky.base_url must not be empty".into());
    }
    if config.opensky.timeout_ms == 0 {
        issues.push("opensky.timeout_ms must be > 0".into());
    }
    if config.opensky.requests_per_sec == 0 {
        issues.push("opensky.requests_per_sec must be > 0".into());
    }
    if config.weather.base_url.trim().is_empty() {
        issues.push("weather.base_url must not be empty".into());
    }
    if config.weather.timeout_ms == 0 {
        issues.push("weather.timeout_ms must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Apply environment overrides using `var` as the lookup.
fn apply_env_overrides<F>(config: &mut ServiceConfig, var: F) -> Result<(), Error>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = var("OPENSKY_BASE_URL").and_then(non_empty) {
        config.opensky.base_url = url;
    }
    if let Some(url) = var("OPEN_METEO_BASE_URL").and_then(non_empty) {
        config.weather.base_url = url;
    }
    if let Some(raw) = var("FLIGHTS_BASE_ID") {
        config.snapshot.base_id = parse_non_negative_i64(&raw, "FLIGHTS_BASE_ID")?;
    }
    if let Some(raw) = var("FLIGHTS_SAMPLE_LIMIT") {
        config.snapshot.sample_limit = parse_positive_u64(&raw, "FLIGHTS_SAMPLE_LIMIT")? as usize;
    }
    if let Some(raw) = var("FLIGHTS_REGION_CAP") {
        config.snapshot.region_cap = parse_positive_u64(&raw, "FLIGHTS_REGION_CAP")? as usize;
    }
    if let Some(raw) = var("FLIGHTS_REGION_TIMEOUT_MS") {
        config.snapshot.region_timeout_ms =
            parse_positive_u64(&raw, "FLIGHTS_REGION_TIMEOUT_MS")?;
    }
    if let Some(raw) = var("FLIGHTS_WEATHER_TIMEOUT_MS") {
        config.snapshot.weather_timeout_ms =
            parse_positive_u64(&raw, "FLIGHTS_WEATHER_TIMEOUT_MS")?;
    }
    if let Some(path) = var("FLIGHTS_SEED_PATH").and_then(non_empty) {
        config.persistent.seed_path = Some(path);
    }
    Ok(())
}

/// Load service configuration from environment and optional config file.
pub fn load_config() -> Result<ServiceConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = ServiceConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // 4. Override with environment variables (highest priority).
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    validate_config(&config)?;

    Ok(config)
}
