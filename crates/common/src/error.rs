//! Unified error type for the flight board.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("OpenSky API error: {0}")]
    OpenSky(String),

    #[error("Open-Meteo API error: {0}")]
    OpenMeteo(String),

    #[error("Timed out after {timeout_ms}ms: {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Flight {0} not found in current live data; refresh required")]
    NotFound(i64),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Persistent store error: {0}")]
    Persistent(String),

    #[error("Inconsistent snapshot: {0}")]
    InconsistentSnapshot(String),
}

impl Error {
    /// True for errors a caller should present as a missing record rather
    /// than a server fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
