//! Fallback store for non-live flights.
//!
//! The service only ever reads from it: identifiers below the live range
//! are served from here, and so is the collection whenever no live data
//! can be produced.

use std::path::Path;

use async_trait::async_trait;
use common::{Error, FlightRecord};
use tracing::info;

#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Every stored flight.
    async fn read_collection(&self) -> Result<Vec<FlightRecord>, Error>;

    /// One stored flight, `None` if the identifier is unknown.
    async fn read_one(&self, id: i64) -> Result<Option<FlightRecord>, Error>;
}

/// Read-only store held in memory, ordered by identifier.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<FlightRecord>,
}

impl MemoryStore {
    pub fn new(mut records: Vec<FlightRecord>) -> Self {
        records.sort_by_key(|r| r.id);
        records.dedup_by_key(|r| r.id);
        Self { records }
    }

    /// Parse a JSON array of flight records.
    pub fn from_json_str(raw: &str) -> Result<Self, Error> {
        let records: Vec<FlightRecord> = serde_json::from_str(raw)?;
        Ok(Self::new(records))
    }

    /// Load a JSON array of flight records from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Persistent(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let store = Self::from_json_str(&raw).map_err(|e| {
            Error::Persistent(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        info!("Loaded {} stored flights from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn read_collection(&self) -> Result<Vec<FlightRecord>, Error> {
        Ok(self.records.clone())
    }

    async fn read_one(&self, id: i64) -> Result<Option<FlightRecord>, Error> {
        Ok(self
            .records
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|pos| self.records[pos].clone()))
    }
}
