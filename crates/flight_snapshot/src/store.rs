//! Frozen live snapshot.
//!
//! Records and their identity map are committed together as one immutable
//! `Snapshot` behind an `Arc`. Replacing swaps the `Arc`; readers keep
//! whichever snapshot they cloned, so no reader can see records from one
//! refresh paired with identities from another.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Error, FlightRecord};
use tokio::sync::RwLock;
use tracing::info;

use crate::identity::IdentityMap;

/// One committed set of live records plus its identity map.
#[derive(Debug, Default)]
pub struct Snapshot {
    records: Vec<FlightRecord>,
    identities: IdentityMap,
    index: HashMap<i64, usize>,
    generation: u64,
    committed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn records(&self) -> &[FlightRecord] {
        &self.records
    }

    pub fn identities(&self) -> &IdentityMap {
        &self.identities
    }

    /// Zero for the initial empty snapshot, then +1 per commit.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.committed_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record for a live identifier, resolved through the identity map.
    pub fn find(&self, id: i64) -> Option<&FlightRecord> {
        self.identities.address_of(id)?;
        self.index.get(&id).and_then(|&pos| self.records.get(pos))
    }
}

/// Holder of the current snapshot.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently committed snapshot.
    pub async fn get(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    pub async fn find_by_id(&self, id: i64) -> Option<FlightRecord> {
        self.get().await.find(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.get().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.get().await.is_empty()
    }

    /// Commit `records` and `identities` as the new snapshot.
    ///
    /// Returns the new generation, or `None` when `records` is empty and the
    /// current snapshot was kept. Records that disagree with `identities`
    /// are rejected and the current snapshot is kept.
    pub async fn replace(
        &self,
        records: Vec<FlightRecord>,
        identities: IdentityMap,
    ) -> Result<Option<u64>, Error> {
        if records.is_empty() {
            return Ok(None);
        }

        let index = check_consistency(&records, &identities)?;

        let mut current = self.current.write().await;
        let generation = current.generation + 1;
        let count = records.len();
        *current = Arc::new(Snapshot {
            records,
            identities,
            index,
            generation,
            committed_at: Some(Utc::now()),
        });
        drop(current);

        info!("Committed snapshot generation {} with {} flights", generation, count);
        Ok(Some(generation))
    }
}

fn check_consistency(
    records: &[FlightRecord],
    identities: &IdentityMap,
) -> Result<HashMap<i64, usize>, Error> {
    if records.len() != identities.len() {
        return Err(Error::InconsistentSnapshot(format!(
            "{} records but {} identities",
            records.len(),
            identities.len()
        )));
    }

    let mut index = HashMap::with_capacity(records.len());
    for (pos, record) in records.iter().enumerate() {
        if index.insert(record.id, pos).is_some() {
            return Err(Error::InconsistentSnapshot(format!(
                "duplicate identifier {}",
                record.id
            )));
        }
        match identities.address_of(record.id) {
            Some(addr) if Some(addr) == record.icao24.as_deref() => {}
            Some(addr) => {
                return Err(Error::InconsistentSnapshot(format!(
                    "identifier {} maps to {} but record carries {:?}",
                    record.id, addr, record.icao24
                )));
            }
            None => {
                return Err(Error::InconsistentSnapshot(format!(
                    "identifier {} has no identity entry",
                    record.id
                )));
            }
        }
    }

    Ok(index)
}
