//! Live flight snapshot and identity layer.
//!
//! - `gateway`: concurrent region queries and weather lookups with deadlines
//! - `sampler`: pooled shuffle-and-truncate of live candidates
//! - `identity`: positional identifiers and record normalization
//! - `store`: atomically swapped snapshot of records plus identities
//! - `persistent`: read-only fallback store
//! - `service`: list/detail reads and manual refresh

pub mod gateway;
pub mod identity;
pub mod persistent;
pub mod sampler;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

pub use gateway::{
    Gateway, GatewaySettings, HealthBoard, RegionHealth, RegionReport, TelemetrySource,
    WeatherSource,
};
pub use identity::{IdentityAssigner, IdentityMap};
pub use persistent::{MemoryStore, PersistentStore};
pub use sampler::{pool_candidates, Candidate, Sampler};
pub use service::{FlightReadService, RefreshOutcome};
pub use store::{Snapshot, SnapshotStore};
