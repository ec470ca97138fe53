//! Flight read service.
//!
//! Serves list and detail reads from the frozen live snapshot, falls back
//! to the persistent store when no live data can be produced, and runs
//! the gateway → sampler → identity pipeline on demand.
//!
//! The snapshot only changes on an explicit `refresh` or when a list read
//! finds it empty, so a reader paging through the list never sees items
//! shift underneath them.

use std::sync::Arc;

use chrono::Utc;
use common::{Error, FlightRecord, Region, ServiceConfig, Weather};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::gateway::{Gateway, GatewaySettings, TelemetrySource, WeatherSource};
use crate::identity::{IdentityAssigner, IdentityMap};
use crate::persistent::PersistentStore;
use crate::sampler::{pool_candidates, Sampler};
use crate::store::SnapshotStore;

/// Result of a manual refresh that reached at least one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// A new snapshot was committed.
    Committed { records: usize, generation: u64 },
    /// The live feed had no flights; the previous snapshot was kept.
    Empty { retained: usize },
}

pub struct FlightReadService {
    gateway: Gateway,
    sampler: Sampler,
    assigner: IdentityAssigner,
    regions: Vec<Region>,
    store: Arc<SnapshotStore>,
    persistent: Arc<dyn PersistentStore>,
    refresh_lock: Mutex<()>,
}

impl FlightReadService {
    pub fn new(
        gateway: Gateway,
        sampler: Sampler,
        assigner: IdentityAssigner,
        regions: Vec<Region>,
        store: Arc<SnapshotStore>,
        persistent: Arc<dyn PersistentStore>,
    ) -> Self {
        Self {
            gateway,
            sampler,
            assigner,
            regions,
            store,
            persistent,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Wire a service from configuration with an entropy-seeded sampler and
    /// a fresh, empty snapshot store.
    pub fn from_config(
        config: &ServiceConfig,
        telemetry: Arc<dyn TelemetrySource>,
        weather: Arc<dyn WeatherSource>,
        persistent: Arc<dyn PersistentStore>,
    ) -> Self {
        let gateway = Gateway::new(telemetry, weather, GatewaySettings::from(&config.snapshot));
        Self::new(
            gateway,
            Sampler::new(config.snapshot.sample_limit),
            IdentityAssigner::new(config.snapshot.base_id),
            config.regions.clone(),
            Arc::new(SnapshotStore::new()),
            persistent,
        )
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn base_id(&self) -> i64 {
        self.assigner.base_id()
    }

    // ── Reads ─────────────────────────────────────────────────────────

    /// All flights.
    ///
    /// Returns the current snapshot when it has records. Otherwise runs one
    /// live refresh; if that yields nothing or fails, the persistent store
    /// answers instead.
    pub async fn read_collection(&self) -> Result<Vec<FlightRecord>, Error> {
        let snapshot = self.store.get().await;
        if !snapshot.is_empty() {
            return Ok(snapshot.records().to_vec());
        }

        match self.bootstrap().await {
            Ok(Some(records)) => Ok(records),
            Ok(None) => {
                info!("No live flights found, falling back to persistent store");
                self.persistent.read_collection().await
            }
            Err(e) => {
                warn!("Live refresh failed ({}), falling back to persistent store", e);
                self.persistent.read_collection().await
            }
        }
    }

    /// One flight by identifier.
    ///
    /// Live identifiers resolve only against the current snapshot and are
    /// enriched with current weather; an identifier missing from the
    /// snapshot is `NotFound` and is never re-fetched. Lower identifiers
    /// go to the persistent store.
    pub async fn read_one(&self, id: i64) -> Result<FlightRecord, Error> {
        if !self.assigner.is_live_id(id) {
            return self.persistent.read_one(id).await?.ok_or(Error::NotFound(id));
        }

        let record = self.store.find_by_id(id).await.ok_or(Error::NotFound(id))?;
        let weather = match record.position() {
            Some((lat, lon)) => self.gateway.fetch_weather(lat, lon).await,
            None => Weather::default(),
        };
        Ok(record.with_weather(weather))
    }

    // ── Refresh ───────────────────────────────────────────────────────

    /// Rebuild the snapshot from the live feed.
    ///
    /// An empty result keeps the current snapshot. Fails with
    /// `UpstreamUnavailable` only when no region could be queried; the
    /// current snapshot is kept in that case too.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshOutcome, Error> {
        let _guard = self.refresh_lock.lock().await;
        let (records, identities) = self.run_pipeline().await?;
        let count = records.len();

        match self.store.replace(records, identities).await? {
            Some(generation) => Ok(RefreshOutcome::Committed {
                records: count,
                generation,
            }),
            None => {
                let retained = self.store.len().await;
                info!("Refresh found no live flights; keeping {} cached", retained);
                Ok(RefreshOutcome::Empty { retained })
            }
        }
    }

    /// Fill an empty store. Serialized with `refresh`; a caller that waited
    /// behind another refresh uses its result instead of fetching again.
    async fn bootstrap(&self) -> Result<Option<Vec<FlightRecord>>, Error> {
        let _guard = self.refresh_lock.lock().await;

        let snapshot = self.store.get().await;
        if !snapshot.is_empty() {
            return Ok(Some(snapshot.records().to_vec()));
        }

        let (records, identities) = self.run_pipeline().await?;
        if self.store.replace(records, identities).await?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.store.get().await.records().to_vec()))
    }

    #[instrument(skip(self), fields(regions = self.regions.len()))]
    async fn run_pipeline(&self) -> Result<(Vec<FlightRecord>, IdentityMap), Error> {
        info!("Fetching live flight data from {} regions", self.regions.len());
        let reports = self.gateway.fetch_regions(&self.regions).await;

        let total = reports.len();
        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        if total > 0 && failed == total {
            return Err(Error::UpstreamUnavailable(format!(
                "all {total} regions failed"
            )));
        }

        let pool = pool_candidates(reports);
        info!(
            "Live feed returned {} flights across {} regions ({} failed)",
            pool.len(),
            total,
            failed
        );

        let samples = self.sampler.sample(pool);
        Ok(self.assigner.assign(&samples, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{state, stored, CountingStore, FakeTelemetry, FakeWeather};
    use common::StateVector;

    const SEED: u64 = 7;

    fn regions() -> Vec<Region> {
        vec![
            Region::new("ATL", 33.64, -84.42),
            Region::new("LHR", 51.47, -0.45),
            Region::new("DXB", 25.25, 55.36),
        ]
    }

    fn states(prefix: &str, n: usize) -> Vec<StateVector> {
        (0..n)
            .map(|i| state(&format!("{prefix}{i:04}"), &format!("DLH{i}")))
            .collect()
    }

    struct Harness {
        service: FlightReadService,
        telemetry: Arc<FakeTelemetry>,
        weather: Arc<FakeWeather>,
        persistent: Arc<CountingStore>,
    }

    fn harness_with(weather: FakeWeather, region_cap: usize) -> Harness {
        let telemetry = Arc::new(FakeTelemetry::new());
        let weather = Arc::new(weather);
        let persistent = Arc::new(CountingStore::new(vec![stored(101, "LH 400"), stored(102, "BA 117")]));
        let settings = GatewaySettings {
            region_cap,
            ..GatewaySettings::default()
        };
        let service = FlightReadService::new(
            Gateway::new(telemetry.clone(), weather.clone(), settings),
            Sampler::seeded(100, SEED),
            IdentityAssigner::new(500),
            regions(),
            Arc::new(SnapshotStore::new()),
            persistent.clone(),
        );
        Harness {
            service,
            telemetry,
            weather,
            persistent,
        }
    }

    fn harness() -> Harness {
        harness_with(
            FakeWeather::ok(Weather {
                temperature: Some(14.0),
                wind_speed: Some(9.0),
                code: Some(2),
            }),
            15,
        )
    }

    #[tokio::test]
    async fn test_scenario_two_zero_five() {
        let h = harness();
        let regions = regions();
        h.telemetry.respond(&regions[0], states("a", 2));
        h.telemetry.respond(&regions[1], Vec::new());
        h.telemetry.respond(&regions[2], states("c", 5));

        let outcome = h.service.refresh().await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Committed { records: 7, generation: 1 });

        let snapshot = h.service.store().get().await;
        let ids: Vec<i64> = snapshot.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, (500..507).collect::<Vec<_>>());
        assert_eq!(snapshot.identities().len(), 7);

        // Same seed over the same pool gives the order the service used.
        let mut pool: Vec<crate::sampler::Candidate> = Vec::new();
        for (code, list) in [("ATL", states("a", 2)), ("DXB", states("c", 5))] {
            pool.extend(list.into_iter().map(|s| crate::sampler::Candidate {
                state: s,
                origin: code.to_string(),
            }));
        }
        let expected = Sampler::seeded(100, SEED).sample(pool);

        let last = h.service.read_one(506).await.unwrap();
        assert_eq!(last.icao24.as_deref(), Some(expected[6].state.icao24.as_str()));
        assert_eq!(last.origin_airport_code.as_deref(), Some(expected[6].origin.as_str()));

        let err = h.service.read_one(507).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(h.persistent.single_reads(), 0);
    }

    #[tokio::test]
    async fn test_list_bootstraps_empty_store() {
        let h = harness();
        h.telemetry.respond(&regions()[0], states("a", 3));

        let records = h.service.read_collection().await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(h.service.store().len().await, 3);
        assert_eq!(h.persistent.collection_reads(), 0);
    }

    #[tokio::test]
    async fn test_list_reads_are_frozen() {
        let h = harness();
        h.telemetry.respond(&regions()[0], states("a", 4));
        h.telemetry.respond(&regions()[2], states("c", 4));

        let first = h.service.read_collection().await.unwrap();
        let calls_after_first = h.telemetry.calls();

        h.telemetry.respond(&regions()[0], states("z", 9));
        let second = h.service.read_collection().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(h.telemetry.calls(), calls_after_first);
    }

    #[tokio::test]
    async fn test_all_regions_fail_list_falls_back() {
        let h = harness();
        for region in regions() {
            h.telemetry.fail(&region, "503");
        }

        let records = h.service.read_collection().await.unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![101, 102]);
        assert_eq!(h.persistent.collection_reads(), 1);
        assert!(h.service.store().is_empty().await);
        assert!(h.service.store().get().await.identities().is_empty());
    }

    #[tokio::test]
    async fn test_empty_feed_list_falls_back() {
        let h = harness();

        let records = h.service.read_collection().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(h.persistent.collection_reads(), 1);
        assert!(h.service.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_refresh_keeps_fifty() {
        let h = harness_with(FakeWeather::failing(), 100);
        let atl = &regions()[0];
        h.telemetry.respond(atl, states("a", 50));
        h.service.refresh().await.unwrap();
        assert_eq!(h.service.store().len().await, 50);

        h.telemetry.respond(atl, Vec::new());
        let outcome = h.service.refresh().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Empty { retained: 50 });
        let snapshot = h.service.store().get().await;
        assert_eq!(snapshot.len(), 50);
        assert_eq!(snapshot.identities().len(), 50);
        assert_eq!(snapshot.generation(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_reports_and_keeps_snapshot() {
        let h = harness();
        h.telemetry.respond(&regions()[1], states("b", 6));
        h.service.refresh().await.unwrap();
        let before = h.service.read_collection().await.unwrap();

        for region in regions() {
            h.telemetry.fail(&region, "connection reset");
        }
        let err = h.service.refresh().await.unwrap_err();

        assert!(matches!(err, Error::UpstreamUnavailable(_)));
        assert_eq!(h.service.read_collection().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_partial_failure_still_commits() {
        let h = harness();
        let regions = regions();
        h.telemetry.fail(&regions[0], "timeout");
        h.telemetry.respond(&regions[1], states("b", 2));

        let outcome = h.service.refresh().await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Committed { records: 2, generation: 1 });
    }

    #[tokio::test]
    async fn test_refresh_replaces_ids() {
        let h = harness();
        let atl = &regions()[0];
        h.telemetry.respond(atl, states("a", 5));
        h.service.refresh().await.unwrap();

        h.telemetry.respond(atl, states("n", 2));
        let outcome = h.service.refresh().await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Committed { records: 2, generation: 2 });

        let addr = h.service.read_one(501).await.unwrap().icao24.unwrap();
        assert!(addr.starts_with('n'));
        assert!(h.service.read_one(502).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_detail_read_enriches_without_writing_back() {
        let h = harness();
        h.telemetry.respond(&regions()[0], states("a", 1));
        h.service.refresh().await.unwrap();

        let record = h.service.read_one(500).await.unwrap();
        assert_eq!(record.weather_temp, Some(14.0));
        assert_eq!(record.weather_wind_speed, Some(9.0));
        assert_eq!(record.weather_code, Some(2));
        assert_eq!(h.weather.calls(), 1);

        let cached = h.service.store().find_by_id(500).await.unwrap();
        assert!(cached.weather_temp.is_none());

        h.service.read_one(500).await.unwrap();
        assert_eq!(h.weather.calls(), 2);
    }

    #[tokio::test]
    async fn test_weather_failure_keeps_other_fields() {
        let h = harness_with(FakeWeather::failing(), 15);
        h.telemetry.respond(&regions()[0], states("a", 1));
        h.service.refresh().await.unwrap();

        let record = h.service.read_one(500).await.unwrap();
        let cached = h.service.store().find_by_id(500).await.unwrap();
        assert_eq!(record, cached);
        assert!(record.weather_temp.is_none());
        assert!(record.weather_wind_speed.is_none());
        assert!(record.weather_code.is_none());
        assert_eq!(record.callsign.as_deref(), Some("DLH0"));
        assert!(record.latitude.is_some());
    }

    #[tokio::test]
    async fn test_record_without_position_skips_weather() {
        let h = harness();
        let mut parked = state("a0000", "DLH0");
        parked.latitude = None;
        h.telemetry.respond(&regions()[0], vec![parked]);
        h.service.refresh().await.unwrap();

        let record = h.service.read_one(500).await.unwrap();
        assert!(record.weather_temp.is_none());
        assert_eq!(h.weather.calls(), 0);
    }

    #[tokio::test]
    async fn test_live_id_on_empty_store_is_not_found() {
        let h = harness();
        h.telemetry.respond(&regions()[0], states("a", 3));

        let err = h.service.read_one(500).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(h.telemetry.calls(), 0);
        assert_eq!(h.persistent.single_reads(), 0);
    }

    #[tokio::test]
    async fn test_low_id_delegates_to_persistent() {
        let h = harness();

        let record = h.service.read_one(101).await.unwrap();
        assert_eq!(record.name, "LH 400");
        assert!(h.service.read_one(499).await.unwrap_err().is_not_found());

        assert_eq!(h.persistent.single_reads(), 2);
        assert_eq!(h.telemetry.calls(), 0);
        assert_eq!(h.weather.calls(), 0);
        assert!(h.service.store().is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bootstrap_fetches_once() {
        let h = Arc::new(harness());
        h.telemetry.respond(&regions()[0], states("a", 3));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let h = h.clone();
            handles.push(tokio::spawn(async move {
                h.service.read_collection().await.unwrap()
            }));
        }
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(h.telemetry.calls(), regions().len());
        assert_eq!(h.service.store().get().await.generation(), 1);
    }

    #[tokio::test]
    async fn test_from_config_uses_snapshot_settings() {
        let mut config = ServiceConfig::default();
        config.snapshot.base_id = 900;
        config.regions = regions();

        let telemetry = Arc::new(FakeTelemetry::new());
        telemetry.respond(&regions()[0], states("a", 2));
        let service = FlightReadService::from_config(
            &config,
            telemetry,
            Arc::new(FakeWeather::failing()),
            Arc::new(CountingStore::new(Vec::new())),
        );

        service.refresh().await.unwrap();
        assert_eq!(service.base_id(), 900);
        assert!(service.read_one(901).await.is_ok());
        assert!(service.read_one(500).await.unwrap_err().is_not_found());
    }
}
