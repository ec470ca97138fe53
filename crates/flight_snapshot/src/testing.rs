//! Scripted providers and stores for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use common::{BoundingBox, Error, FlightRecord, Region, StateVector, Weather};

use crate::persistent::{MemoryStore, PersistentStore};
use crate::gateway::{TelemetrySource, WeatherSource};

pub fn state(icao24: &str, callsign: &str) -> StateVector {
    StateVector {
        icao24: icao24.to_string(),
        callsign: (!callsign.is_empty()).then(|| callsign.to_string()),
        origin_country: Some("Germany".into()),
        longitude: Some(8.56),
        latitude: Some(50.03),
        baro_altitude: Some(1200.0),
        on_ground: false,
        velocity: Some(140.0),
        true_track: Some(250.0),
        vertical_rate: Some(-3.5),
    }
}

pub fn stored(id: i64, name: &str) -> FlightRecord {
    serde_json::from_value(serde_json::json!({ "ID": id, "Name": name }))
        .expect("stored record fixture")
}

fn center_key(lat: f64, lon: f64) -> String {
    format!("{lat:.3}/{lon:.3}")
}

#[derive(Clone)]
enum Script {
    States(Vec<StateVector>),
    Fail(String),
    Hang,
}

/// Telemetry keyed by region centre. Unscripted regions answer empty.
#[derive(Default)]
pub struct FakeTelemetry {
    scripts: Mutex<HashMap<String, Script>>,
    calls: AtomicUsize,
}

impl FakeTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, region: &Region, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(center_key(region.lat, region.lon), script);
    }

    pub fn respond(&self, region: &Region, states: Vec<StateVector>) {
        self.set(region, Script::States(states));
    }

    pub fn fail(&self, region: &Region, reason: &str) {
        self.set(region, Script::Fail(reason.to_string()));
    }

    pub fn hang(&self, region: &Region) {
        self.set(region, Script::Hang);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelemetrySource for FakeTelemetry {
    async fn fetch_states(&self, bbox: BoundingBox) -> Result<Vec<StateVector>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = center_key((bbox.lamin + bbox.lamax) / 2.0, (bbox.lomin + bbox.lomax) / 2.0);
        let script = self.scripts.lock().unwrap().get(&key).cloned();

        match script {
            Some(Script::States(states)) => Ok(states),
            Some(Script::Fail(reason)) => Err(Error::OpenSky(reason)),
            Some(Script::Hang) => std::future::pending().await,
            None => Ok(Vec::new()),
        }
    }
}

pub struct FakeWeather {
    result: Option<Weather>,
    hang: bool,
    calls: AtomicUsize,
}

impl FakeWeather {
    pub fn ok(weather: Weather) -> Self {
        Self {
            result: Some(weather),
            hang: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            hang: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn hanging() -> Self {
        Self {
            result: None,
            hang: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for FakeWeather {
    async fn current_weather(&self, _lat: f64, _lon: f64) -> Result<Weather, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            return std::future::pending().await;
        }
        self.result
            .ok_or_else(|| Error::OpenMeteo("connection refused".into()))
    }
}

/// Memory store that counts how often it is consulted.
pub struct CountingStore {
    inner: MemoryStore,
    collection_reads: AtomicUsize,
    single_reads: AtomicUsize,
}

impl CountingStore {
    pub fn new(records: Vec<FlightRecord>) -> Self {
        Self {
            inner: MemoryStore::new(records),
            collection_reads: AtomicUsize::new(0),
            single_reads: AtomicUsize::new(0),
        }
    }

    pub fn collection_reads(&self) -> usize {
        self.collection_reads.load(Ordering::SeqCst)
    }

    pub fn single_reads(&self) -> usize {
        self.single_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistentStore for CountingStore {
    async fn read_collection(&self) -> Result<Vec<FlightRecord>, Error> {
        self.collection_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_collection().await
    }

    async fn read_one(&self, id: i64) -> Result<Option<FlightRecord>, Error> {
        self.single_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_one(id).await
    }
}
