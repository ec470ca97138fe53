//! Synthetic identifiers for live flights.
//!
//! Identifiers are positional: the n-th sampled candidate of a refresh gets
//! `base_id + n`. They are stable from one committed snapshot to the next
//! refresh, not across refreshes.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Timelike, Utc};
use common::airline::airline_name;
use common::FlightRecord;

use crate::sampler::Candidate;

const LIVE_SUFFIX: &str = " (Live)";
const ANY_DESTINATION: &str = "ANY";
const UNKNOWN_AIRCRAFT: &str = "Unknown Type";

/// Identifier → transponder address for one snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityMap {
    entries: BTreeMap<i64, String>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous address if `id` was already mapped.
    pub fn insert(&mut self, id: i64, icao24: String) -> Option<String> {
        self.entries.insert(id, icao24)
    }

    pub fn address_of(&self, id: i64) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(i64, String)> for IdentityMap {
    fn from_iter<T: IntoIterator<Item = (i64, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Turns a sampled candidate sequence into flight records.
#[derive(Debug, Clone)]
pub struct IdentityAssigner {
    base_id: i64,
}

impl IdentityAssigner {
    pub fn new(base_id: i64) -> Self {
        Self { base_id }
    }

    pub fn base_id(&self) -> i64 {
        self.base_id
    }

    /// Whether `id` belongs to the live range.
    pub fn is_live_id(&self, id: i64) -> bool {
        id >= self.base_id
    }

    /// Assign `base_id, base_id + 1, …` in sample order.
    ///
    /// `now` stamps the schedule fields; it is truncated to whole seconds.
    pub fn assign(&self, samples: &[Candidate], now: DateTime<Utc>) -> (Vec<FlightRecord>, IdentityMap) {
        let start = now.with_nanosecond(0).unwrap_or(now);
        let mut identities = IdentityMap::new();
        let mut records = Vec::with_capacity(samples.len());

        for (index, candidate) in samples.iter().enumerate() {
            let id = self.base_id + index as i64;
            identities.insert(id, candidate.state.icao24.clone());
            records.push(normalize(id, index, candidate, start));
        }

        (records, identities)
    }
}

fn normalize(id: i64, index: usize, candidate: &Candidate, start: DateTime<Utc>) -> FlightRecord {
    let state = &candidate.state;
    let callsign = state
        .callsign
        .clone()
        .unwrap_or_else(|| format!("FLT{index}"));
    let status = if state.on_ground { "On Ground" } else { "In Air" };

    FlightRecord {
        id,
        name: format!("{callsign}{LIVE_SUFFIX}"),
        flight_start: Some(start),
        flight_end: Some(start + Duration::hours(1)),
        origin_airport_code: Some(candidate.origin.clone()),
        destination_airport_code: Some(ANY_DESTINATION.to_string()),
        airline: Some(airline_name(&callsign)),
        flight_number: Some(callsign.clone()),
        aircraft_type: Some(UNKNOWN_AIRCRAFT.to_string()),
        status: Some(status.to_string()),
        passenger_count: 0,
        icao24: Some(state.icao24.clone()),
        callsign: Some(callsign),
        origin_country: state.origin_country.clone(),
        longitude: state.longitude,
        latitude: state.latitude,
        altitude: state.baro_altitude,
        velocity: state.velocity,
        true_track: state.true_track,
        vertical_rate: state.vertical_rate,
        on_ground: Some(state.on_ground),
        weather_temp: None,
        weather_wind_speed: None,
        weather_code: None,
    }
}
