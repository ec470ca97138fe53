//! Domain types shared across the flight board.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Regions ───────────────────────────────────────────────────────────

/// A named query area centred on an airport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// IATA airport code, also used as the record's origin code.
    pub code: String,
    pub lat: f64,
    pub lon: f64,
}

/// Latitude/longitude box accepted by the live-state provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lamin: f64,
    pub lomin: f64,
    pub lamax: f64,
    pub lomax: f64,
}

impl Region {
    pub fn new(code: &str, lat: f64, lon: f64) -> Self {
        Self {
            code: code.to_string(),
            lat,
            lon,
        }
    }

    /// Box of `margin_deg` degrees around the region centre.
    pub fn bounding_box(&self, margin_deg: f64) -> BoundingBox {
        BoundingBox {
            lamin: self.lat - margin_deg,
            lomin: self.lon - margin_deg,
            lamax: self.lat + margin_deg,
            lomax: self.lon + margin_deg,
        }
    }
}

// ── Live telemetry ────────────────────────────────────────────────────

/// The subset of a provider state vector the board uses.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    /// ICAO 24-bit transponder address, lower-case hex.
    pub icao24: String,
    /// Callsign with padding removed; `None` when blank.
    pub callsign: Option<String>,
    pub origin_country: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// Barometric altitude in metres.
    pub baro_altitude: Option<f64>,
    pub on_ground: bool,
    /// Ground speed in m/s.
    pub velocity: Option<f64>,
    /// Heading in degrees clockwise from north.
    pub true_track: Option<f64>,
    /// Vertical rate in m/s.
    pub vertical_rate: Option<f64>,
}

/// Current conditions at a point. All fields are `None` when the weather
/// provider could not be reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Air temperature in °C.
    pub temperature: Option<f64>,
    /// Wind speed in km/h.
    pub wind_speed: Option<f64>,
    /// WMO weather interpretation code.
    pub code: Option<i64>,
}

impl Weather {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.wind_speed.is_none() && self.code.is_none()
    }
}

// ── Flight records ────────────────────────────────────────────────────

/// A flight as exposed to readers.
///
/// Field names follow the `Flights` entity the UI binds to. Live records
/// carry the telemetry block; stored records may leave it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "FlightStart", default)]
    pub flight_start: Option<DateTime<Utc>>,
    #[serde(rename = "FlightEnd", default)]
    pub flight_end: Option<DateTime<Utc>>,
    #[serde(rename = "OriginAirport_Code", default)]
    pub origin_airport_code: Option<String>,
    #[serde(rename = "DestinationAirport_Code", default)]
    pub destination_airport_code: Option<String>,
    #[serde(rename = "Airline", default)]
    pub airline: Option<String>,
    #[serde(rename = "FlightNumber", default)]
    pub flight_number: Option<String>,
    #[serde(rename = "AircraftType", default)]
    pub aircraft_type: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "PassengerCount", default)]
    pub passenger_count: i64,

    #[serde(rename = "ICAO24", default)]
    pub icao24: Option<String>,
    #[serde(rename = "Callsign", default)]
    pub callsign: Option<String>,
    #[serde(rename = "OriginCountry", default)]
    pub origin_country: Option<String>,
    #[serde(rename = "Longitude", default)]
    pub longitude: Option<f64>,
    #[serde(rename = "Latitude", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "Altitude", default)]
    pub altitude: Option<f64>,
    #[serde(rename = "Velocity", default)]
    pub velocity: Option<f64>,
    #[serde(rename = "TrueTrack", default)]
    pub true_track: Option<f64>,
    #[serde(rename = "VerticalRate", default)]
    pub vertical_rate: Option<f64>,
    #[serde(rename = "OnGround", default)]
    pub on_ground: Option<bool>,

    #[serde(rename = "Weather_Temp", default)]
    pub weather_temp: Option<f64>,
    #[serde(rename = "Weather_WindSpeed", default)]
    pub weather_wind_speed: Option<f64>,
    #[serde(rename = "Weather_Code", default)]
    pub weather_code: Option<i64>,
}

impl FlightRecord {
    /// Copy of this record with the weather block filled from `weather`.
    pub fn with_weather(&self, weather: Weather) -> FlightRecord {
        FlightRecord {
            weather_temp: weather.temperature,
            weather_wind_speed: weather.wind_speed,
            weather_code: weather.code,
            ..self.clone()
        }
    }

    /// Position as `(lat, lon)` when both are known.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}
