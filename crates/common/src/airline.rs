//! ICAO airline designator lookup.

const AIRLINES: &[(&str, &str)] = &[
    ("DLH", "Lufthansa"),
    ("BAW", "British Airways"),
    ("AFR", "Air France"),
    ("KLM", "KLM Royal Dutch Airlines"),
    ("UAL", "United Airlines"),
    ("DAL", "Delta Air Lines"),
    ("AAL", "American Airlines"),
    ("UAE", "Emirates"),
    ("QFA", "Qantas"),
    ("SIA", "Singapore Airlines"),
    ("THY", "Turkish Airlines"),
    ("HAL", "Hawaiian Airlines"),
    ("JAL", "Japan Airlines"),
    ("ANA", "All Nippon Airways"),
    ("SAS", "SAS"),
    ("SWR", "Swiss International Air Lines"),
    ("EZY", "easyJet"),
    ("RYR", "Ryanair"),
    ("WZZ", "Wizz Air"),
    ("VLG", "Vueling"),
    ("TAP", "TAP Air Portugal"),
    ("IBE", "Iberia"),
    ("EIN", "Aer Lingus"),
    ("AZA", "Alitalia"),
    ("FIN", "Finnair"),
    ("NGB", "Norwegian Air Shuttle"),
    ("NAX", "Norwegian Air International"),
    ("ICE", "Icelandair"),
    ("VIR", "Virgin Atlantic"),
    ("AIC", "Air India"),
    ("THA", "Thai Airways"),
    ("HVN", "Vietnam Airlines"),
    ("EVA", "EVA Air"),
    ("KAL", "Korean Air"),
    ("CSN", "China Southern"),
    ("CCA", "Air China"),
    ("AAR", "Asiana Airlines"),
    ("ETH", "Ethiopian Airlines"),
    ("QTR", "Qatar Airways"),
    ("ETD", "Etihad Airways"),
];

/// Display name for the operator of `callsign`.
///
/// ICAO callsigns start with a three-letter operator designator (`DLH410`).
/// Unknown designators are returned as-is; an empty callsign maps to
/// `"Unknown Airline"`.
pub fn airline_name(callsign: &str) -> String {
    let callsign = callsign.trim();
    if callsign.is_empty() {
        return "Unknown Airline".to_string();
    }

    let code: String = callsign.chars().take(3).collect::<String>().to_uppercase();
    AIRLINES
        .iter()
        .find(|(designator, _)| *designator == code)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or(code)
}
