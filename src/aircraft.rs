//! Aircraft records as returned by the airplanes.live point query, plus the
//! display priority classification applied to them.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::geo::Observer;

/// Registration and flight number prefixes that always surface an aircraft.
const NOTABLE_PREFIXES: [&str; 7] = ["s5b", "puma", "s5", "toruk", "l4", "l9", "l6"];

/// Airframe type fragments that always surface an aircraft.
const NOTABLE_TYPES: [&str; 9] = [
    "pc9", "c130", "c17", "ef2000", "f16", "pc6", "at8t", "z78", "f35",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPriority {
    High,
    Medium,
    Low,
}

/// One aircraft record as it arrives on the wire. Field names follow the
/// airplanes.live JSON keys; everything except the position is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAircraft {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    #[serde(rename = "alt_baro", default, deserialize_with = "altitude_or_ground")]
    pub altitude_baro: Option<f64>,
    #[serde(rename = "alt_geom", default)]
    pub altitude_geom: Option<f64>,
    #[serde(default)]
    pub true_heading: Option<f64>,
    #[serde(rename = "oat", default)]
    pub outside_air_temp: Option<f64>,
    #[serde(rename = "gs", default)]
    pub ground_speed: Option<f64>,
    #[serde(rename = "ias", default)]
    pub indicated_airspeed: Option<f64>,
    #[serde(rename = "mach", default)]
    pub mach_number: Option<f64>,
    #[serde(rename = "flight", default)]
    pub flight_number: Option<String>,
    #[serde(rename = "r", default)]
    pub registration: Option<String>,
    #[serde(rename = "t", default)]
    pub aircraft_type: Option<String>,
    #[serde(rename = "ownOp", default)]
    pub owner_operator: Option<String>,
}

/// A validated aircraft record with its derived distance and priority.
/// Built once per fetch cycle and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Aircraft {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_baro: Option<f64>,
    pub altitude_geom: Option<f64>,
    pub true_heading: Option<f64>,
    pub outside_air_temp: Option<f64>,
    pub ground_speed: Option<f64>,
    pub indicated_airspeed: Option<f64>,
    pub mach_number: Option<f64>,
    pub flight_number: Option<String>,
    pub registration: Option<String>,
    pub aircraft_type: Option<String>,
    pub owner_operator: Option<String>,
    pub distance_km: f64,
    pub priority: DisplayPriority,
}

impl Aircraft {
    fn from_raw(raw: RawAircraft, observer: Observer) -> Aircraft {
        let distance_km = observer.distance_to_km(raw.latitude, raw.longitude);
        let priority = classify(&raw, distance_km);
        Aircraft {
            latitude: raw.latitude,
            longitude: raw.longitude,
            altitude_baro: raw.altitude_baro,
            altitude_geom: raw.altitude_geom,
            true_heading: raw.true_heading,
            outside_air_temp: raw.outside_air_temp,
            ground_speed: raw.ground_speed,
            indicated_airspeed: raw.indicated_airspeed,
            mach_number: raw.mach_number,
            flight_number: raw.flight_number,
            registration: raw.registration,
            aircraft_type: raw.aircraft_type,
            owner_operator: raw.owner_operator,
            distance_km,
            priority,
        }
    }

    /// Identifier shown on the display: registration, else flight number,
    /// else a placeholder.
    pub fn display_ident(&self) -> &str {
        self.registration
            .as_deref()
            .or(self.flight_number.as_deref())
            .unwrap_or("?")
    }
}

/// Ordered classification rules; the first match wins. Military and notable
/// operators rank above low-slow-close traffic, which ranks above everything
/// else.
fn classify(raw: &RawAircraft, distance_km: f64) -> DisplayPriority {
    if let Some(registration) = &raw.registration {
        if starts_with_any(registration, &NOTABLE_PREFIXES) {
            return DisplayPriority::High;
        }
    }
    if let Some(flight_number) = &raw.flight_number {
        if starts_with_any(flight_number, &NOTABLE_PREFIXES) {
            return DisplayPriority::High;
        }
    }
    if let Some(aircraft_type) = &raw.aircraft_type {
        if contains_any(aircraft_type, &NOTABLE_TYPES) {
            return DisplayPriority::High;
        }
    }
    if raw.owner_operator.is_some() {
        return DisplayPriority::High;
    }
    if let Some(altitude) = raw.altitude_baro {
        if altitude < 10_000.0 && distance_km < 20.0 {
            return DisplayPriority::High;
        }
        if altitude < 30_000.0 && distance_km < 50.0 {
            return DisplayPriority::Medium;
        }
    }
    DisplayPriority::Low
}

fn starts_with_any(value: &str, prefixes: &[&str]) -> bool {
    let value = value.to_lowercase();
    prefixes.iter().any(|prefix| value.starts_with(prefix))
}

fn contains_any(value: &str, fragments: &[&str]) -> bool {
    let value = value.to_lowercase();
    fragments.iter().any(|fragment| value.contains(fragment))
}

/// A barometric altitude is either a number of feet or the literal string
/// `"ground"`, which normalizes to no altitude.
fn altitude_or_ground<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s == "ground" => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            serde::de::Error::custom("altitude must be a number or the string \"ground\"")
        }),
    }
}

#[derive(Debug, Error)]
#[error("invalid aircraft record at index {index}: {source}")]
pub struct ParseError {
    pub index: usize,
    #[source]
    pub source: serde_json::Error,
}

/// Validates a batch of raw records and returns them sorted by ascending
/// distance from the observer. A single invalid record fails the whole
/// batch; that cycle then produces no display update.
pub fn parse_aircraft(raw: &[Value], observer: Observer) -> Result<Vec<Aircraft>, ParseError> {
    let mut aircraft = Vec::with_capacity(raw.len());
    for (index, value) in raw.iter().enumerate() {
        let record: RawAircraft =
            serde_json::from_value(value.clone()).map_err(|source| ParseError { index, source })?;
        aircraft.push(Aircraft::from_raw(record, observer));
    }
    // sort_by is stable, so equidistant records keep their input order
    aircraft.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    Ok(aircraft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OBSERVER: Observer = Observer {
        latitude: 46.0569,
        longitude: 14.5058,
    };

    fn raw(latitude: f64, longitude: f64) -> RawAircraft {
        RawAircraft {
            latitude,
            longitude,
            altitude_baro: None,
            altitude_geom: None,
            true_heading: None,
            outside_air_temp: None,
            ground_speed: None,
            indicated_airspeed: None,
            mach_number: None,
            flight_number: None,
            registration: None,
            aircraft_type: None,
            owner_operator: None,
        }
    }

    #[test]
    fn registration_prefix_is_high_case_insensitive() {
        let mut upper = raw(46.0, 14.0);
        upper.registration = Some(String::from("S5B123"));
        let mut lower = raw(46.0, 14.0);
        lower.registration = Some(String::from("s5b123"));
        assert_eq!(classify(&upper, 300.0), DisplayPriority::High);
        assert_eq!(classify(&lower, 300.0), DisplayPriority::High);
    }

    #[test]
    fn flight_number_prefix_is_high() {
        let mut record = raw(46.0, 14.0);
        record.flight_number = Some(String::from("TORUK51"));
        assert_eq!(classify(&record, 300.0), DisplayPriority::High);
    }

    #[test]
    fn aircraft_type_substring_is_high() {
        // The match is a substring, not a prefix
        let mut record = raw(46.0, 14.0);
        record.aircraft_type = Some(String::from("LKC130H"));
        assert_eq!(classify(&record, 300.0), DisplayPriority::High);
    }

    #[test]
    fn any_owner_operator_is_high() {
        let mut record = raw(46.0, 14.0);
        record.owner_operator = Some(String::from("Some Airline"));
        assert_eq!(classify(&record, 300.0), DisplayPriority::High);
    }

    #[test]
    fn low_slow_close_is_high() {
        let mut record = raw(46.0, 14.0);
        record.altitude_baro = Some(9_000.0);
        assert_eq!(classify(&record, 15.0), DisplayPriority::High);
    }

    #[test]
    fn mid_altitude_mid_distance_is_medium() {
        let mut record = raw(46.0, 14.0);
        record.altitude_baro = Some(25_000.0);
        assert_eq!(classify(&record, 40.0), DisplayPriority::Medium);
    }

    #[test]
    fn slow_but_too_far_for_high_still_medium() {
        // Too far for the high tier but inside the medium thresholds
        let mut record = raw(46.0, 14.0);
        record.altitude_baro = Some(5_000.0);
        assert_eq!(classify(&record, 30.0), DisplayPriority::Medium);
    }

    #[test]
    fn high_and_far_is_low() {
        let mut record = raw(46.0, 14.0);
        record.altitude_baro = Some(35_000.0);
        assert_eq!(classify(&record, 200.0), DisplayPriority::Low);
    }

    #[test]
    fn no_altitude_and_no_matches_is_low() {
        assert_eq!(classify(&raw(46.0, 14.0), 5.0), DisplayPriority::Low);
    }

    #[test]
    fn classification_is_deterministic() {
        let mut record = raw(46.0, 14.0);
        record.altitude_baro = Some(25_000.0);
        let first = classify(&record, 40.0);
        for _ in 0..10 {
            assert_eq!(classify(&record, 40.0), first);
        }
    }

    #[test]
    fn ground_altitude_parses_as_absent() {
        let batch = [json!({"lat": 46.1, "lon": 14.5, "alt_baro": "ground"})];
        let aircraft = parse_aircraft(&batch, OBSERVER).unwrap();
        assert_eq!(aircraft.len(), 1);
        assert!(aircraft[0].altitude_baro.is_none());
    }

    #[test]
    fn numeric_altitude_passes_through() {
        let batch = [json!({"lat": 46.1, "lon": 14.5, "alt_baro": 12500})];
        let aircraft = parse_aircraft(&batch, OBSERVER).unwrap();
        assert_eq!(aircraft[0].altitude_baro, Some(12_500.0));
    }

    #[test]
    fn unexpected_altitude_string_fails_the_record() {
        let batch = [json!({"lat": 46.1, "lon": 14.5, "alt_baro": "airborne"})];
        assert!(parse_aircraft(&batch, OBSERVER).is_err());
    }

    #[test]
    fn missing_latitude_fails_the_whole_batch() {
        let batch = [
            json!({"lat": 46.1, "lon": 14.5}),
            json!({"lon": 14.6}),
            json!({"lat": 46.2, "lon": 14.7}),
        ];
        let error = parse_aircraft(&batch, OBSERVER).unwrap_err();
        assert_eq!(error.index, 1);
    }

    #[test]
    fn parse_sorts_by_ascending_distance() {
        let batch = [
            json!({"lat": 47.0, "lon": 15.5, "flight": "FAR"}),
            json!({"lat": 46.06, "lon": 14.51, "flight": "NEAR"}),
            json!({"lat": 46.5, "lon": 15.0, "flight": "MID"}),
        ];
        let aircraft = parse_aircraft(&batch, OBSERVER).unwrap();
        let order: Vec<&str> = aircraft.iter().map(Aircraft::display_ident).collect();
        assert_eq!(order, ["NEAR", "MID", "FAR"]);
        assert!(aircraft
            .windows(2)
            .all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn derived_fields_are_populated() {
        let batch = [json!({
            "lat": 46.1,
            "lon": 14.5,
            "alt_baro": 4000,
            "gs": 140.5,
            "r": "D-EABC",
            "t": "C172",
        })];
        let aircraft = parse_aircraft(&batch, OBSERVER).unwrap();
        let ac = &aircraft[0];
        assert!(ac.distance_km >= 0.0 && ac.distance_km < 20.0);
        assert_eq!(ac.priority, DisplayPriority::High);
        assert_eq!(ac.display_ident(), "D-EABC");
    }

    #[test]
    fn ident_falls_back_to_flight_number() {
        let batch = [json!({"lat": 46.1, "lon": 14.5, "flight": "JA123"})];
        let aircraft = parse_aircraft(&batch, OBSERVER).unwrap();
        assert_eq!(aircraft[0].display_ident(), "JA123");
    }
}
