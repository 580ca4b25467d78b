// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Aircraft snapshot records as delivered by the backend.
//!
//! A [`Snapshot`] is the full list of aircraft visible at one poll instant. It
//! always replaces the previous list; nothing is merged. Records are decoded
//! leniently: a coordinate that is missing, `null` or not a number becomes
//! `None`, while `0.0` stays a perfectly valid coordinate.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A validated (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// One observed aircraft in a snapshot.
///
/// Only `icao`, the coordinates and `last_seen` drive tracking and filtering.
/// Everything else is passed through to the presentation layer untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftRecord {
    /// ICAO 24-bit address (hex string, e.g., "A1B2C3").
    #[serde(alias = "hex")]
    pub icao: String,
    /// Latitude in degrees.
    #[serde(
        default,
        alias = "lat",
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    #[serde(
        default,
        alias = "lon",
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<f64>,
    /// Unix timestamp (seconds) of the last observation.
    #[serde(
        default,
        alias = "lastSeen",
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_seen: Option<i64>,
    /// Altitude in feet.
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Ground speed in knots.
    #[serde(
        default,
        alias = "groundSpeed",
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub ground_speed: Option<f64>,
    /// Vertical rate in feet per minute.
    #[serde(
        default,
        alias = "verticalRate",
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub vertical_rate: Option<f64>,
    /// Track angle in degrees (0-360, north = 0).
    #[serde(
        default,
        alias = "heading",
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub track: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squawk: Option<String>,
    #[serde(default, alias = "flight", skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
    #[serde(default, alias = "typeCode", skip_serializing_if = "Option::is_none")]
    pub type_code: Option<String>,
    #[serde(
        default,
        alias = "typeDescription",
        skip_serializing_if = "Option::is_none"
    )]
    pub type_description: Option<String>,
}

impl AircraftRecord {
    /// Create a record with only an identifier set.
    #[must_use]
    pub fn new(icao: impl Into<String>) -> Self {
        Self {
            icao: icao.into(),
            ..Self::default()
        }
    }

    /// Returns the position if both axes are present and finite.
    #[must_use]
    pub fn position(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Some(Coordinate {
                    latitude,
                    longitude,
                })
            }
            _ => None,
        }
    }

    /// Callsign with padding removed, falling back to the ICAO address.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.callsign
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.icao)
    }
}

/// A full, replacing list of aircraft at one poll instant.
///
/// Cloning is cheap: the records are shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Vec<AircraftRecord>")]
pub struct Snapshot {
    records: Arc<[AircraftRecord]>,
}

impl Snapshot {
    #[must_use]
    pub fn new(records: Vec<AircraftRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    #[must_use]
    pub fn records(&self) -> &[AircraftRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AircraftRecord> {
        self.records.iter()
    }

    /// Records that carry a well-formed position, in snapshot order.
    pub fn with_position(&self) -> impl Iterator<Item = (&AircraftRecord, Coordinate)> {
        self.records
            .iter()
            .filter_map(|record| record.position().map(|pos| (record, pos)))
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl From<Vec<AircraftRecord>> for Snapshot {
    fn from(records: Vec<AircraftRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a AircraftRecord;
    type IntoIter = std::slice::Iter<'a, AircraftRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "fractional epoch seconds are floored and range-checked before the cast"
)]
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| {
        v.as_i64().or_else(|| {
            v.as_f64()
                .map(f64::floor)
                .filter(|f| (i64::MIN as f64..i64::MAX as f64).contains(f))
                .map(|f| f as i64)
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_a_valid_coordinate() {
        let record = AircraftRecord {
            latitude: Some(0.0),
            longitude: Some(0.0),
            ..AircraftRecord::new("A1B2C3")
        };
        assert_eq!(
            record.position(),
            Some(Coordinate {
                latitude: 0.0,
                longitude: 0.0
            })
        );
    }

    #[test]
    fn test_partial_position_is_invalid() {
        let record = AircraftRecord {
            longitude: Some(12.0),
            ..AircraftRecord::new("A1B2C3")
        };
        assert!(record.position().is_none());

        let record = AircraftRecord {
            latitude: Some(f64::NAN),
            longitude: Some(12.0),
            ..AircraftRecord::new("A1B2C3")
        };
        assert!(record.position().is_none());
    }

    #[test]
    fn test_decode_lenient_coordinates() {
        let json = r#"[
            {"icao": "A1", "latitude": 0, "longitude": 0, "last_seen": 1000},
            {"icao": "A2", "latitude": null, "longitude": 12.0},
            {"hex": "A3", "lat": "bogus", "lon": 4.5, "lastSeen": 1000.7},
            {"icao": "A4"}
        ]"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.len(), 4);

        let records = snapshot.records();
        assert!(records[0].position().is_some());
        assert_eq!(records[0].last_seen, Some(1000));
        assert_eq!(records[1].latitude, None);
        assert_eq!(records[2].icao, "A3");
        assert_eq!(records[2].latitude, None);
        assert_eq!(records[2].last_seen, Some(1000));
        assert_eq!(records[3].last_seen, None);

        let valid: Vec<_> = snapshot.with_position().map(|(r, _)| r.icao.as_str()).collect();
        assert_eq!(valid, vec!["A1"]);
    }

    #[test]
    fn test_decode_out_of_range_timestamp() {
        let json = r#"[
            {"icao": "A1", "latitude": 1.0, "longitude": 2.0, "last_seen": -1e300},
            {"icao": "A2", "latitude": 1.0, "longitude": 2.0, "last_seen": 1e19},
            {"icao": "A3", "latitude": 1.0, "longitude": 2.0, "last_seen": -1.5}
        ]"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        let seen: Vec<_> = snapshot.iter().map(|r| r.last_seen).collect();
        assert_eq!(seen, vec![None, None, Some(-2)]);
    }

    #[test]
    fn test_display_name() {
        let mut record = AircraftRecord::new("A1B2C3");
        assert_eq!(record.display_name(), "A1B2C3");
        record.callsign = Some("UAL123  ".to_string());
        assert_eq!(record.display_name(), "UAL123");
    }
}
