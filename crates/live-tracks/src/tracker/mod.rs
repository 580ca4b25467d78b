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

//! Per-aircraft track history.
//!
//! This module keeps a bounded, deduplicated trail of positions for every
//! aircraft seen in the snapshots. Each update is a pure transform: the
//! previous [`TrackBuffers`] value is left untouched and a new one is returned,
//! together with the [`TrackEvent`]s describing what changed.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;

use crate::snapshot::{Coordinate, Snapshot};
use crate::time::Now;

/// Maximum number of points kept per aircraft.
pub const MAX_TRACK_POINTS: usize = 100;
/// Minimum per-axis movement before a new point is recorded (~100 meters at mid-latitudes).
pub const POSITION_CHANGE_THRESHOLD_DEGREES: f64 = 0.001;
/// Track history outlives the display window by this factor.
const EXPIRY_FACTOR: f64 = 2.0;
const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// A single recorded position, stamped with the ingestion time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub longitude: f64,
    pub latitude: f64,
    /// Milliseconds since the Unix epoch at which the point was recorded.
    pub timestamp_ms: i64,
}

impl TrackPoint {
    fn at(position: Coordinate, now: Now) -> Self {
        Self {
            longitude: position.longitude,
            latitude: position.latitude,
            timestamp_ms: now.millis(),
        }
    }

    /// Whether `position` differs from this point by more than `epsilon` on either axis.
    #[must_use]
    pub fn moved_beyond(&self, position: Coordinate, epsilon: f64) -> bool {
        (position.longitude - self.longitude).abs() > epsilon
            || (position.latitude - self.latitude).abs() > epsilon
    }
}

/// Events describing how an update changed the buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEvent {
    /// A buffer was created for a previously unseen aircraft.
    Started(String),
    /// A point was appended to an existing buffer.
    Extended(String),
    /// A buffer was dropped because its aircraft disappeared for too long.
    Evicted(String),
}

/// Configuration for track buffering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackConfig {
    /// Maximum points retained per aircraft (oldest dropped first).
    pub max_points: usize,
    /// Minimum movement in degrees on either axis before a point is recorded.
    pub min_move_degrees: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            max_points: MAX_TRACK_POINTS,
            min_move_degrees: POSITION_CHANGE_THRESHOLD_DEGREES,
        }
    }
}

/// Result of applying one snapshot.
#[derive(Debug, Clone)]
pub struct TrackUpdate {
    pub buffers: TrackBuffers,
    pub events: Vec<TrackEvent>,
}

/// Mapping from ICAO address to its chronological track.
///
/// Iteration order is unspecified; nothing depends on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackBuffers {
    tracks: HashMap<String, VecDeque<TrackPoint>>,
}

impl TrackBuffers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the track for an aircraft, oldest point first.
    #[must_use]
    pub fn get(&self, icao: &str) -> Option<&VecDeque<TrackPoint>> {
        self.tracks.get(icao)
    }

    /// Most recent point recorded for an aircraft.
    #[must_use]
    pub fn last_point(&self, icao: &str) -> Option<&TrackPoint> {
        self.tracks.get(icao).and_then(VecDeque::back)
    }

    #[must_use]
    pub fn contains(&self, icao: &str) -> bool {
        self.tracks.contains_key(icao)
    }

    /// Number of aircraft with a track.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Total number of points across all tracks.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.tracks.values().map(VecDeque::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VecDeque<TrackPoint>)> {
        self.tracks.iter().map(|(icao, points)| (icao.as_str(), points))
    }

    /// Apply a snapshot and return the resulting buffers.
    ///
    /// Aircraft with a valid position get a new point when they moved more
    /// than `config.min_move_degrees` on either axis. Aircraft absent from the
    /// snapshot are evicted once their last point is older than twice
    /// `max_age_minutes`. Aircraft present in the snapshot are never evicted,
    /// whatever their `last_seen` says.
    #[must_use]
    pub fn update(
        &self,
        snapshot: &Snapshot,
        now: Now,
        max_age_minutes: f64,
        config: &TrackConfig,
    ) -> TrackUpdate {
        let mut tracks = self.tracks.clone();
        let mut events = Vec::new();

        for (record, position) in snapshot.with_position() {
            match tracks.get_mut(&record.icao) {
                None => {
                    tracks.insert(
                        record.icao.clone(),
                        VecDeque::from([TrackPoint::at(position, now)]),
                    );
                    events.push(TrackEvent::Started(record.icao.clone()));
                }
                Some(points) => {
                    let moved = points
                        .back()
                        .is_none_or(|last| last.moved_beyond(position, config.min_move_degrees));
                    if moved {
                        points.push_back(TrackPoint::at(position, now));
                        while points.len() > config.max_points {
                            points.pop_front();
                        }
                        events.push(TrackEvent::Extended(record.icao.clone()));
                    }
                }
            }
        }

        let present: HashSet<&str> = snapshot.iter().map(|r| r.icao.as_str()).collect();
        let expiry_ms = EXPIRY_FACTOR * max_age_minutes * MILLIS_PER_MINUTE;

        tracks.retain(|icao, points| {
            if present.contains(icao.as_str()) {
                return true;
            }
            let Some(last) = points.back() else {
                return false;
            };
            if age_ms(last, now) > expiry_ms {
                events.push(TrackEvent::Evicted(icao.clone()));
                false
            } else {
                true
            }
        });

        debug!(
            "Track update: {} aircraft, {} tracks, {} events",
            snapshot.len(),
            tracks.len(),
            events.len()
        );

        TrackUpdate {
            buffers: Self { tracks },
            events,
        }
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "track ages are far below 2^52 milliseconds"
)]
fn age_ms(point: &TrackPoint, now: Now) -> f64 {
    now.millis().saturating_sub(point.timestamp_ms) as f64
}
