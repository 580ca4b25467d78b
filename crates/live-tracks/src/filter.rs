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

//! Recency filter deriving the live display subset from a snapshot.

use crate::snapshot::AircraftRecord;

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Age of a record in minutes, or `None` when `last_seen` is unknown.
#[allow(
    clippy::cast_precision_loss,
    reason = "epoch second differences are converted to fractional minutes"
)]
#[must_use]
pub fn age_minutes(record: &AircraftRecord, now_secs: i64) -> Option<f64> {
    record
        .last_seen
        .map(|seen| now_secs.saturating_sub(seen) as f64 / SECONDS_PER_MINUTE)
}

/// Whether a record counts as live.
///
/// Records without `last_seen` are always live. The boundary is inclusive: an
/// age of exactly `max_age_minutes` is still live.
#[must_use]
pub fn is_recent(record: &AircraftRecord, now_secs: i64, max_age_minutes: f64) -> bool {
    age_minutes(record, now_secs).is_none_or(|age| age <= max_age_minutes)
}

/// Return the live records in their original order.
#[must_use]
pub fn filter_recent<'a, I>(records: I, now_secs: i64, max_age_minutes: f64) -> Vec<AircraftRecord>
where
    I: IntoIterator<Item = &'a AircraftRecord>,
{
    records
        .into_iter()
        .filter(|record| is_recent(record, now_secs, max_age_minutes))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;

    fn seen(icao: &str, last_seen: Option<i64>) -> AircraftRecord {
        AircraftRecord {
            last_seen,
            ..AircraftRecord::new(icao)
        }
    }

    #[test]
    fn test_unknown_age_is_live() {
        let record = seen("A", None);
        assert!(is_recent(&record, 1_000_000, 0.0));
        assert!(is_recent(&record, 1_000_000, 1.0));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let now = 10_000;
        assert!(is_recent(&seen("A", Some(now - 300)), now, 5.0));
        assert!(!is_recent(&seen("A", Some(now - 301)), now, 5.0));
    }

    #[test]
    fn test_filter_preserves_order() {
        let snapshot = Snapshot::new(vec![
            seen("C", Some(990)),
            seen("OLD", Some(0)),
            seen("A", None),
            seen("B", Some(1000)),
        ]);
        let live = filter_recent(&snapshot, 1000, 5.0);
        let ids: Vec<&str> = live.iter().map(|r| r.icao.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
        assert_eq!(snapshot.len(), 4);
    }

    #[test]
    fn test_future_timestamp_is_live() {
        assert!(is_recent(&seen("A", Some(2000)), 1000, 5.0));
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let now = 1_700_000_000;
        let records = [
            seen("ANCIENT", Some(i64::MIN)),
            seen("FAR_FUTURE", Some(i64::MAX)),
            seen("A", Some(now)),
        ];
        let live = filter_recent(&records, now, 5.0);
        let ids: Vec<&str> = live.iter().map(|r| r.icao.as_str()).collect();
        assert_eq!(ids, vec!["FAR_FUTURE", "A"]);
        assert!(!is_recent(&seen("ANCIENT", Some(i64::MIN)), i64::MAX, 5.0));
    }
}
