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

//! Wall-clock instants used by the pure transforms.
//!
//! The tracker and filter never read the system clock themselves; callers pass
//! a [`Now`] so that every update is reproducible under test.

use chrono::{DateTime, TimeZone, Utc};

/// A wall-clock instant with millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Now {
    millis: i64,
}

impl Now {
    /// Read the current system time.
    #[must_use]
    pub fn utc() -> Self {
        Self::from_datetime(Utc::now())
    }

    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            millis: at.timestamp_millis(),
        }
    }

    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self {
            millis: secs * 1000,
        }
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.millis
    }

    /// Whole seconds since the Unix epoch (floored).
    #[must_use]
    pub const fn seconds(self) -> i64 {
        self.millis.div_euclid(1000)
    }

    /// Convert back to a `chrono` timestamp, if representable.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.millis).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_floor() {
        assert_eq!(Now::from_millis(1_999).seconds(), 1);
        assert_eq!(Now::from_millis(-1).seconds(), -1);
        assert_eq!(Now::from_secs(1060).millis(), 1_060_000);
    }

    #[test]
    fn test_datetime_roundtrip() {
        let now = Now::from_secs(1_700_000_000);
        let dt = now.to_datetime().unwrap();
        assert_eq!(Now::from_datetime(dt), now);
    }
}
