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

//! Age-based marker coloring.
//!
//! Colors are interpolated linearly in RGB space between a fresh and a stale
//! endpoint, saturating once the age reaches the staleness threshold.

use std::fmt;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Linear interpolation towards `other`, with `t` clamped to `0.0..=1.0`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        Self {
            r: lerp_channel(self.r, other.r, t),
            g: lerp_channel(self.g, other.g, t),
            b: lerp_channel(self.b, other.b, t),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Color for an aircraft seen just now (green).
pub const FRESH_COLOR: Rgb = Rgb::new(0x22, 0xc5, 0x5e);
/// Color for an aircraft at or beyond the staleness threshold (gray).
pub const STALE_COLOR: Rgb = Rgb::new(0x9c, 0xa3, 0xaf);

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is rounded and clamped to the u8 range first"
)]
fn lerp_channel(from: u8, to: u8, t: f64) -> u8 {
    let value = f64::from(from) + (f64::from(to) - f64::from(from)) * t;
    value.round().clamp(0.0, 255.0) as u8
}

/// Marker color for an aircraft last seen at `last_seen` (Unix seconds).
///
/// Unknown timestamps map to [`FRESH_COLOR`]. The ratio `age / max_age` is
/// clamped to `0.0..=1.0`, so future timestamps are fresh and anything older
/// than `max_age_minutes` is fully stale.
#[allow(
    clippy::cast_precision_loss,
    reason = "epoch second differences are only used as a clamped ratio"
)]
#[must_use]
pub fn age_color(last_seen: Option<i64>, now_secs: i64, max_age_minutes: f64) -> Rgb {
    let Some(seen) = last_seen else {
        return FRESH_COLOR;
    };
    let max_age_secs = max_age_minutes * 60.0;
    if max_age_secs <= 0.0 {
        return STALE_COLOR;
    }
    let ratio = (now_secs.saturating_sub(seen) as f64 / max_age_secs).min(1.0);
    FRESH_COLOR.lerp(STALE_COLOR, ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_fresh() {
        assert_eq!(age_color(None, 1000, 5.0), FRESH_COLOR);
    }

    #[test]
    fn test_endpoints_and_clamping() {
        assert_eq!(age_color(Some(1000), 1000, 5.0), FRESH_COLOR);
        assert_eq!(age_color(Some(700), 1000, 5.0), STALE_COLOR);
        assert_eq!(age_color(Some(0), 1000, 5.0), STALE_COLOR);
        assert_eq!(age_color(Some(2000), 1000, 5.0), FRESH_COLOR);
    }

    #[test]
    fn test_extreme_timestamps_clamp() {
        let now = 1_700_000_000;
        assert_eq!(age_color(Some(i64::MIN), now, 5.0), STALE_COLOR);
        assert_eq!(age_color(Some(i64::MAX), now, 5.0), FRESH_COLOR);
        assert_eq!(age_color(Some(i64::MIN), i64::MAX, 5.0), STALE_COLOR);
    }

    #[test]
    fn test_midpoint() {
        let mid = age_color(Some(850), 1000, 5.0);
        // Halfway between 0x22 and 0x9c is 0x5f.
        assert_eq!(mid.r, 0x5f);
        assert_eq!(mid.b, 0x87);
    }

    #[test]
    fn test_hex_display() {
        assert_eq!(FRESH_COLOR.to_string(), "#22c55e");
        assert_eq!(STALE_COLOR.to_string(), "#9ca3af");
    }
}
