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

//! Plain-text rendering of live frames for the terminal.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use live_tracks::{age_minutes, AircraftRecord, LiveFrame, TrackSample};

/// Render one frame as a table, one line per live aircraft.
pub fn render_frame(frame: &LiveFrame, show_tracks: bool) -> String {
    let mut out = String::new();
    let now_secs = frame.computed_at.map_or_else(|| Utc::now().timestamp(), |now| now.seconds());

    let _ = writeln!(
        out,
        "{} aircraft, {} live, {} with position, {} tracks | updated {}",
        frame.snapshot.len(),
        frame.live.len(),
        frame.renderable().count(),
        frame.tracks.len(),
        format_time(frame.last_updated)
    );
    if let Some(error) = &frame.error {
        let _ = writeln!(out, "last fetch failed: {error}");
    }

    let _ = writeln!(
        out,
        "{:<8} {:<9} {:>10} {:>11} {:>7} {:>6} {:>8}  {}",
        "ICAO", "CALLSIGN", "LAT", "LON", "ALT", "AGE", "COLOR", "TRACK"
    );
    for record in frame.renderable() {
        let trail = if show_tracks {
            frame.tracks.get(&record.icao).map_or(0, std::collections::VecDeque::len)
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{:<8} {:<9} {:>10} {:>11} {:>7} {:>6} {:>8}  {}",
            record.icao,
            record.display_name(),
            format_coord(record.latitude),
            format_coord(record.longitude),
            record.altitude.map_or_else(|| "-".to_string(), |alt| format!("{alt:.0}")),
            format_age(record, now_secs),
            frame.color_for(record),
            trail
        );
    }
    out
}

/// Render the server-side track of one aircraft.
pub fn render_track(icao: &str, samples: &[TrackSample]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{icao}: {} points", samples.len());
    for sample in samples {
        let _ = writeln!(
            out,
            "{:>12.0} {:>10.5} {:>11.5}",
            sample.timestamp, sample.latitude, sample.longitude
        );
    }
    out
}

fn format_coord(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.5}"))
}

fn format_age(record: &AircraftRecord, now_secs: i64) -> String {
    age_minutes(record, now_secs).map_or_else(|| "?".to_string(), |age| format!("{age:.1}m"))
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "never".to_string(), |t| t.format("%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use live_tracks::{Now, Snapshot, TrackBuffers, TrackConfig};

    fn frame() -> LiveFrame {
        let snapshot = Snapshot::new(vec![
            AircraftRecord {
                latitude: Some(10.0),
                longitude: Some(20.0),
                last_seen: Some(1000),
                callsign: Some("UAL123 ".to_string()),
                ..AircraftRecord::new("A1B2C3")
            },
            AircraftRecord::new("NOPOS"),
        ]);
        let now = Now::from_secs(1030);
        let tracks = TrackBuffers::new()
            .update(&snapshot, now, 5.0, &TrackConfig::default())
            .buffers;
        LiveFrame {
            live: snapshot.records().to_vec(),
            snapshot,
            tracks,
            max_age_minutes: 5.0,
            computed_at: Some(now),
            generation: 1,
            ..LiveFrame::default()
        }
    }

    #[test]
    fn test_render_frame() {
        let text = render_frame(&frame(), true);
        assert!(text.starts_with("2 aircraft, 2 live, 1 with position, 1 tracks | updated never"));
        assert!(text.contains("UAL123"));
        assert!(text.contains("0.5m"));
        assert!(!text.contains("NOPOS"));
    }

    #[test]
    fn test_render_error_line() {
        let frame = LiveFrame {
            error: Some("HTTP error: 502".to_string()),
            ..frame()
        };
        assert!(render_frame(&frame, false).contains("last fetch failed: HTTP error: 502"));
    }

    #[test]
    fn test_render_track() {
        let samples = [TrackSample {
            longitude: 20.0,
            latitude: 10.0,
            timestamp: 1000.0,
        }];
        let text = render_track("A1B2C3", &samples);
        assert!(text.starts_with("A1B2C3: 1 points"));
        assert!(text.contains("10.00000"));
    }
}
