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

//! Live aircraft state and track history for map dashboards.
//!
//! This library polls a backend for full aircraft snapshots and derives what a
//! live map needs to draw. It has independent layers that can be used
//! separately or composed together:
//!
//! - **Source layer**: [`AircraftSource`] trait and the [`HttpSource`] backend client
//! - **Polling layer**: [`Poller`], a fixed-cadence fetch loop with immediate first tick
//! - **Tracker layer**: [`TrackBuffers`], bounded and deduplicated per-aircraft trails
//! - **Filter layer**: [`filter_recent`] and [`age_color`] for the live display subset
//!
//! # Quick Start
//!
//! Use the [`LiveView`] type for full-stack operation:
//!
//! ```no_run
//! use live_tracks::{HttpSource, LiveConfig, LiveView};
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let source = HttpSource::new("http://localhost:8080", Duration::from_secs(10)).unwrap();
//!     let view = LiveView::spawn(source, LiveConfig::default());
//!
//!     let mut frames = view.watch_frames();
//!     while frames.changed().await.is_ok() {
//!         let frame = frames.borrow_and_update().clone();
//!         for aircraft in &frame.live {
//!             println!("{}: {}", aircraft.icao, frame.color_for(aircraft));
//!         }
//!     }
//! }
//! ```
//!
//! # Using Individual Layers
//!
//! The transforms are pure and take the clock as an argument:
//!
//! ```
//! use live_tracks::{AircraftRecord, Now, Snapshot, TrackBuffers, TrackConfig, filter_recent};
//!
//! let snapshot = Snapshot::new(vec![AircraftRecord {
//!     latitude: Some(10.0),
//!     longitude: Some(20.0),
//!     last_seen: Some(1000),
//!     ..AircraftRecord::new("A1B2C3")
//! }]);
//!
//! let update = TrackBuffers::new().update(&snapshot, Now::from_secs(1000), 5.0, &TrackConfig::default());
//! assert_eq!(update.buffers.len(), 1);
//!
//! let live = filter_recent(&snapshot, 1000, 5.0);
//! assert_eq!(live.len(), 1);
//! ```

pub mod color;
pub mod filter;
pub mod poller;
pub mod snapshot;
pub mod source;
pub mod time;
pub mod tracker;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio::sync::{broadcast, watch};

pub use color::{age_color, Rgb, FRESH_COLOR, STALE_COLOR};
pub use filter::{age_minutes, filter_recent, is_recent};
pub use poller::{PollOutcome, Poller, SnapshotSink};
pub use snapshot::{AircraftRecord, Coordinate, Snapshot};
pub use source::{AircraftSource, FetchError, HttpSource, TrackSample};
pub use time::Now;
pub use tracker::{TrackBuffers, TrackConfig, TrackEvent, TrackPoint, TrackUpdate};

/// Configuration for the full-stack live view.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Time between the end of one fetch and the start of the next.
    pub poll_interval: Duration,
    /// Staleness threshold for the live subset, in minutes.
    pub max_age_minutes: f64,
    /// Track buffering configuration.
    pub tracks: TrackConfig,
    /// Broadcast channel capacity for track events.
    pub event_channel_capacity: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_age_minutes: 5.0,
            tracks: TrackConfig::default(),
            event_channel_capacity: 256,
        }
    }
}

/// Everything the rendering layer needs for one poll generation.
///
/// Frames are immutable; every tick publishes a new one.
#[derive(Debug, Clone, Default)]
pub struct LiveFrame {
    /// Latest successfully fetched snapshot.
    pub snapshot: Snapshot,
    /// Records of `snapshot` that pass the recency filter, in snapshot order.
    pub live: Vec<AircraftRecord>,
    /// Track history per aircraft.
    pub tracks: TrackBuffers,
    /// Time of the last successful fetch.
    pub last_updated: Option<DateTime<Utc>>,
    /// Reason of the most recent failure, cleared by the next success.
    pub error: Option<String>,
    /// Staleness threshold the frame was computed with.
    pub max_age_minutes: f64,
    /// Clock reading the frame was computed at.
    pub computed_at: Option<Now>,
    /// Number of ticks processed so far.
    pub generation: u64,
}

impl LiveFrame {
    /// Live records that have a position to draw.
    pub fn renderable(&self) -> impl Iterator<Item = &AircraftRecord> {
        self.live.iter().filter(|record| record.position().is_some())
    }

    /// Age color of a record relative to this frame's clock.
    #[must_use]
    pub fn color_for(&self, record: &AircraftRecord) -> Rgb {
        let now_secs = self.computed_at.unwrap_or_else(Now::utc).seconds();
        age_color(record.last_seen, now_secs, self.max_age_minutes)
    }
}

/// Poll sink that owns the live state and publishes frames.
struct LiveState {
    frame: Arc<LiveFrame>,
    config: TrackConfig,
    max_age_rx: watch::Receiver<f64>,
    frame_tx: watch::Sender<Arc<LiveFrame>>,
    event_tx: broadcast::Sender<TrackEvent>,
}

impl SnapshotSink for LiveState {
    fn on_poll(&mut self, outcome: PollOutcome, now: Now) {
        let previous = &self.frame;
        let max_age_minutes = *self.max_age_rx.borrow();

        let (snapshot, tracks, last_updated, error) = match outcome {
            PollOutcome::Snapshot(snapshot) => {
                let update = previous
                    .tracks
                    .update(&snapshot, now, max_age_minutes, &self.config);
                for event in update.events {
                    debug!("Track event: {:?}", event);
                    let _ = self.event_tx.send(event);
                }
                (snapshot, update.buffers, now.to_datetime(), None)
            }
            PollOutcome::Failed(reason) => (
                previous.snapshot.clone(),
                previous.tracks.clone(),
                previous.last_updated,
                Some(reason),
            ),
        };

        let live = filter_recent(&snapshot, now.seconds(), max_age_minutes);
        debug!(
            "Frame {}: {} aircraft, {} live, {} tracks",
            previous.generation + 1,
            snapshot.len(),
            live.len(),
            tracks.len()
        );

        let frame = Arc::new(LiveFrame {
            snapshot,
            live,
            tracks,
            last_updated,
            error,
            max_age_minutes,
            computed_at: Some(now),
            generation: previous.generation + 1,
        });
        self.frame = Arc::clone(&frame);
        self.frame_tx.send_replace(frame);
    }
}

/// Full-stack live view that wires all layers together.
///
/// The view polls the source in a background task, keeps track history, and
/// publishes a fresh [`LiveFrame`] after every tick.
pub struct LiveView<S> {
    source: Arc<S>,
    poller: Poller,
    frame_rx: watch::Receiver<Arc<LiveFrame>>,
    max_age_tx: watch::Sender<f64>,
    event_tx: broadcast::Sender<TrackEvent>,
}

impl<S> std::fmt::Debug for LiveView<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveView")
            .field("poller", &self.poller)
            .field("max_age_minutes", &*self.max_age_tx.borrow())
            .finish_non_exhaustive()
    }
}

impl<S> LiveView<S>
where
    S: AircraftSource + 'static,
{
    /// Spawn a new live view polling `source`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(source: S, config: LiveConfig) -> Self {
        let source = Arc::new(source);
        let initial = Arc::new(LiveFrame {
            max_age_minutes: config.max_age_minutes,
            ..LiveFrame::default()
        });
        let (frame_tx, frame_rx) = watch::channel(Arc::clone(&initial));
        let (max_age_tx, max_age_rx) = watch::channel(config.max_age_minutes);
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        let state = LiveState {
            frame: initial,
            config: config.tracks,
            max_age_rx,
            frame_tx,
            event_tx: event_tx.clone(),
        };

        info!(
            "Starting live view (interval {:?}, max age {} min)",
            config.poll_interval, config.max_age_minutes
        );
        let poller = Poller::spawn(Arc::clone(&source), state, config.poll_interval);

        Self {
            source,
            poller,
            frame_rx,
            max_age_tx,
            event_tx,
        }
    }

    /// Get the most recently published frame.
    #[must_use]
    pub fn frame(&self) -> Arc<LiveFrame> {
        self.frame_rx.borrow().clone()
    }

    /// Get a receiver that is notified whenever a new frame is published.
    #[must_use]
    pub fn watch_frames(&self) -> watch::Receiver<Arc<LiveFrame>> {
        self.frame_rx.clone()
    }

    /// Subscribe to track events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TrackEvent> {
        self.event_tx.subscribe()
    }

    /// Change the polling interval; the next fetch happens right away.
    pub fn set_poll_interval(&self, interval: Duration) {
        self.poller.set_interval(interval);
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poller.interval()
    }

    /// Change the staleness threshold; applies from the next tick.
    pub fn set_max_age_minutes(&self, minutes: f64) {
        self.max_age_tx.send_replace(minutes);
    }

    #[must_use]
    pub fn max_age_minutes(&self) -> f64 {
        *self.max_age_tx.borrow()
    }

    /// Fetch the detailed server-side track of one aircraft.
    pub async fn fetch_track(&self, icao: &str) -> Result<Vec<TrackSample>, FetchError> {
        self.source.fetch_track(icao).await
    }

    /// Whether the background poll task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    /// Shut down the live view. Safe to call more than once.
    pub fn shutdown(&self) {
        self.poller.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::poller::tests::FakeSource;

    fn positioned(icao: &str, lat: f64, lon: f64, last_seen: Option<i64>) -> AircraftRecord {
        AircraftRecord {
            latitude: Some(lat),
            longitude: Some(lon),
            last_seen,
            ..AircraftRecord::new(icao)
        }
    }

    async fn next_frame(rx: &mut watch::Receiver<Arc<LiveFrame>>) -> Arc<LiveFrame> {
        rx.changed().await.unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_frame() {
        let source = FakeSource::with_records(vec![
            positioned("A", 10.0, 20.0, None),
            AircraftRecord::new("NOPOS"),
        ]);
        let view = LiveView::spawn(source, LiveConfig::default());
        let mut events = view.subscribe();
        let mut frames = view.watch_frames();
        assert_eq!(view.frame().generation, 0);

        let frame = next_frame(&mut frames).await;
        assert_eq!(frame.generation, 1);
        assert_eq!(frame.snapshot.len(), 2);
        assert_eq!(frame.live.len(), 2);
        assert_eq!(frame.renderable().count(), 1);
        assert!(frame.tracks.contains("A"));
        assert!(!frame.tracks.contains("NOPOS"));
        assert!(frame.last_updated.is_some());
        assert!(frame.error.is_none());

        assert_eq!(events.recv().await.unwrap(), TrackEvent::Started("A".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_last_good_state() {
        let source = FakeSource::with_records(vec![positioned("A", 10.0, 20.0, None)]);
        let view = LiveView::spawn(source, LiveConfig::default());
        let mut frames = view.watch_frames();

        let good = next_frame(&mut frames).await;

        view.source.failing.store(true, Ordering::SeqCst);
        let failed = next_frame(&mut frames).await;
        assert_eq!(failed.error.as_deref(), Some("HTTP error: 503"));
        assert_eq!(failed.snapshot, good.snapshot);
        assert_eq!(failed.tracks, good.tracks);
        assert_eq!(failed.last_updated, good.last_updated);
        assert_eq!(failed.generation, 2);

        view.source.failing.store(false, Ordering::SeqCst);
        let recovered = next_frame(&mut frames).await;
        assert!(recovered.error.is_none());
        assert!(view.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_aircraft_keeps_track_until_expiry() {
        let source = FakeSource::with_records(vec![positioned("A", 10.0, 20.0, None)]);
        let view = LiveView::spawn(source, LiveConfig::default());
        let mut frames = view.watch_frames();
        next_frame(&mut frames).await;

        view.source.set_records(Vec::new());
        let frame = next_frame(&mut frames).await;
        assert!(frame.snapshot.is_empty());
        assert!(frame.live.is_empty());
        // Absent only briefly: the trail survives.
        assert!(frame.tracks.contains("A"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_age_change_applies_next_tick() {
        let ten_minutes_ago = Utc::now().timestamp() - 600;
        let source = FakeSource::with_records(vec![positioned("A", 1.0, 1.0, Some(ten_minutes_ago))]);
        let view = LiveView::spawn(source, LiveConfig::default());
        let mut frames = view.watch_frames();

        let frame = next_frame(&mut frames).await;
        assert!(frame.live.is_empty());
        assert_eq!(frame.color_for(&frame.snapshot.records()[0]), STALE_COLOR);

        view.set_max_age_minutes(30.0);
        assert!((view.max_age_minutes() - 30.0).abs() < f64::EPSILON);
        let frame = next_frame(&mut frames).await;
        assert_eq!(frame.live.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_frames() {
        let source = FakeSource::default();
        let view = LiveView::spawn(source, LiveConfig::default());
        let mut frames = view.watch_frames();
        next_frame(&mut frames).await;

        view.shutdown();
        view.shutdown();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(view.source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(view.frame().generation, 1);
        assert!(!view.is_running());
    }
}
