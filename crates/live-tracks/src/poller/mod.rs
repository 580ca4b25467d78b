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

//! Fixed-cadence snapshot polling.
//!
//! A [`Poller`] runs in a background task that fetches the full aircraft list
//! from an [`AircraftSource`] and hands every outcome to a [`SnapshotSink`].
//! The first fetch happens immediately. The next one is only scheduled once the
//! previous fetch has settled and the sink has processed it, so ticks never
//! overlap and snapshots reach the sink in the order they were received.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::snapshot::Snapshot;
use crate::source::AircraftSource;
use crate::time::Now;

/// Result of one poll tick.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// A full snapshot replacing the previous one.
    Snapshot(Snapshot),
    /// The fetch failed; the reason is the error's display text.
    Failed(String),
}

/// Receiver of poll outcomes.
///
/// Called synchronously from the poll task; implementations must not block.
pub trait SnapshotSink: Send + 'static {
    fn on_poll(&mut self, outcome: PollOutcome, now: Now);
}

/// Handle to a running poll loop.
///
/// Dropping the handle stops polling. The interval is not validated here;
/// callers are expected to keep it within their configured bounds.
pub struct Poller {
    interval_tx: watch::Sender<Duration>,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("interval", &*self.interval_tx.borrow())
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl Poller {
    /// Spawn a poll loop on the current tokio runtime.
    #[must_use]
    pub fn spawn<S, K>(source: Arc<S>, sink: K, interval: Duration) -> Self
    where
        S: AircraftSource + 'static,
        K: SnapshotSink,
    {
        let (interval_tx, interval_rx) = watch::channel(interval);
        let cancel_token = CancellationToken::new();
        let task_cancel = cancel_token.clone();

        let task = tokio::spawn(async move {
            poll_loop(source, sink, interval_rx, task_cancel).await;
        });

        Self {
            interval_tx,
            cancel_token,
            task,
        }
    }

    /// Change the polling interval.
    ///
    /// A pending wait is abandoned and a fetch happens right away, after which
    /// the new cadence applies. A change made while a fetch is in flight takes
    /// effect for the following wait.
    pub fn set_interval(&self, interval: Duration) {
        self.interval_tx.send_if_modified(|current| {
            if *current == interval {
                false
            } else {
                *current = interval;
                true
            }
        });
    }

    /// Get the current polling interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        *self.interval_tx.borrow()
    }

    /// Whether the poll task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop polling. Safe to call more than once.
    ///
    /// The pending wait and any in-flight fetch are abandoned, so the sink is
    /// not called again after this returns control to the runtime.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn poll_loop<S, K>(
    source: Arc<S>,
    mut sink: K,
    mut interval_rx: watch::Receiver<Duration>,
    cancel_token: CancellationToken,
) where
    S: AircraftSource,
    K: SnapshotSink,
{
    info!("Polling every {:?}", *interval_rx.borrow());

    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel_token.cancelled() => {
                info!("Poller cancelled during fetch");
                return;
            }
            result = source.fetch_aircraft() => match result {
                Ok(snapshot) => PollOutcome::Snapshot(snapshot),
                Err(e) => {
                    warn!("Aircraft fetch failed: {}", e);
                    PollOutcome::Failed(e.to_string())
                }
            },
        };

        sink.on_poll(outcome, Now::utc());

        let interval = *interval_rx.borrow_and_update();

        tokio::select! {
            biased;
            () = cancel_token.cancelled() => {
                info!("Poller cancelled");
                return;
            }
            changed = interval_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                info!("Poll interval changed to {:?}, polling now", *interval_rx.borrow());
            }
            () = sleep(interval) => {}
        }
    }
}
