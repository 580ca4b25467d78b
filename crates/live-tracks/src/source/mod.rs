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

//! Fetch layer for aircraft snapshots.
//!
//! The [`AircraftSource`] trait is the boundary between the poller and
//! whatever backend supplies aircraft lists. [`HttpSource`] talks to the
//! dashboard backend over HTTP/JSON.

mod http;

pub use http::HttpSource;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::Snapshot;

/// Errors that can occur while fetching from a source.
///
/// The `Display` text is surfaced verbatim to the user as the failure reason.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP error: {status}")]
    Status { status: u16 },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// One point of the detailed server-side track of a single aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSample {
    pub longitude: f64,
    pub latitude: f64,
    /// Unix timestamp as reported by the backend.
    pub timestamp: f64,
}

/// A backend that can report the current aircraft list.
pub trait AircraftSource: Send + Sync {
    /// Fetch the full list of currently visible aircraft.
    fn fetch_aircraft(&self) -> impl Future<Output = Result<Snapshot, FetchError>> + Send;

    /// Fetch the detailed history of one aircraft, for presentation only.
    fn fetch_track(
        &self,
        icao: &str,
    ) -> impl Future<Output = Result<Vec<TrackSample>, FetchError>> + Send;
}
