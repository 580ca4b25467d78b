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

use std::time::Duration;

use log::debug;
use reqwest::Url;
use serde::de::DeserializeOwned;

use super::{AircraftSource, FetchError, TrackSample};
use crate::snapshot::Snapshot;

const AIRCRAFT_SEGMENTS: [&str; 2] = ["api", "aircraft"];

/// HTTP/JSON source backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSource {
    /// Create a source for the backend at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut base = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(format!("not a base URL: {base_url}")));
        }
        base.set_query(None);
        base.set_fragment(None);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client, base })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidUrl(format!("not a base URL: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn aircraft_url(&self) -> Result<Url, FetchError> {
        self.endpoint(&AIRCRAFT_SEGMENTS)
    }

    fn track_url(&self, icao: &str) -> Result<Url, FetchError> {
        let [api, aircraft] = AIRCRAFT_SEGMENTS;
        self.endpoint(&[api, aircraft, icao.trim(), "track"])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

impl AircraftSource for HttpSource {
    async fn fetch_aircraft(&self) -> Result<Snapshot, FetchError> {
        self.get_json(self.aircraft_url()?).await
    }

    async fn fetch_track(&self, icao: &str) -> Result<Vec<TrackSample>, FetchError> {
        self.get_json(self.track_url(icao)?).await
    }
}
