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

//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format via
//! `confy`, and range validation of the polling and staleness settings before
//! they reach the live view. The live view itself never clamps its inputs.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use live_tracks::{LiveConfig, TrackConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_NAME: &str = "airjedi-live";
const CONFIG_NAME: &str = "config";

/// Default backend base URL
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Allowed poll interval in seconds
pub const POLL_INTERVAL_RANGE: RangeInclusive<u64> = 1..=60;

/// Allowed staleness threshold in minutes
pub const MAX_AGE_RANGE: RangeInclusive<u32> = 1..=60;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write configuration: {0}")]
    Storage(#[from] confy::ConfyError),

    #[error("poll interval {0}s is outside the allowed range of 1-60s")]
    PollInterval(u64),

    #[error("max age {0} min is outside the allowed range of 1-60 min")]
    MaxAge(u32),

    #[error("server URL must start with http:// or https://: {0}")]
    ServerUrl(String),

    #[error("request timeout must be at least one second")]
    RequestTimeout,
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Base URL of the aircraft backend
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Seconds between polls (1 - 60)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Minutes after which an aircraft is no longer shown as live (1 - 60)
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: u32,

    /// Include track history in reports
    #[serde(default = "default_true")]
    pub show_tracks: bool,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_age_minutes() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            server_url: default_server_url(),
            poll_interval_secs: default_poll_interval_secs(),
            max_age_minutes: default_max_age_minutes(),
            show_tracks: true,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, or from `path` if given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => confy::load_path(path)?,
            None => confy::load(APP_NAME, CONFIG_NAME)?,
        };
        Ok(config)
    }

    /// Save configuration to the default location, or to `path` if given
    pub fn save(&self, path: Option<&Path>) -> Result<(), ConfigError> {
        match path {
            Some(path) => confy::store_path(path, self)?,
            None => confy::store(APP_NAME, CONFIG_NAME, self)?,
        }
        Ok(())
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        Ok(confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)?)
    }

    /// Check every setting against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !POLL_INTERVAL_RANGE.contains(&self.poll_interval_secs) {
            return Err(ConfigError::PollInterval(self.poll_interval_secs));
        }
        if !MAX_AGE_RANGE.contains(&self.max_age_minutes) {
            return Err(ConfigError::MaxAge(self.max_age_minutes));
        }
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::ServerUrl(self.server_url.clone()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::RequestTimeout);
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the live view configuration
    pub fn live_config(&self) -> LiveConfig {
        LiveConfig {
            poll_interval: self.poll_interval(),
            max_age_minutes: f64::from(self.max_age_minutes),
            tracks: TrackConfig::default(),
            ..LiveConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert!((config.live_config().max_age_minutes - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let config = AppConfig {
            poll_interval_secs: 0,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::PollInterval(0))));

        let config = AppConfig {
            max_age_minutes: 61,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MaxAge(61))));

        let config = AppConfig {
            server_url: "localhost:8080".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ServerUrl(_))));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"server_url": "https://adsb.example"}"#).unwrap();
        assert_eq!(config.server_url, "https://adsb.example");
        assert_eq!(config.poll_interval_secs, 5);
        assert!(config.show_tracks);
    }

    #[test]
    fn test_error_message_names_range() {
        assert_eq!(
            ConfigError::PollInterval(90).to_string(),
            "poll interval 90s is outside the allowed range of 1-60s"
        );
    }
}
