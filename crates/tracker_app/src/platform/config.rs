use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracker_engine::{ClientSettings, PollSettings};

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILENAME: &str = "export-tracker.ron";

/// A config together with the file it came from; `None` means defaults.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TrackerConfig,
    pub source: Option<PathBuf>,
}

/// Settings read from the RON config file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_consecutive_errors: u32,
    pub stale_after_secs: Option<u64>,
    pub hints: Vec<String>,
    pub log_destination: LogDestination,
    pub history_dir: PathBuf,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        let poll = PollSettings::default();
        Self {
            base_url: client.base_url,
            auth_token: None,
            poll_interval_ms: poll.interval.as_millis() as u64,
            request_timeout_secs: client.request_timeout.as_secs(),
            connect_timeout_secs: client.connect_timeout.as_secs(),
            max_consecutive_errors: poll.max_consecutive_errors,
            stale_after_secs: None,
            hints: Vec::new(),
            log_destination: LogDestination::default(),
            history_dir: PathBuf::from("."),
        }
    }
}

impl TrackerConfig {
    /// Loads `explicit` if given (it must exist), otherwise the default file
    /// in the working directory when present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
        let path = explicit.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME), Path::to_path_buf);
        match fs::read_to_string(&path) {
            Ok(text) => {
                let config = Self::parse(&text)
                    .with_context(|| format!("invalid config file {}", path.display()))?;
                Ok(LoadedConfig {
                    config,
                    source: Some(path),
                })
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound && explicit.is_none() => {
                Ok(LoadedConfig {
                    config: Self::default(),
                    source: None,
                })
            }
            Err(err) => Err(err).with_context(|| format!("cannot read config {}", path.display())),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            auth_token: self.auth_token.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms.max(100)),
            max_consecutive_errors: self.max_consecutive_errors.max(1),
            stale_after: self.stale_after_secs.map(Duration::from_secs),
        }
    }
}
