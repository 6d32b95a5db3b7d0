use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use recipe_sync_engine::FetchSettings;
use serde::{Deserialize, Serialize};

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_PATH: &str = "recipe_sync.ron";
const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/recipes/";

/// Settings read from the RON config file. Missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint_url: String,
    pub data_dir: PathBuf,
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub accept_invalid_certs: bool,
    pub max_bytes: u64,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            endpoint_url: DEFAULT_ENDPOINT.to_string(),
            data_dir: PathBuf::from("recipe_data"),
            interval_secs: recipe_sync_engine::DEFAULT_INTERVAL.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            accept_invalid_certs: fetch.accept_invalid_certs,
            max_bytes: fetch.max_bytes,
            log_destination: LogDestination::default(),
        }
    }
}

/// Where the effective configuration came from; logged once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Defaults(PathBuf),
}

impl AppConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    /// An unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<(Self, ConfigOrigin)> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok((Self::default(), ConfigOrigin::Defaults(path.to_path_buf())));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config {}", path.display()))
            }
        };
        let config: Self = ron::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok((config, ConfigOrigin::File(path.to_path_buf())))
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.endpoint_url.trim().is_empty(), "endpoint_url is empty");
        anyhow::ensure!(self.interval_secs > 0, "interval_secs must be positive");
        anyhow::ensure!(self.max_bytes > 0, "max_bytes must be positive");
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_bytes: self.max_bytes,
            accept_invalid_certs: self.accept_invalid_certs,
            ..FetchSettings::default()
        }
    }
}
