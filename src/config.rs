use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::geo::Observer;

const CONFIG_PATH_ENV: &str = "ADSB_VIEWER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Runtime configuration. Every field has a default so a missing or partial
/// config file still produces a working setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Observer latitude in decimal degrees.
    pub latitude: f64,
    /// Observer longitude in decimal degrees.
    pub longitude: f64,
    /// Query radius around the observer, in kilometres.
    pub radius_km: f64,
    /// Base URL of the airplanes.live point query endpoint.
    pub aircraft_url: String,
    /// URL returning the latest room temperature reading.
    pub temperature_url: String,
    /// Framebuffer device the finished frame is written to.
    pub fb_device: String,
    /// Seconds between display refreshes.
    pub refresh_secs: u64,
    /// Seconds between checks of whether a refresh is due.
    pub poll_secs: u64,
    /// Maximum number of aircraft lines on the display.
    pub max_aircraft: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            latitude: 46.0569,
            longitude: 14.5058,
            radius_km: 100.0,
            aircraft_url: String::from("https://api.airplanes.live/v2/point"),
            temperature_url: String::from("http://raspberrypi.local:8000/temperatures/latest"),
            fb_device: String::from("/dev/fb1"),
            refresh_secs: 30,
            poll_secs: 5,
            max_aircraft: 12,
        }
    }
}

impl Config {
    /// Loads configuration from the path in `ADSB_VIEWER_CONFIG`, falling
    /// back to `config.toml` in the working directory, falling back to the
    /// built-in defaults when neither exists.
    pub fn load() -> Result<Config, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Config::from_path(Path::new(&path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Config::from_path(default_path);
        }
        Ok(Config::default())
    }

    pub fn from_path(path: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn observer(&self) -> Observer {
        Observer {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("unable to parse config file {path}: {source}")]
    Parse {
        path: std::path::PathBuf,
        source: toml::de::Error,
    },
}
