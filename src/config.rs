//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the beach-config.toml
//! file. It provides a centralized way to configure the tide API, retry and cache
//! behaviour, the chart window, the swim-condition thresholds and the beach and
//! tide station tables.
//!
//! The beach and station tables are declarative data: they are loaded once at
//! startup and never mutated.

use crate::conditions::SwimThresholds;
use crate::retry::RetryConfig;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "beach-config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialization: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration loaded from beach-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Tide API, retry and cache settings
    pub tide: TideApiConfig,
    /// Chart window and rendering size
    pub chart: ChartConfig,
    /// Swim-condition thresholds
    #[serde(default)]
    pub swim: SwimThresholds,
    /// Tide stations beaches are mapped to
    #[serde(default)]
    pub stations: Vec<StationConfig>,
    /// Selectable beaches
    #[serde(default)]
    pub beaches: Vec<BeachConfig>,
}

/// Remote tide data source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TideApiConfig {
    /// Endpoint returning station id → high/low water events
    pub url: String,
    /// Where the last successful response is cached
    pub cache_path: PathBuf,
    /// Cache TTL in minutes
    pub cache_ttl_minutes: u64,
    /// Retries after the first failed request
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry
    pub retry_delay_ms: u64,
}

impl TideApiConfig {
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.retry_delay_ms),
            ..RetryConfig::default()
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes * 60)
    }
}

/// Chart configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChartConfig {
    /// First time of day shown on the chart
    pub window_start: NaiveTime,
    /// Last time of day shown on the chart
    pub window_end: NaiveTime,
    /// Top of the height axis in meters (the bottom is 0)
    pub max_height_m: f64,
    /// Bitmap chart width in pixels
    pub width: u32,
    /// Bitmap chart height in pixels
    pub height: u32,
    /// Terminal chart height in rows
    pub ascii_rows: usize,
    /// Terminal chart width in columns
    pub ascii_columns: usize,
    /// Number of selectable days starting today
    pub date_options: u32,
}

/// A tide gauge location
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StationConfig {
    /// Station id as used by the tide API
    pub id: String,
    /// Human-readable station name
    pub name: String,
    /// `[latitude, longitude]` in degrees
    pub coords: [f64; 2],
}

/// A selectable beach
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BeachConfig {
    pub name: String,
    /// `[latitude, longitude]` in degrees
    pub coords: [f64; 2],
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn station(id: &str, name: &str, lat: f64, lon: f64) -> StationConfig {
    StationConfig {
        id: id.to_string(),
        name: name.to_string(),
        coords: [lat, lon],
    }
}

fn beach(name: &str, lat: f64, lon: f64, tags: &[&str], description: &str) -> BeachConfig {
    BeachConfig {
        name: name.to_string(),
        coords: [lat, lon],
        tags: tags.iter().map(|t| t.to_string()).collect(),
        description: Some(description.to_string()),
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tide: TideApiConfig {
                url: "https://gemcxasoc2.execute-api.eu-north-1.amazonaws.com/dev/getTideData"
                    .to_string(),
                cache_path: PathBuf::from("/tmp/beach_tides_cache.json"),
                cache_ttl_minutes: 30,
                max_retries: 3,
                retry_delay_ms: 1000,
            },
            chart: ChartConfig {
                window_start: NaiveTime::from_hms_opt(3, 0, 0).unwrap_or(NaiveTime::MIN),
                window_end: NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN),
                max_height_m: 4.5,
                width: 400,
                height: 300,
                ascii_rows: 16,
                ascii_columns: 84,
                date_options: 6,
            },
            swim: SwimThresholds::default(),
            stations: vec![
                station("0060", "Cowes", 50.7650, -1.3000),
                station("0064", "Ryde", 50.7340, -1.1600),
                station("0053", "Sandown", 50.6530, -1.1480),
                station("0055", "Ventnor", 50.5930, -1.2060),
                station("0039", "Totland Bay", 50.6830, -1.5500),
            ],
            beaches: vec![
                beach("Sandown", 50.6554, -1.1515, &["sandy", "lifeguards", "pier"],
                    "A long sandy beach with a pier, gentle shelving and lifeguards in summer."),
                beach("Shanklin", 50.6295, -1.1744, &["sandy", "lifeguards", "cafes"],
                    "Sheltered sandy beach below the cliffs with an esplanade of cafes."),
                beach("Ventnor", 50.5945, -1.2050, &["sand and shingle", "cafes"],
                    "Small sand and shingle bay with a warm south-facing microclimate."),
                beach("Compton Bay", 50.6640, -1.4960, &["sandy", "surf", "fossils"],
                    "Exposed sandy bay popular with surfers; check the waves before swimming."),
                beach("East Cowes", 50.7596, -1.2817, &["shingle", "ferries"],
                    "Shingle foreshore by the Medina with ferry traffic nearby."),
                beach("Osborne Bay", 50.7560, -1.2560, &["shingle", "sheltered"],
                    "Quiet sheltered bay on the Solent, best reached at lower tides."),
                beach("Ryde Beach", 50.7330, -1.1580, &["sandy", "shallow"],
                    "Wide sandy beach that dries out a long way at low water."),
                beach("Appley Beach", 50.7310, -1.1430, &["sandy", "cafes"],
                    "Sandy beach backed by woodland with a tower and a cafe."),
                beach("Seagrove Bay", 50.7050, -1.0900, &["sandy", "sheltered"],
                    "Small sheltered sandy bay, calm on most summer days."),
                beach("Colwell", 50.6920, -1.5400, &["sandy", "sheltered", "cafes"],
                    "Family-friendly sandy bay facing the Solent with beach huts."),
                beach("Totland", 50.6800, -1.5450, &["shingle", "pier"],
                    "Shingle beach with a small pier and views to the Needles."),
                beach("Gurnard", 50.7560, -1.3200, &["shingle", "sunsets"],
                    "Shingle beach with a sailing club and long summer sunsets."),
            ],
        }
    }
}

impl Config {
    /// Load configuration from beach-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_path(&path) {
            Ok(config) => {
                tracing::info!(
                    beaches = config.beaches.len(),
                    stations = config.stations.len(),
                    "loaded configuration from {}",
                    path.as_ref().display()
                );
                config
            }
            Err(ConfigError::Io(_)) => {
                tracing::info!("no config file found, using default configuration");
                Self::default()
            }
            Err(e) => {
                tracing::warn!("{e}; using default configuration");
                Self::default()
            }
        }
    }

    /// Load configuration from specified path, reporting any failure
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str::<Config>(&contents)?)
    }

    /// Save current configuration as pretty TOML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        tracing::info!("configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Look up a beach by name, ignoring case.
    pub fn beach(&self, name: &str) -> Option<&BeachConfig> {
        self.beaches
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name.trim()))
    }
}
