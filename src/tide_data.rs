//! # Tide Data Fetching and Caching
//!
//! This module handles all network operations for fetching high/low water
//! predictions from the tide API, plus a small file cache so repeated runs do
//! not hit the network.
//!
//! ## Data Source
//!
//! The API returns one JSON object mapping station ids to event lists:
//!
//! ```json
//! {
//!   "0053": [
//!     { "DateTime": "2025-06-14T08:00:00Z", "Height": 0.5, "EventType": "LowWater" },
//!     { "DateTime": "2025-06-14T14:00:00Z", "Height": 3.5, "EventType": "HighWater" }
//!   ]
//! }
//! ```
//!
//! ### Data Processing Pipeline
//! 1. **Cache**: use the cached series when it is younger than the TTL
//! 2. **Fetch**: HTTP GET, retried with exponential backoff on any failure or
//!    non-2xx status
//! 3. **Parse**: decode each event on its own; malformed events are dropped
//! 4. **Sort**: each station's events are ordered by time
//! 5. **Save**: write the parsed series back to the cache
//!
//! ## Error Handling
//!
//! - **Network errors and HTTP status errors**: retried, then returned as
//!   [`TideError`] so the caller can show an "unavailable" state
//! - **Malformed events**: a bad timestamp, a non-numeric or non-finite height,
//!   or an unknown event type drops that one event with a warning; the rest of
//!   the station still gets a curve
//! - **Cache problems**: a stale, missing or corrupt cache falls through to the
//!   network; failing to write the cache is not an error

use crate::config::TideApiConfig;
use crate::retry::{with_retry, RetryConfig};
use crate::{EventType, TideEvent, TideStationSeries};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use std::{fs, io};
use thiserror::Error;

/// Errors that can occur during tide data fetching and processing.
#[derive(Error, Debug)]
pub enum TideError {
    /// HTTP request failed (network, TLS or body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {0}")]
    Status(u16),

    /// Response is not a station → events mapping
    #[error("invalid tide data: {0}")]
    Parse(#[from] serde_json::Error),

    /// Cache file operations failed
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),
}

/// One event exactly as the API sends it.
#[derive(Debug, Deserialize)]
struct WireTideEvent {
    #[serde(rename = "DateTime")]
    date_time: String,
    #[serde(rename = "Height")]
    height: Value,
    #[serde(rename = "EventType")]
    event_type: String,
}

impl WireTideEvent {
    fn into_event(self) -> Result<TideEvent, String> {
        let timestamp = parse_timestamp(&self.date_time)
            .ok_or_else(|| format!("bad DateTime {:?}", self.date_time))?;

        let height = match &self.height {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|h| h.is_finite())
        .ok_or_else(|| format!("bad Height {}", self.height))?;

        let event_type = self.event_type.parse::<EventType>()?;

        Ok(TideEvent {
            timestamp,
            height,
            event_type,
        })
    }
}

/// Parse an ISO-8601 instant. Timestamps without an offset are read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Decode the API response into per-station, time-ordered events.
///
/// Fails only when the document is not a mapping of station ids to arrays.
/// Individual malformed events are skipped.
pub fn parse_station_series(json: Value) -> Result<TideStationSeries, TideError> {
    let raw: BTreeMap<String, Vec<Value>> = serde_json::from_value(json)?;

    let mut series = TideStationSeries::new();
    for (station, raw_events) in raw {
        let mut events = Vec::with_capacity(raw_events.len());
        for raw_event in raw_events {
            let parsed = serde_json::from_value::<WireTideEvent>(raw_event)
                .map_err(|e| e.to_string())
                .and_then(WireTideEvent::into_event);

            match parsed {
                Ok(event) => events.push(event),
                Err(reason) => {
                    tracing::warn!(station = %station, "dropping tide event: {}", reason)
                }
            }
        }
        events.sort_by_key(|e| e.timestamp);
        series.insert(station, events);
    }

    Ok(series)
}

/// Client for the tide API with retry and a cache-first strategy.
pub struct TideClient {
    client: reqwest::Client,
    url: String,
    retry: RetryConfig,
    cache_path: PathBuf,
    cache_ttl: Duration,
}

impl TideClient {
    pub fn new(config: &TideApiConfig) -> Result<Self, TideError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(TideClient {
            client,
            url: config.url.clone(),
            retry: config.retry(),
            cache_path: config.cache_path.clone(),
            cache_ttl: config.cache_ttl(),
        })
    }

    /// Fetch every station's events from the cache or the network.
    ///
    /// # Returns
    /// - `Ok(TideStationSeries)`: cached or freshly fetched events
    /// - `Err(TideError)`: the network failed after all retries
    pub async fn fetch(&self) -> Result<TideStationSeries, TideError> {
        match load_cache(&self.cache_path, self.cache_ttl) {
            Ok(series) => {
                tracing::debug!("using cached tide data from {}", self.cache_path.display());
                return Ok(series);
            }
            Err(e) => tracing::debug!("tide cache unusable: {}", e),
        }

        let body = with_retry(&self.retry, || self.request()).await?;
        let series = parse_station_series(body)?;
        tracing::info!(stations = series.len(), "fetched tide data");

        if let Err(e) = save_cache(&self.cache_path, &series) {
            tracing::debug!("could not write tide cache: {}", e);
        }

        Ok(series)
    }

    async fn request(&self) -> Result<Value, TideError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TideError::Status(status.as_u16()));
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Load a cached series if the file is younger than `ttl`.
pub fn load_cache(path: &Path, ttl: Duration) -> Result<TideStationSeries, io::Error> {
    let meta = fs::metadata(path)?;

    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .map_err(|_| io::Error::other("time error"))?;

    if age > ttl {
        return Err(io::Error::other("stale"));
    }

    let data = fs::read(path)?;
    let series = serde_json::from_slice(&data)?;
    Ok(series)
}

/// Save a series to the cache file.
pub fn save_cache(path: &Path, series: &TideStationSeries) -> Result<(), io::Error> {
    let data = serde_json::to_vec(series)?;
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn sample_response() -> Value {
        json!({
            "0053": [
                { "DateTime": "2025-06-14T14:00:00Z", "Height": 3.5, "EventType": "HighWater" },
                { "DateTime": "2025-06-14T08:00:00Z", "Height": 0.5, "EventType": "LowWater" },
                { "DateTime": "2025-06-14T20:15:00", "Height": "0.8", "EventType": "LowWater" }
            ],
            "0060": []
        })
    }

    #[test]
    fn test_parse_sorts_events() {
        let series = parse_station_series(sample_response()).unwrap();
        let sandown = &series["0053"];

        assert_eq!(sandown.len(), 3);
        assert_eq!(sandown[0].event_type, EventType::LowWater);
        assert_eq!(sandown[1].event_type, EventType::HighWater);
        assert_eq!(sandown[2].height, 0.8);
        assert!(series["0060"].is_empty());
    }

    #[test]
    fn test_parse_drops_malformed_events() {
        let response = json!({
            "0053": [
                { "DateTime": "not a date", "Height": 1.0, "EventType": "LowWater" },
                { "DateTime": "2025-06-14T08:00:00Z", "Height": "abc", "EventType": "LowWater" },
                { "DateTime": "2025-06-14T09:00:00Z", "Height": null, "EventType": "LowWater" },
                { "DateTime": "2025-06-14T10:00:00Z", "Height": 2.0, "EventType": "Slack" },
                { "DateTime": "2025-06-14T11:00:00Z", "EventType": "HighWater" },
                42,
                { "DateTime": "2025-06-14T14:00:00Z", "Height": 3.5, "EventType": "HighWater" }
            ]
        });

        let series = parse_station_series(response).unwrap();
        let events = &series["0053"];
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].height, 3.5);
    }

    #[test]
    fn test_parse_rejects_non_mapping() {
        assert!(matches!(
            parse_station_series(json!([1, 2, 3])),
            Err(TideError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 14, 8, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-06-14T08:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-14T09:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-14T08:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-14T08:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-14T08:00"), Some(expected));
        assert_eq!(parse_timestamp("14/06/2025 08:00"), None);
    }

    #[test]
    fn test_cache_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let series = parse_station_series(sample_response()).unwrap();

        save_cache(temp_file.path(), &series).unwrap();
        let loaded = load_cache(temp_file.path(), Duration::from_secs(60)).unwrap();

        assert_eq!(loaded, series);
    }

    #[test]
    fn test_stale_cache_is_rejected() {
        let temp_file = NamedTempFile::new().unwrap();
        let series = parse_station_series(sample_response()).unwrap();
        save_cache(temp_file.path(), &series).unwrap();

        std::thread::sleep(Duration::from_millis(20));
        assert!(load_cache(temp_file.path(), Duration::ZERO).is_err());
    }

    #[test]
    fn test_corrupt_cache_is_rejected() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), b"{ not json").unwrap();
        assert!(load_cache(temp_file.path(), Duration::from_secs(60)).is_err());
    }

    fn api_config(cache_path: PathBuf) -> TideApiConfig {
        TideApiConfig {
            // Discard port on loopback: connections are refused immediately
            url: "http://127.0.0.1:9/tides".to_string(),
            cache_path,
            cache_ttl_minutes: 30,
            max_retries: 1,
            retry_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_fetch_prefers_fresh_cache() {
        let temp_file = NamedTempFile::new().unwrap();
        let series = parse_station_series(sample_response()).unwrap();
        save_cache(temp_file.path(), &series).unwrap();

        let client = TideClient::new(&api_config(temp_file.path().to_path_buf())).unwrap();
        assert_eq!(client.fetch().await.unwrap(), series);
    }

    #[tokio::test]
    async fn test_fetch_fails_without_cache_or_network() {
        let dir = tempfile::tempdir().unwrap();
        let client = TideClient::new(&api_config(dir.path().join("missing.json"))).unwrap();

        assert!(matches!(client.fetch().await, Err(TideError::Http(_))));
    }
}
