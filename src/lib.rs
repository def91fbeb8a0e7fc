//! # Beach Tides Core Library
//!
//! This library turns sparse high/low water predictions into something a person
//! deciding whether to swim can read: a continuous tide curve for the day, the
//! current rising/falling state, countdowns to the next extrema and a chart with
//! a hover readout.
//!
//! ## Design Philosophy
//!
//! ### Pure Derivations
//! - **No ambient state**: every derivation takes its inputs (events, day, "now")
//!   explicitly and returns plain data, so the same inputs always give the same
//!   curve
//! - **No display side effects**: [`curve`], [`status`] and [`chart`] never print;
//!   the [`renderer`] module is the only place that produces text or pixels
//! - **Explicit "no data"**: missing tide data is a state held by the
//!   [`session::Session`], never a panic or a NaN inside a curve
//!
//! ### Temporal Model
//! All instants are `DateTime<Utc>`. A calendar day is a UTC day running from
//! `00:00:00` to `23:59:59` inclusive, which matches how the tide API reports
//! its events.
//!
//! ### Data Flow
//! 1. **Fetch**: tide API JSON → [`tide_data::parse_station_series`] (malformed
//!    events dropped) → cached [`TideStationSeries`]
//! 2. **Curve**: station events + day → [`curve::build_daily_curve`] (rule of twelfths)
//! 3. **Status**: station events + now → [`status::derive_status`]
//! 4. **Present**: curve + status → [`chart::TideChart`] → [`renderer`]
//!
//! ## Core Types
//! - [`TideEvent`]: one predicted high or low water
//! - [`InterpolatedPoint`]: one point on a reconstructed curve
//! - [`TideStationSeries`]: every station's events, ordered by time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// Module declarations
pub mod chart;
pub mod conditions;
pub mod config;
pub mod curve;
pub mod geo;
pub mod renderer;
pub mod retry;
pub mod session;
pub mod status;
pub mod tide_data;


pub use curve::build_daily_curve;
pub use status::{derive_status, nearest_point, Countdown, TideStatus};

/// The two tidal extrema reported by the tide API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    HighWater,
    LowWater,
}

impl EventType {
    /// Human-readable label, e.g. "High Water".
    pub fn label(&self) -> &'static str {
        match self {
            EventType::HighWater => "High Water",
            EventType::LowWater => "Low Water",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HighWater" => Ok(EventType::HighWater),
            "LowWater" => Ok(EventType::LowWater),
            other => Err(format!("unknown tide event type: {other}")),
        }
    }
}

/// A single predicted high or low water.
///
/// Events are immutable once fetched. A station's events are not guaranteed to
/// be evenly spaced and may have gaps.
///
/// # Example
/// ```
/// use beach_tides_lib::{EventType, TideEvent};
/// use chrono::{TimeZone, Utc};
///
/// let low = TideEvent {
///     timestamp: Utc.with_ymd_and_hms(2025, 6, 14, 8, 0, 0).unwrap(),
///     height: 0.5,
///     event_type: EventType::LowWater,
/// };
/// assert_eq!(low.event_type.label(), "Low Water");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideEvent {
    pub timestamp: DateTime<Utc>,
    /// Height in meters above chart datum
    pub height: f64,
    pub event_type: EventType,
}

/// A point on a reconstructed tide curve.
///
/// Derived on demand from [`TideEvent`]s and never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedPoint {
    pub timestamp: DateTime<Utc>,
    /// Height in meters above chart datum
    pub height: f64,
}

impl From<&TideEvent> for InterpolatedPoint {
    fn from(event: &TideEvent) -> Self {
        InterpolatedPoint {
            timestamp: event.timestamp,
            height: event.height,
        }
    }
}

/// Station identifier → time-ordered tide events.
///
/// Replaced wholesale on every successful fetch and read-only afterwards.
pub type TideStationSeries = BTreeMap<String, Vec<TideEvent>>;
