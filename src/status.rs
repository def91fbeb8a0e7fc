//! # Tide State Derivation
//!
//! Derives what a person on the beach wants to know right now: is the tide
//! rising or falling, when is the next low and high water, and how high is the
//! water at this moment.
//!
//! Everything here is a pure function of its arguments. "Now" is always passed
//! in explicitly so results are reproducible and never cached across instants.

use crate::{EventType, InterpolatedPoint, TideEvent};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Rising/falling state and upcoming extrema relative to an instant.
///
/// The default value is the "no data" status: not rising, no events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct TideStatus {
    /// True when the most recent past event was a low water
    pub is_rising: bool,
    pub next_low: Option<TideEvent>,
    pub next_high: Option<TideEvent>,
    pub last_event: Option<TideEvent>,
}

impl TideStatus {
    /// Next low and high water in time order (at most two).
    ///
    /// The first entry is the one a display should highlight.
    pub fn upcoming(&self) -> Vec<TideEvent> {
        let mut events: Vec<TideEvent> = [self.next_low, self.next_high]
            .into_iter()
            .flatten()
            .collect();
        events.sort_by_key(|e| e.timestamp);
        events.truncate(2);
        events
    }

    /// True when no event at all was available for the derivation.
    pub fn is_empty(&self) -> bool {
        self.last_event.is_none() && self.next_low.is_none() && self.next_high.is_none()
    }
}

/// Derive the tide status for `now` from a station's events.
///
/// Events at exactly `now` count as past. An empty slice yields
/// [`TideStatus::default`].
pub fn derive_status(events: &[TideEvent], now: DateTime<Utc>) -> TideStatus {
    let mut upcoming: Vec<&TideEvent> = events.iter().filter(|e| e.timestamp > now).collect();
    upcoming.sort_by_key(|e| e.timestamp);

    let last_event = events
        .iter()
        .filter(|e| e.timestamp <= now)
        .max_by_key(|e| e.timestamp)
        .copied();

    let next_of = |kind: EventType| {
        upcoming
            .iter()
            .find(|e| e.event_type == kind)
            .map(|e| **e)
    };

    TideStatus {
        is_rising: matches!(
            last_event,
            Some(TideEvent {
                event_type: EventType::LowWater,
                ..
            })
        ),
        next_low: next_of(EventType::LowWater),
        next_high: next_of(EventType::HighWater),
        last_event,
    }
}

/// Time remaining until an event, in whole hours and minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub hours: i64,
    pub minutes: i64,
}

impl Countdown {
    /// Countdown from `now` to `target`, floored and clamped at zero.
    pub fn until(now: DateTime<Utc>, target: DateTime<Utc>) -> Self {
        let total_minutes = (target - now).num_minutes().max(0);
        Countdown {
            hours: total_minutes / 60,
            minutes: total_minutes % 60,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

/// Point of `series` closest in time to `target`.
///
/// Linear scan; on a tie the earlier point in sequence order wins. Used for the
/// current-height readout and for chart hover alike.
pub fn nearest_point(
    series: &[InterpolatedPoint],
    target: DateTime<Utc>,
) -> Option<&InterpolatedPoint> {
    let distance = |p: &InterpolatedPoint| (p.timestamp - target).num_milliseconds().abs();

    let mut best: Option<&InterpolatedPoint> = None;
    for point in series {
        match best {
            Some(current) if distance(point) >= distance(current) => {}
            _ => best = Some(point),
        }
    }
    best
}
