//! # Rule-of-Twelfths Tide Curve
//!
//! The tide API only reports extrema: the time and height of each high and low
//! water. This module rebuilds a continuous curve for one calendar day from
//! those sparse events.
//!
//! ## Interpolation Model
//!
//! Between two consecutive extrema the interval is split into six equal steps.
//! The height change over the whole interval is distributed over those steps
//! with weights `1:2:3:3:2:1` (out of twelve), so the water moves slowly near
//! high and low water and fastest mid-cycle:
//!
//! ```text
//! step      1    2    3    4    5    6
//! share   1/12 2/12 3/12 3/12 2/12 1/12
//! ```
//!
//! Events from the day before and the day after are used as anchors so the
//! curve reaches midnight on both ends with real data whenever it exists.
//!
//! ## Boundaries
//! - **Midnight**: when the first anchor is after `00:00:00`, a point at
//!   midnight is interpolated linearly from the nearest earlier event
//! - **End of day**: when the last anchor is before `23:59:59`, a point at
//!   `23:59:59` is added at `last height + 0.5 m`. This is a fixed
//!   extrapolation used only to close the chart, not a prediction

use crate::{InterpolatedPoint, TideEvent};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Share of the total height change (in twelfths) for each of the six steps.
const TWELFTHS: [f64; 6] = [1.0, 2.0, 3.0, 3.0, 2.0, 1.0];

/// Number of equal time steps between two extrema.
const STEPS: i32 = 6;

/// Height added to the last known event when no later data closes the day.
pub const END_OF_DAY_EXTRAPOLATION_M: f64 = 0.5;

/// First and last instants of a UTC calendar day (`00:00:00`, `23:59:59`).
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
    (start, start + Duration::seconds(86_399))
}

/// Build the interpolated tide curve for `day` from one station's events.
///
/// Returns points ordered by time, all within `[00:00:00, 23:59:59]` of `day`.
/// An empty vector means the station has no event on that day.
///
/// # Example
/// ```
/// use beach_tides_lib::{build_daily_curve, EventType, TideEvent};
/// use chrono::{NaiveDate, TimeZone, Utc};
///
/// let events = vec![
///     TideEvent {
///         timestamp: Utc.with_ymd_and_hms(2025, 6, 14, 8, 0, 0).unwrap(),
///         height: 0.5,
///         event_type: EventType::LowWater,
///     },
///     TideEvent {
///         timestamp: Utc.with_ymd_and_hms(2025, 6, 14, 14, 0, 0).unwrap(),
///         height: 3.5,
///         event_type: EventType::HighWater,
///     },
/// ];
///
/// let day = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
/// let curve = build_daily_curve(&events, day);
/// // start, six sub-points, the final event and the end-of-day point
/// assert_eq!(curve.len(), 9);
/// ```
pub fn build_daily_curve(events: &[TideEvent], day: NaiveDate) -> Vec<InterpolatedPoint> {
    if !events.iter().any(|e| e.timestamp.date_naive() == day) {
        return Vec::new();
    }

    let (start_of_day, end_of_day) = day_bounds(day);

    // Anchors: the day itself plus its neighbours
    let mut anchors: Vec<TideEvent> = events
        .iter()
        .filter(|e| (e.timestamp.date_naive() - day).num_days().abs() <= 1)
        .copied()
        .collect();
    anchors.sort_by_key(|e| e.timestamp);

    let mut points = Vec::with_capacity(anchors.len() * (STEPS as usize + 1) + 2);

    if let Some(first) = anchors.first() {
        if first.timestamp > start_of_day && anchors.len() >= 2 {
            let preceding = events
                .iter()
                .filter(|e| e.timestamp < first.timestamp)
                .max_by_key(|e| e.timestamp);

            if let Some(prev) = preceding {
                points.push(interpolate_at(&prev.into(), &first.into(), start_of_day));
            }
        }
    }

    for pair in anchors.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        points.push(from.into());

        let step = (to.timestamp - from.timestamp) / STEPS;
        let total_change = to.height - from.height;

        let mut timestamp = from.timestamp;
        let mut height = from.height;
        for twelfths in TWELFTHS {
            timestamp += step;
            height += twelfths / 12.0 * total_change;
            points.push(InterpolatedPoint { timestamp, height });
        }
    }

    if let Some(last) = anchors.last() {
        points.push(last.into());

        // A lone event has nothing to extrapolate from
        if anchors.len() >= 2 && last.timestamp < end_of_day {
            points.push(InterpolatedPoint {
                timestamp: end_of_day,
                height: last.height + END_OF_DAY_EXTRAPOLATION_M,
            });
        }
    }

    points.retain(|p| p.timestamp >= start_of_day && p.timestamp <= end_of_day);
    points
}

/// Slice of a day's curve shown between `from` and `to` (inclusive).
///
/// When the curve has points on both sides of `from`, a point at exactly
/// `from` is interpolated so the visible line starts at the window edge.
pub fn visible_window(
    curve: &[InterpolatedPoint],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<InterpolatedPoint> {
    let mut visible: Vec<InterpolatedPoint> = curve
        .iter()
        .filter(|p| p.timestamp >= from && p.timestamp <= to)
        .copied()
        .collect();

    let before = curve.iter().rev().find(|p| p.timestamp < from);
    let after = curve.iter().find(|p| p.timestamp > from);

    if let (Some(before), Some(after)) = (before, after) {
        visible.insert(0, interpolate_at(before, after, from));
    }

    visible
}

/// Linear interpolation of height at `at` between two points.
pub(crate) fn interpolate_at(
    a: &InterpolatedPoint,
    b: &InterpolatedPoint,
    at: DateTime<Utc>,
) -> InterpolatedPoint {
    let span = (b.timestamp - a.timestamp).num_milliseconds();
    if span == 0 {
        return InterpolatedPoint {
            timestamp: at,
            height: a.height,
        };
    }

    let ratio = (at - a.timestamp).num_milliseconds() as f64 / span as f64;
    InterpolatedPoint {
        timestamp: at,
        height: a.height + ratio * (b.height - a.height),
    }
}
