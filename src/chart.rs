//! # Tide Chart Model
//!
//! Everything a renderer needs to draw one day of tide, without drawing it:
//! the visible slice of the curve, the time and height scales, the night bands
//! and the hover lookup.
//!
//! Hover always searches the full-day curve rather than the visible slice, so
//! pointing near the window edges still finds a sensible point.

use crate::curve::{day_bounds, interpolate_at, visible_window};
use crate::status::nearest_point;
use crate::InterpolatedPoint;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Sunrise and sunset for the charted day.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Daylight {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// A day's tide curve prepared for display.
#[derive(Clone, Debug)]
pub struct TideChart {
    pub day: NaiveDate,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Top of the height axis; the bottom is 0 m
    pub max_height_m: f64,
    full: Vec<InterpolatedPoint>,
    visible: Vec<InterpolatedPoint>,
    daylight: Option<Daylight>,
}

impl TideChart {
    /// Prepare `curve` (the full-day output of the curve builder) for display
    /// between `window_start` and `window_end` on `day`.
    pub fn new(
        curve: Vec<InterpolatedPoint>,
        day: NaiveDate,
        window_start: NaiveTime,
        window_end: NaiveTime,
        max_height_m: f64,
    ) -> Self {
        let (day_start, day_end) = day_bounds(day);
        let window_start = Utc.from_utc_datetime(&day.and_time(window_start)).max(day_start);
        let window_end = Utc
            .from_utc_datetime(&day.and_time(window_end))
            .min(day_end)
            .max(window_start + Duration::seconds(1));

        let visible = visible_window(&curve, window_start, window_end);

        TideChart {
            day,
            window_start,
            window_end,
            max_height_m,
            full: curve,
            visible,
            daylight: None,
        }
    }

    pub fn with_daylight(mut self, daylight: Option<Daylight>) -> Self {
        self.daylight = daylight;
        self
    }

    pub fn daylight(&self) -> Option<Daylight> {
        self.daylight
    }

    /// Unclipped full-day curve
    pub fn full_curve(&self) -> &[InterpolatedPoint] {
        &self.full
    }

    /// Curve restricted to the display window
    pub fn visible(&self) -> &[InterpolatedPoint] {
        &self.visible
    }

    fn span_ms(&self) -> f64 {
        (self.window_end - self.window_start).num_milliseconds() as f64
    }

    /// Horizontal position of `t` on a chart `width` units wide.
    pub fn x_for_time(&self, t: DateTime<Utc>, width: u32) -> f64 {
        (t - self.window_start).num_milliseconds() as f64 / self.span_ms() * f64::from(width)
    }

    /// Inverse of [`TideChart::x_for_time`].
    pub fn time_for_x(&self, x: f64, width: u32) -> DateTime<Utc> {
        let fraction = x / f64::from(width.max(1));
        self.window_start + Duration::milliseconds((fraction * self.span_ms()).round() as i64)
    }

    /// Vertical position of `height_m` on a chart `height` units tall, 0 at the top.
    pub fn y_for_height(&self, height_m: f64, height: u32) -> f64 {
        let normalized = height_m / self.max_height_m;
        (1.0 - normalized) * f64::from(height)
    }

    /// Height of the visible curve at `t`, linearly interpolated.
    ///
    /// `None` outside the span the visible curve covers.
    pub fn height_at(&self, t: DateTime<Utc>) -> Option<f64> {
        let after = self.visible.iter().position(|p| p.timestamp >= t)?;
        let b = &self.visible[after];
        if b.timestamp == t || after == 0 {
            return (b.timestamp == t).then_some(b.height);
        }
        Some(interpolate_at(&self.visible[after - 1], b, t).height)
    }

    /// Nearest full-day point to horizontal position `x`.
    pub fn hover_at(&self, x: f64, width: u32) -> Option<InterpolatedPoint> {
        self.hover_at_time(self.time_for_x(x, width))
    }

    /// Nearest full-day point to `t`.
    pub fn hover_at_time(&self, t: DateTime<Utc>) -> Option<InterpolatedPoint> {
        nearest_point(&self.full, t).copied()
    }

    /// Dark periods inside the window: before sunrise and after sunset.
    pub fn night_bands(&self) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        let Some(daylight) = self.daylight else {
            return Vec::new();
        };

        let mut bands = Vec::with_capacity(2);
        if daylight.sunrise > self.window_start {
            bands.push((self.window_start, daylight.sunrise.min(self.window_end)));
        }
        if daylight.sunset < self.window_end {
            bands.push((daylight.sunset.max(self.window_start), self.window_end));
        }
        bands
    }

    /// True when `t` falls inside a night band.
    pub fn is_night(&self, t: DateTime<Utc>) -> bool {
        self.night_bands()
            .iter()
            .any(|(from, to)| t >= *from && t <= *to)
    }

    /// Whole hours in the window that are multiples of `every_hours`.
    pub fn hour_ticks(&self, every_hours: i64) -> Vec<DateTime<Utc>> {
        let (day_start, _) = day_bounds(self.day);
        (0..=24)
            .step_by(every_hours.max(1) as usize)
            .map(|h| day_start + Duration::hours(h))
            .filter(|t| *t >= self.window_start && *t <= self.window_end)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::build_daily_curve;
    use crate::{EventType, TideEvent};

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, hour, min, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn chart() -> TideChart {
        let events = vec![
            TideEvent {
                timestamp: at(1, 0),
                height: 0.6,
                event_type: EventType::LowWater,
            },
            TideEvent {
                timestamp: at(7, 0),
                height: 3.9,
                event_type: EventType::HighWater,
            },
            TideEvent {
                timestamp: at(13, 0),
                height: 0.7,
                event_type: EventType::LowWater,
            },
        ];
        TideChart::new(
            build_daily_curve(&events, day()),
            day(),
            hms(3, 0, 0),
            hms(23, 59, 59),
            4.5,
        )
    }

    #[test]
    fn test_visible_starts_at_window() {
        let chart = chart();
        assert_eq!(chart.visible()[0].timestamp, at(3, 0));
        assert!(chart.full_curve()[0].timestamp < at(3, 0));
        assert!(chart
            .visible()
            .iter()
            .all(|p| p.timestamp >= chart.window_start && p.timestamp <= chart.window_end));
    }

    #[test]
    fn test_scale_roundtrip() {
        let chart = chart();
        let x = chart.x_for_time(at(12, 0), 400);
        assert_eq!(chart.time_for_x(x, 400), at(12, 0));
        assert_eq!(chart.x_for_time(chart.window_start, 400), 0.0);
        assert!((chart.x_for_time(chart.window_end, 400) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_y_scale() {
        let chart = chart();
        assert_eq!(chart.y_for_height(0.0, 250), 250.0);
        assert_eq!(chart.y_for_height(4.5, 250), 0.0);
    }

    #[test]
    fn test_hover_uses_full_curve() {
        let chart = chart();
        // Left of the window: resolves to a point before 03:00 that is not visible
        let before_window = chart.hover_at_time(at(1, 10)).unwrap();
        assert_eq!(before_window.timestamp, at(1, 0));
        assert!((before_window.height - 0.6).abs() < 1e-9);

        let hovered = chart.hover_at(0.0, 400).unwrap();
        assert_eq!(hovered.timestamp, at(3, 0));
    }

    #[test]
    fn test_hover_matches_nearest_point() {
        let chart = chart();
        let t = at(9, 20);
        assert_eq!(
            chart.hover_at_time(t),
            nearest_point(chart.full_curve(), t).copied()
        );
    }

    #[test]
    fn test_height_at() {
        let chart = chart();
        // 07:00 is high water
        assert!((chart.height_at(at(7, 0)).unwrap() - 3.9).abs() < 1e-9);
        let between = chart.height_at(at(7, 30)).unwrap();
        assert!(between < 3.9 && between > 3.0);
        // Before the window nothing is visible
        assert_eq!(chart.height_at(at(2, 0)), None);
    }

    #[test]
    fn test_night_bands() {
        let chart = chart().with_daylight(Some(Daylight {
            sunrise: at(4, 50),
            sunset: at(21, 15),
        }));
        let bands = chart.night_bands();

        assert_eq!(bands, vec![(at(3, 0), at(4, 50)), (at(21, 15), chart.window_end)]);
        assert!(chart.is_night(at(4, 0)));
        assert!(!chart.is_night(at(12, 0)));
    }

    #[test]
    fn test_no_night_bands_without_daylight() {
        assert!(chart().night_bands().is_empty());
        assert!(!chart().is_night(at(3, 30)));
    }

    #[test]
    fn test_sunrise_before_window() {
        let chart = chart().with_daylight(Some(Daylight {
            sunrise: at(2, 0),
            sunset: at(23, 59),
        }));
        assert_eq!(chart.night_bands(), vec![(at(23, 59), chart.window_end)]);
    }

    #[test]
    fn test_hour_ticks() {
        let ticks = chart().hour_ticks(3);
        assert_eq!(ticks.first(), Some(&at(3, 0)));
        assert_eq!(ticks.last(), Some(&at(21, 0)));
        assert_eq!(ticks.len(), 7);
    }
}
