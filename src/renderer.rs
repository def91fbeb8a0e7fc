//! # Tide Report Rendering
//!
//! Turns a [`TideReport`] and its [`TideChart`] into something a person can look
//! at. Nothing in here derives tide data; it only lays out what the session and
//! chart model already computed.
//!
//! ## Outputs
//! - **Text status**: rising/falling, countdowns to the next extrema and the
//!   swim conditions sentence ([`render_report`])
//! - **ASCII chart**: a terminal rendition of the visible curve with night
//!   shading and an `X` at the hovered point ([`draw_ascii`])
//! - **Bitmap chart**: the same chart drawn with `embedded-graphics` onto any
//!   binary [`DrawTarget`] ([`draw_chart`]); [`Canvas`] is an in-memory target
//!   that can be saved as a PBM image

use crate::chart::TideChart;
use crate::session::{TideReport, UNAVAILABLE_MESSAGE};
use crate::status::Countdown;
use crate::InterpolatedPoint;
use chrono::{DateTime, Utc};
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle},
    text::Text,
};
use std::convert::Infallible;

/// Columns reserved for the height labels and the axis line.
const Y_AXIS_WIDTH: usize = 6;

/// Hours between time axis ticks.
const TICK_HOURS: i64 = 3;

// Bitmap layout in pixels
const LEFT_MARGIN: u32 = 32;
const TOP_MARGIN: u32 = 14;
const BOTTOM_MARGIN: u32 = 12;

/// Render the status block for `report` as plain text.
///
/// The first upcoming event is the highlighted one and is prefixed with `>`.
pub fn render_report(report: &TideReport, now: DateTime<Utc>) -> String {
    let mut lines = Vec::new();

    match (&report.beach, &report.station) {
        (Some(beach), Some(station)) => {
            lines.push(format!("{} (tides from {})", beach.name, station.name))
        }
        (Some(beach), None) => lines.push(beach.name.clone()),
        (None, _) => lines.push("No beach selected".to_string()),
    }
    lines.push(report.date.format("%A %d %B %Y").to_string());
    if let Some(beach) = &report.beach {
        if !beach.tags.is_empty() {
            lines.push(format!("Tags: {}", beach.tags.join(", ")));
        }
    }
    lines.push(String::new());

    match &report.tide {
        Err(message) => lines.push(message.clone()),
        Ok(snapshot) if snapshot.status.is_empty() => lines.push(UNAVAILABLE_MESSAGE.to_string()),
        Ok(snapshot) => {
            let status = &snapshot.status;
            lines.push(if status.is_rising {
                "Tide is rising".to_string()
            } else {
                "Tide is falling".to_string()
            });

            for (index, event) in status.upcoming().iter().enumerate() {
                let marker = if index == 0 { "> " } else { "  " };
                lines.push(format!(
                    "{}{} in: {} ({})",
                    marker,
                    event.event_type.label(),
                    Countdown::until(now, event.timestamp),
                    event.timestamp.format("%H:%M")
                ));
            }
        }
    }
    lines.push(String::new());

    let description = report
        .beach
        .as_ref()
        .and_then(|b| b.description.as_deref())
        .unwrap_or("No description available for this beach.");
    lines.push(description.to_string());

    let conditions = &report.conditions;
    let height = conditions
        .tide_height_m
        .map(|h| format!("{h:.2}m"))
        .unwrap_or_else(|| "unknown".to_string());
    lines.push(format!(
        "The current tide height is {}, the waves are {}, and it's {}, so conditions are {}.",
        height, conditions.waves, conditions.wind, conditions.verdict
    ));

    lines.join("\n") + "\n"
}

/// Render the chart to a text grid `columns` wide and `rows` tall.
///
/// Night columns are shaded with `░`, the curve is drawn with `•` and the point
/// nearest `hover` (searched on the full-day curve) is marked with `X` when it
/// falls inside the window. A readout line for the hovered point follows the
/// time axis.
pub fn draw_ascii(
    chart: &TideChart,
    rows: usize,
    columns: usize,
    hover: Option<DateTime<Utc>>,
) -> String {
    let rows = rows.max(2);
    let columns = columns.max(2);
    let width = columns as u32;

    let row_for = |height_m: f64| {
        let y = chart.y_for_height(height_m, (rows - 1) as u32).round();
        y.clamp(0.0, (rows - 1) as f64) as usize
    };
    let column_time = |column: usize| chart.time_for_x(column as f64 + 0.5, width);
    let column_for = |t: DateTime<Utc>| {
        (chart.x_for_time(t, width).floor().max(0.0) as usize).min(columns - 1)
    };

    let mut grid = vec![vec![' '; Y_AXIS_WIDTH + columns]; rows];
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    // Height labels on whole metres
    let mut metre = 0.0;
    while metre <= chart.max_height_m {
        let label = format!("{metre:>4.1}m");
        let row = row_for(metre);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
            grid[row][i] = ch;
        }
        metre += 1.0;
    }

    for column in 0..columns {
        let t = column_time(column);
        if chart.is_night(t) {
            for row in grid.iter_mut() {
                row[Y_AXIS_WIDTH + column] = '░';
            }
        }
        if let Some(height) = chart.height_at(t) {
            grid[row_for(height)][Y_AXIS_WIDTH + column] = '•';
        }
    }

    let hovered = hover.and_then(|t| chart.hover_at_time(t));
    if let Some(point) = hovered {
        if point.timestamp >= chart.window_start && point.timestamp <= chart.window_end {
            grid[row_for(point.height)][Y_AXIS_WIDTH + column_for(point.timestamp)] = 'X';
        }
    }

    let mut lines: Vec<String> = grid.into_iter().map(|row| row.into_iter().collect()).collect();

    // Time axis
    let padding = " ".repeat(Y_AXIS_WIDTH);
    let mut markers = vec![' '; columns];
    let mut labels = vec![' '; columns];
    for tick in chart.hour_ticks(TICK_HOURS) {
        let column = column_for(tick);
        markers[column] = '|';
        for (i, ch) in tick.format("%H").to_string().chars().enumerate() {
            if column + i < columns {
                labels[column + i] = ch;
            }
        }
    }
    lines.push(format!("{}{}", padding, markers.into_iter().collect::<String>()));
    lines.push(format!("{}{}", padding, labels.into_iter().collect::<String>()));

    if let Some(point) = hovered {
        lines.push(format!(
            "{}{}  {:.2}m",
            padding,
            point.timestamp.format("%H:%M"),
            point.height
        ));
    }

    lines.join("\n") + "\n"
}

/// Pixel position of a curve point inside the plot area of a `size` target.
fn plot_point(chart: &TideChart, point: &InterpolatedPoint, size: Size) -> Point {
    let plot_width = size.width - LEFT_MARGIN - 1;
    let plot_height = size.height - TOP_MARGIN - BOTTOM_MARGIN;
    let height_m = point.height.clamp(0.0, chart.max_height_m);

    let x = chart.x_for_time(point.timestamp, plot_width).round() as i32;
    let y = chart.y_for_height(height_m, plot_height).round() as i32;
    Point::new(LEFT_MARGIN as i32 + x, TOP_MARGIN as i32 + y)
}

/// Draw the chart onto a binary display.
///
/// Night bands are dithered, the curve is a 2px line and the hovered point is a
/// filled circle with a readout in the top margin. Targets too small to hold
/// the margins are left untouched.
pub fn draw_chart<D>(
    chart: &TideChart,
    hover: Option<DateTime<Utc>>,
    display: &mut D,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let size = display.bounding_box().size;
    if size.width <= LEFT_MARGIN + 1 || size.height <= TOP_MARGIN + BOTTOM_MARGIN + 1 {
        return Ok(());
    }

    let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let axis = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    let left = LEFT_MARGIN as i32;
    let right = size.width as i32 - 1;
    let top = TOP_MARGIN as i32;
    let bottom = (size.height - BOTTOM_MARGIN) as i32;
    let x_at = |t: DateTime<Utc>| {
        plot_point(
            chart,
            &InterpolatedPoint {
                timestamp: t,
                height: 0.0,
            },
            size,
        )
        .x
    };

    for (from, to) in chart.night_bands() {
        let x0 = x_at(from);
        let x1 = x_at(to);
        display.draw_iter((x0..=x1).flat_map(move |x| {
            (top..bottom)
                .filter(move |y| (x + y) % 2 == 0)
                .map(move |y| Pixel(Point::new(x, y), BinaryColor::On))
        }))?;
    }

    // Axes
    Line::new(Point::new(left, top), Point::new(left, bottom))
        .into_styled(axis)
        .draw(display)?;
    Line::new(Point::new(left, bottom), Point::new(right, bottom))
        .into_styled(axis)
        .draw(display)?;

    let mut metre = 0.0;
    while metre <= chart.max_height_m {
        let y = plot_point(
            chart,
            &InterpolatedPoint {
                timestamp: chart.window_start,
                height: metre,
            },
            size,
        )
        .y;
        Line::new(Point::new(left - 4, y), Point::new(left, y))
            .into_styled(axis)
            .draw(display)?;
        Text::new(&format!("{metre:.0}m"), Point::new(2, y + 3), text_style).draw(display)?;
        metre += 1.0;
    }

    for tick in chart.hour_ticks(TICK_HOURS) {
        let x = x_at(tick);
        Line::new(Point::new(x, bottom), Point::new(x, bottom + 3))
            .into_styled(axis)
            .draw(display)?;
        Text::new(
            &tick.format("%H").to_string(),
            Point::new(x - 5, size.height as i32 - 1),
            text_style,
        )
        .draw(display)?;
    }

    let curve = PrimitiveStyle::with_stroke(BinaryColor::On, 2);
    for pair in chart.visible().windows(2) {
        Line::new(
            plot_point(chart, &pair[0], size),
            plot_point(chart, &pair[1], size),
        )
        .into_styled(curve)
        .draw(display)?;
    }

    if let Some(point) = hover.and_then(|t| chart.hover_at_time(t)) {
        if point.timestamp >= chart.window_start && point.timestamp <= chart.window_end {
            Circle::with_center(plot_point(chart, &point, size), 7)
                .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                .draw(display)?;
        }
        let readout = format!("{}  {:.2}m", point.timestamp.format("%H:%M"), point.height);
        Text::new(&readout, Point::new(left + 4, 10), text_style).draw(display)?;
    }

    Ok(())
}

/// In-memory binary image that can be drawn on and saved as PBM.
#[derive(Clone, Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Canvas {
            width,
            height,
            pixels: vec![false; width as usize * height as usize],
        }
    }

    /// True when the pixel at (x, y) is set; out of bounds reads as unset.
    pub fn pixel(&self, x: i32, y: i32) -> bool {
        self.index(Point::new(x, y))
            .map(|i| self.pixels[i])
            .unwrap_or(false)
    }

    /// Number of set pixels.
    pub fn lit(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }

    fn index(&self, p: Point) -> Option<usize> {
        if p.x < 0 || p.y < 0 || p.x as u32 >= self.width || p.y as u32 >= self.height {
            return None;
        }
        Some(p.y as usize * self.width as usize + p.x as usize)
    }

    /// Plain (P1) portable bitmap; set pixels are black.
    pub fn to_pbm(&self) -> String {
        let mut out = format!("P1\n{} {}\n", self.width, self.height);
        for row in self.pixels.chunks(self.width.max(1) as usize) {
            let bits: Vec<char> = row.iter().map(|on| if *on { '1' } else { '0' }).collect();
            // PBM readers expect lines of at most 70 characters
            for chunk in bits.chunks(70) {
                out.extend(chunk);
                out.push('\n');
            }
        }
        out
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(i) = self.index(point) {
                self.pixels[i] = color.is_on();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Daylight;
    use crate::config::Config;
    use crate::session::{Readings, Session};
    use crate::{EventType, TideEvent, TideStationSeries};
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, hour, min, 0).unwrap()
    }

    fn events() -> Vec<TideEvent> {
        vec![
            TideEvent {
                timestamp: at(2, 0),
                height: 3.4,
                event_type: EventType::HighWater,
            },
            TideEvent {
                timestamp: at(8, 0),
                height: 0.5,
                event_type: EventType::LowWater,
            },
            TideEvent {
                timestamp: at(14, 0),
                height: 3.5,
                event_type: EventType::HighWater,
            },
            TideEvent {
                timestamp: at(20, 0),
                height: 0.6,
                event_type: EventType::LowWater,
            },
        ]
    }

    fn session() -> Session {
        let day = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let mut series = TideStationSeries::new();
        series.insert("0053".to_string(), events());

        let mut session = Session::new(Config::default(), day);
        session.select_beach("Sandown");
        session.apply_tide_result(Ok(series));
        let ticket = session.ticket();
        session.apply_readings(
            ticket,
            Readings {
                wind_speed_kmh: Some(10.0),
                wave_height_m: Some(0.4),
                daylight: Some(Daylight {
                    sunrise: at(4, 50),
                    sunset: at(21, 15),
                }),
            },
        );
        session
    }

    fn chart() -> TideChart {
        session()
            .report(at(11, 0))
            .tide
            .unwrap()
            .chart
            .unwrap()
    }

    #[test]
    fn test_report_text() {
        let session = session();
        let text = render_report(&session.report(at(11, 0)), at(11, 0));

        assert!(text.starts_with("Sandown (tides from Sandown)"));
        assert!(text.contains("Tide is rising"));
        assert!(text.contains("> High Water in: 3h 0m (14:00)"));
        assert!(text.contains("  Low Water in: 9h 0m (20:00)"));
        assert!(text.contains("sandy beach"));
        assert!(text.contains(
            "the waves are gentle waves, and it's a bit windy, so conditions are decent for swimming."
        ));
        assert!(text.contains("The current tide height is 2.00m"));
    }

    #[test]
    fn test_report_text_without_data() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let mut session = Session::new(Config::default(), day);
        session.select_beach("Sandown");
        session.apply_tide_result(Ok(TideStationSeries::new()));

        let text = render_report(&session.report(at(11, 0)), at(11, 0));
        assert!(text.contains(UNAVAILABLE_MESSAGE));
        assert!(text.contains("The current tide height is unknown"));
        assert!(!text.contains("Tide is"));
    }

    #[test]
    fn test_ascii_chart_layout() {
        let chart = chart();
        let text = draw_ascii(&chart, 16, 84, Some(at(14, 0)));
        let lines: Vec<&str> = text.lines().collect();

        // 16 grid rows, tick markers, tick labels, hover readout
        assert_eq!(lines.len(), 19);
        assert_eq!(lines[0].chars().count(), Y_AXIS_WIDTH + 84);
        // 4 m of a 4.5 m axis lands two rows below the top
        assert!(lines[2].starts_with(" 4.0m│"));
        assert!(lines[15].starts_with(" 0.0m│"));
        assert_eq!(lines[18].trim(), "14:00  3.50m");
    }

    #[test]
    fn test_ascii_hover_marker() {
        let chart = chart();
        let with_hover = draw_ascii(&chart, 16, 84, Some(at(14, 0)));
        let without = draw_ascii(&chart, 16, 84, None);

        assert_eq!(with_hover.matches('X').count(), 1);
        assert!(!without.contains('X'));
        // 3.5 m high water on a 4.5 m axis over 16 rows
        let x_row = with_hover.lines().position(|l| l.contains('X')).unwrap();
        assert_eq!(x_row, 3);
    }

    #[test]
    fn test_ascii_hover_outside_window() {
        let chart = chart();
        // 01:30 resolves to the 02:00 high water, before the 03:00 window start
        let text = draw_ascii(&chart, 16, 84, Some(at(1, 30)));
        assert!(!text.contains('X'));
        assert_eq!(text.lines().last().unwrap().trim(), "02:00  3.40m");
    }

    #[test]
    fn test_ascii_night_shading() {
        let text = draw_ascii(&chart(), 16, 84, None);
        let first_row = text.lines().next().unwrap();
        let plot: Vec<char> = first_row.chars().skip(Y_AXIS_WIDTH).collect();

        // Window opens before sunrise and closes after sunset
        assert_eq!(plot[0], '░');
        assert_eq!(plot[83], '░');
        assert!(plot[40] != '░');
    }

    #[test]
    fn test_ascii_time_labels() {
        let text = draw_ascii(&chart(), 16, 84, None);
        let labels = text.lines().nth(17).unwrap();
        assert!(labels.trim_start().starts_with("03"));
        assert!(labels.contains("12"));
        assert!(labels.contains("21"));
    }

    #[test]
    fn test_draw_chart_on_canvas() {
        let chart = chart();
        let mut canvas = Canvas::new(400, 300);
        draw_chart(&chart, Some(at(14, 0)), &mut canvas).unwrap();
        assert!(canvas.lit() > 0);

        let hovered = chart.hover_at_time(at(14, 0)).unwrap();
        let center = plot_point(&chart, &hovered, Size::new(400, 300));
        assert!(canvas.pixel(center.x, center.y));
        // Axis corner
        assert!(canvas.pixel(LEFT_MARGIN as i32, 300 - BOTTOM_MARGIN as i32));
    }

    #[test]
    fn test_night_bands_add_pixels() {
        let chart = chart();
        let mut day_only = Canvas::new(400, 300);
        draw_chart(&chart.clone().with_daylight(None), None, &mut day_only).unwrap();
        let mut with_night = Canvas::new(400, 300);
        draw_chart(&chart, None, &mut with_night).unwrap();

        assert!(with_night.lit() > day_only.lit());
    }

    #[test]
    fn test_tiny_canvas_is_untouched() {
        let mut canvas = Canvas::new(20, 20);
        draw_chart(&chart(), None, &mut canvas).unwrap();
        assert_eq!(canvas.lit(), 0);
    }

    #[test]
    fn test_pbm_output() {
        let mut canvas = Canvas::new(100, 2);
        canvas
            .draw_iter([Pixel(Point::new(0, 0), BinaryColor::On)])
            .unwrap();
        let pbm = canvas.to_pbm();
        let lines: Vec<&str> = pbm.lines().collect();

        assert_eq!(lines[0], "P1");
        assert_eq!(lines[1], "100 2");
        // Each 100 pixel row is split into 70 + 30
        assert_eq!(lines.len(), 2 + 4);
        assert!(lines[2].starts_with('1'));
        assert!(lines.iter().all(|l| l.len() <= 70));
    }

    #[test]
    fn test_window_from_config() {
        let chart = chart();
        assert_eq!(
            chart.window_start.time(),
            NaiveTime::from_hms_opt(3, 0, 0).unwrap()
        );
    }
}
