//! # Dashboard Session
//!
//! The session is the single owner of everything the dashboard knows: the
//! selected beach and day, its nearest tide station, the fetched tide events and
//! the latest external readings (wind, waves, daylight). It is passed explicitly
//! to whoever needs it; nothing is kept in globals.
//!
//! ## Stale Responses
//!
//! Readings are fetched per beach. Each beach selection bumps a generation
//! counter and [`Session::ticket`] hands out the current generation. A result
//! applied with an older ticket belongs to a previous selection and is
//! discarded instead of overwriting newer state.

use crate::chart::{Daylight, TideChart};
use crate::conditions::SwimConditions;
use crate::config::{BeachConfig, Config, StationConfig};
use crate::curve::build_daily_curve;
use crate::geo::closest_station;
use crate::status::{derive_status, nearest_point, TideStatus};
use crate::tide_data::TideError;
use crate::{InterpolatedPoint, TideEvent, TideStationSeries};
use chrono::{DateTime, Days, NaiveDate, Utc};

/// Message shown whenever tide data cannot be displayed.
pub const UNAVAILABLE_MESSAGE: &str = "Unable to load tide data.";

/// State of the tide data shared by every beach.
#[derive(Debug, Clone, PartialEq)]
pub enum TideAvailability {
    Loading,
    /// The fetch failed after all retries
    Unavailable(String),
    Loaded(TideStationSeries),
}

/// Readings supplied by the weather and wave collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readings {
    pub wind_speed_kmh: Option<f64>,
    pub wave_height_m: Option<f64>,
    pub daylight: Option<Daylight>,
}

/// Selection generation a fetch was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Tide view for the selected beach and day.
#[derive(Debug, Clone)]
pub struct TideSnapshot {
    pub status: TideStatus,
    /// Full-day curve for the selected date
    pub curve: Vec<InterpolatedPoint>,
    /// Height of the curve point closest to now
    pub current_height: Option<f64>,
    /// Absent when the selected day has no events
    pub chart: Option<TideChart>,
}

/// Everything the presentation layer shows for one instant.
#[derive(Debug, Clone)]
pub struct TideReport {
    pub beach: Option<BeachConfig>,
    pub station: Option<StationConfig>,
    pub date: NaiveDate,
    pub tide: Result<TideSnapshot, String>,
    pub conditions: SwimConditions,
}

/// Dashboard state owned by the controller.
pub struct Session {
    config: Config,
    beach: Option<BeachConfig>,
    station: Option<StationConfig>,
    date: NaiveDate,
    tide: TideAvailability,
    readings: Readings,
    generation: u64,
}

/// The `count` selectable days starting at `today`.
pub fn date_options(today: NaiveDate, count: u32) -> Vec<NaiveDate> {
    (0..u64::from(count))
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .collect()
}

impl Session {
    pub fn new(config: Config, today: NaiveDate) -> Self {
        Session {
            config,
            beach: None,
            station: None,
            date: today,
            tide: TideAvailability::Loading,
            readings: Readings::default(),
            generation: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn beach(&self) -> Option<&BeachConfig> {
        self.beach.as_ref()
    }

    pub fn station(&self) -> Option<&StationConfig> {
        self.station.as_ref()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn tide(&self) -> &TideAvailability {
        &self.tide
    }

    pub fn readings(&self) -> Readings {
        self.readings
    }

    /// Select a beach by name and map it to its nearest tide station.
    ///
    /// Readings from the previous beach are cleared and outstanding tickets
    /// become stale. Returns `None` for an unknown beach.
    pub fn select_beach(&mut self, name: &str) -> Option<&BeachConfig> {
        let beach = self.config.beach(name)?.clone();
        let station = closest_station(&beach, &self.config.stations).cloned();

        tracing::info!(
            beach = %beach.name,
            station = station.as_ref().map(|s| s.name.as_str()).unwrap_or("none"),
            "beach selected"
        );

        self.generation += 1;
        self.readings = Readings::default();
        self.station = station;
        self.beach = Some(beach);
        self.beach.as_ref()
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    /// Ticket for a fetch issued for the current selection.
    pub fn ticket(&self) -> FetchTicket {
        FetchTicket(self.generation)
    }

    /// Record the outcome of the tide fetch, replacing any earlier data.
    pub fn apply_tide_result(&mut self, result: Result<TideStationSeries, TideError>) {
        self.tide = match result {
            Ok(series) => TideAvailability::Loaded(series),
            Err(e) => {
                tracing::warn!("tide data unavailable: {}", e);
                TideAvailability::Unavailable(e.to_string())
            }
        };
    }

    /// Apply readings fetched for the selection `ticket` was issued for.
    ///
    /// Returns false, leaving the session untouched, when the ticket is stale.
    pub fn apply_readings(&mut self, ticket: FetchTicket, readings: Readings) -> bool {
        if ticket != self.ticket() {
            tracing::debug!(?ticket, current = self.generation, "discarding stale readings");
            return false;
        }
        self.readings = readings;
        true
    }

    /// Events of the selected beach's station, if tide data is loaded.
    pub fn station_events(&self) -> Option<&[TideEvent]> {
        let station = self.station.as_ref()?;
        match &self.tide {
            TideAvailability::Loaded(series) => series.get(&station.id).map(Vec::as_slice),
            _ => None,
        }
    }

    /// Derive the full report for `now`.
    pub fn report(&self, now: DateTime<Utc>) -> TideReport {
        let tide = self.tide_snapshot(now);
        let current_height = tide.as_ref().ok().and_then(|t| t.current_height);

        let conditions = self.config.swim.assess(
            self.readings.wind_speed_kmh.unwrap_or(0.0),
            self.readings.wave_height_m.unwrap_or(0.0),
            current_height,
        );

        TideReport {
            beach: self.beach.clone(),
            station: self.station.clone(),
            date: self.date,
            tide,
            conditions,
        }
    }

    fn tide_snapshot(&self, now: DateTime<Utc>) -> Result<TideSnapshot, String> {
        if self.beach.is_none() {
            return Err(UNAVAILABLE_MESSAGE.to_string());
        }

        let events = match (&self.tide, self.station_events()) {
            (TideAvailability::Loading, _) => return Err("Loading tide data...".to_string()),
            (TideAvailability::Unavailable(reason), _) => {
                return Err(format!("{UNAVAILABLE_MESSAGE} ({reason})"))
            }
            (TideAvailability::Loaded(_), Some(events)) if !events.is_empty() => events,
            (TideAvailability::Loaded(_), _) => return Err(UNAVAILABLE_MESSAGE.to_string()),
        };

        let curve = build_daily_curve(events, self.date);
        let current_height = nearest_point(&curve, now).map(|p| p.height);

        let chart = (!curve.is_empty()).then(|| {
            let chart_config = &self.config.chart;
            TideChart::new(
                curve.clone(),
                self.date,
                chart_config.window_start,
                chart_config.window_end,
                chart_config.max_height_m,
            )
            .with_daylight(self.readings.daylight)
        });

        Ok(TideSnapshot {
            status: derive_status(events, now),
            curve,
            current_height,
            chart,
        })
    }
}
