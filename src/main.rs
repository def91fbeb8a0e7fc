//! # Beach Tides Command Line Dashboard
//!
//! Picks a beach, fetches (or reads cached) tide predictions for its nearest
//! station and prints the tide status, the swim conditions and an ASCII chart
//! for the selected day. The chart can also be written as a PBM bitmap.
//!
//! Wind, wave and daylight readings come from other services; pass them in with
//! `--wind`, `--waves`, `--sunrise` and `--sunset`.

use anyhow::{anyhow, Context};
use beach_tides_lib::chart::Daylight;
use beach_tides_lib::config::Config;
use beach_tides_lib::geo::closest_station;
use beach_tides_lib::renderer::{draw_ascii, draw_chart, render_report, Canvas};
use beach_tides_lib::session::{date_options, Readings, Session};
use beach_tides_lib::tide_data::TideClient;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{ArgAction, Parser, ValueHint};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Tide times and swim conditions for Isle of Wight beaches", long_about = None)]
struct Cli {
    /// Configuration file (defaults to beach-config.toml when present)
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Beach to show
    #[arg(short, long, default_value = "Sandown")]
    beach: String,

    /// Day to chart (YYYY-MM-DD, UTC); defaults to today
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Time to read off the chart (HH:MM, UTC); defaults to now when charting today
    #[arg(long, value_parser = parse_clock)]
    hover: Option<NaiveTime>,

    /// Wind speed in km/h
    #[arg(long)]
    wind: Option<f64>,

    /// Wave height in meters
    #[arg(long)]
    waves: Option<f64>,

    /// Sunrise (HH:MM, UTC)
    #[arg(long, value_parser = parse_clock)]
    sunrise: Option<NaiveTime>,

    /// Sunset (HH:MM, UTC)
    #[arg(long, value_parser = parse_clock)]
    sunset: Option<NaiveTime>,

    /// Also draw the chart into a PBM image
    #[arg(long, value_hint = ValueHint::FilePath)]
    pbm: Option<PathBuf>,

    /// List beaches and selectable days, then exit
    #[arg(long, action = ArgAction::SetTrue)]
    list: bool,

    /// Debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn parse_clock(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}

fn at_time(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(time))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = match &cli.config {
        Some(path) => Config::try_load_from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load(),
    };

    let now = Utc::now();
    let today = now.date_naive();
    let dates = date_options(today, config.chart.date_options);

    if cli.list {
        print_listing(&config, &dates);
        return Ok(());
    }

    let date = cli.date.unwrap_or(today);
    if !dates.contains(&date) {
        warn!("{} is outside the {} forecast days", date, dates.len());
    }

    let mut session = Session::new(config, today);
    session.select_date(date);
    session
        .select_beach(&cli.beach)
        .ok_or_else(|| anyhow!("unknown beach '{}' (see --list)", cli.beach))?;
    let ticket = session.ticket();

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let client = TideClient::new(&session.config().tide).context("building tide API client")?;
    let result = runtime.block_on(client.fetch());
    session.apply_tide_result(result);

    let daylight = match (cli.sunrise, cli.sunset) {
        (Some(sunrise), Some(sunset)) => Some(Daylight {
            sunrise: at_time(date, sunrise),
            sunset: at_time(date, sunset),
        }),
        (None, None) => None,
        _ => {
            warn!("both --sunrise and --sunset are needed to shade the night");
            None
        }
    };
    session.apply_readings(
        ticket,
        Readings {
            wind_speed_kmh: cli.wind,
            wave_height_m: cli.waves,
            daylight,
        },
    );

    let report = session.report(now);
    print!("{}", render_report(&report, now));

    let Some(chart) = report.tide.as_ref().ok().and_then(|t| t.chart.as_ref()) else {
        return Ok(());
    };

    let hover = match cli.hover {
        Some(time) => Some(at_time(date, time)),
        None if date == today => Some(now),
        None => None,
    };

    let chart_config = &session.config().chart;
    println!();
    print!(
        "{}",
        draw_ascii(chart, chart_config.ascii_rows, chart_config.ascii_columns, hover)
    );

    if let Some(path) = &cli.pbm {
        let mut canvas = Canvas::new(chart_config.width, chart_config.height);
        draw_chart(chart, hover, &mut canvas).unwrap_or_else(|never| match never {});
        fs::write(path, canvas.to_pbm())
            .with_context(|| format!("writing chart to {}", path.display()))?;
        info!("chart written to {}", path.display());
    }

    Ok(())
}

fn print_listing(config: &Config, dates: &[NaiveDate]) {
    println!("Beaches:");
    for beach in &config.beaches {
        let station = closest_station(beach, &config.stations)
            .map(|s| s.name.as_str())
            .unwrap_or("no station");
        println!("  {:<14} {:<12} {}", beach.name, station, beach.tags.join(", "));
    }

    println!();
    println!("Days:");
    for date in dates {
        println!("  {}", date.format("%Y-%m-%d %a"));
    }
}
