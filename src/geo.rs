//! Great-circle distance and nearest tide station lookup.

use crate::config::{BeachConfig, StationConfig};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two `[lat, lon]` pairs (degrees).
///
/// Non-finite coordinates give `f64::INFINITY` so they never win a
/// nearest-station comparison.
pub fn haversine_km(a: [f64; 2], b: [f64; 2]) -> f64 {
    if a.iter().chain(b.iter()).any(|c| !c.is_finite()) {
        return f64::INFINITY;
    }

    let d_lat = (b[0] - a[0]).to_radians();
    let d_lon = (b[1] - a[1]).to_radians();
    let lat1 = a[0].to_radians();
    let lat2 = b[0].to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + (d_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Tide station closest to `beach`; the first station wins a tie.
pub fn closest_station<'a>(
    beach: &BeachConfig,
    stations: &'a [StationConfig],
) -> Option<&'a StationConfig> {
    let mut best: Option<(&StationConfig, f64)> = None;
    for station in stations {
        let distance = haversine_km(beach.coords, station.coords);
        if !distance.is_finite() {
            continue;
        }
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((station, distance)),
        }
    }
    best.map(|(station, _)| station)
}
