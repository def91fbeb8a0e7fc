//! # Swim Conditions Heuristic
//!
//! A deliberately simple verdict on whether a beach is pleasant for a swim,
//! combining wind speed, significant wave height and the current tide height.
//! All thresholds are named constants and can be overridden from the `[swim]`
//! table of the configuration file.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wind above this (km/h) is "very windy" and makes swimming rough.
pub const VERY_WINDY_KMH: f64 = 15.0;
/// Wind above this (km/h) is "a bit windy".
pub const BREEZY_KMH: f64 = 8.0;
/// Wind must be below this (km/h) for an ideal swim.
pub const IDEAL_MAX_WIND_KMH: f64 = 5.0;
/// Waves above this (m) are rough and make swimming rough.
pub const ROUGH_WAVES_M: f64 = 1.2;
/// Waves above this (m) are moderate surf.
pub const MODERATE_WAVES_M: f64 = 0.6;
/// Waves above this (m) are gentle; an ideal swim needs less.
pub const GENTLE_WAVES_M: f64 = 0.3;
/// Tide must be above this (m) for an ideal swim.
pub const IDEAL_MIN_TIDE_M: f64 = 1.0;

/// Thresholds used by [`SwimThresholds::assess`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwimThresholds {
    pub very_windy_kmh: f64,
    pub breezy_kmh: f64,
    pub ideal_max_wind_kmh: f64,
    pub rough_waves_m: f64,
    pub moderate_waves_m: f64,
    pub gentle_waves_m: f64,
    pub ideal_min_tide_m: f64,
}

impl Default for SwimThresholds {
    fn default() -> Self {
        SwimThresholds {
            very_windy_kmh: VERY_WINDY_KMH,
            breezy_kmh: BREEZY_KMH,
            ideal_max_wind_kmh: IDEAL_MAX_WIND_KMH,
            rough_waves_m: ROUGH_WAVES_M,
            moderate_waves_m: MODERATE_WAVES_M,
            gentle_waves_m: GENTLE_WAVES_M,
            ideal_min_tide_m: IDEAL_MIN_TIDE_M,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WindLevel {
    Calm,
    Breezy,
    VeryWindy,
}

impl fmt::Display for WindLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WindLevel::Calm => "calm",
            WindLevel::Breezy => "a bit windy",
            WindLevel::VeryWindy => "very windy",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WaveLevel {
    Calm,
    Gentle,
    ModerateSurf,
    Rough,
}

impl fmt::Display for WaveLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WaveLevel::Calm => "calm",
            WaveLevel::Gentle => "gentle waves",
            WaveLevel::ModerateSurf => "moderate surf",
            WaveLevel::Rough => "rough",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwimVerdict {
    Ideal,
    Decent,
    ProbablyRough,
}

impl fmt::Display for SwimVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwimVerdict::Ideal => "ideal for a swim",
            SwimVerdict::Decent => "decent for swimming",
            SwimVerdict::ProbablyRough => "probably rough for swimming",
        })
    }
}

/// Outcome of the heuristic for one set of readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwimConditions {
    pub wind: WindLevel,
    pub waves: WaveLevel,
    pub verdict: SwimVerdict,
    /// Tide height used for the verdict, if the curve had a point near now
    pub tide_height_m: Option<f64>,
}

impl SwimThresholds {
    pub fn wind_level(&self, wind_kmh: f64) -> WindLevel {
        if wind_kmh > self.very_windy_kmh {
            WindLevel::VeryWindy
        } else if wind_kmh > self.breezy_kmh {
            WindLevel::Breezy
        } else {
            WindLevel::Calm
        }
    }

    pub fn wave_level(&self, wave_height_m: f64) -> WaveLevel {
        if wave_height_m > self.rough_waves_m {
            WaveLevel::Rough
        } else if wave_height_m > self.moderate_waves_m {
            WaveLevel::ModerateSurf
        } else if wave_height_m > self.gentle_waves_m {
            WaveLevel::Gentle
        } else {
            WaveLevel::Calm
        }
    }

    /// Combine wind, waves and tide height into a verdict.
    ///
    /// An unknown tide height never qualifies as ideal.
    pub fn assess(
        &self,
        wind_kmh: f64,
        wave_height_m: f64,
        tide_height_m: Option<f64>,
    ) -> SwimConditions {
        let verdict = if wind_kmh > self.very_windy_kmh || wave_height_m > self.rough_waves_m {
            SwimVerdict::ProbablyRough
        } else if wind_kmh < self.ideal_max_wind_kmh
            && tide_height_m.is_some_and(|h| h > self.ideal_min_tide_m)
            && wave_height_m < self.gentle_waves_m
        {
            SwimVerdict::Ideal
        } else {
            SwimVerdict::Decent
        };

        SwimConditions {
            wind: self.wind_level(wind_kmh),
            waves: self.wave_level(wave_height_m),
            verdict,
            tide_height_m,
        }
    }
}
