//! Calendar features derived from a UTC timestamp in a region's local time.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use super::types::Region;

/// Local time-of-day and calendar features for one instant.
///
/// Pure and total: every valid timestamp maps to a context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeContext {
    /// Local hour (0–23).
    pub hour: u32,
    /// Local minute (0–59).
    pub minute: u32,
    /// Local fractional hour, e.g. `12.5` for 12:30.
    pub hour_of_day: f64,
    /// Local day of month.
    pub day: u32,
    /// Local month (1–12).
    pub month: u32,
    /// Saturday or Sunday.
    pub is_weekend: bool,
    /// Inside the region's daylight window.
    pub is_daylight: bool,
    /// Sunrise as a local fractional hour.
    pub sunrise: f64,
    /// Sunset as a local fractional hour.
    pub sunset: f64,
}

impl TimeContext {
    /// Derives the local calendar context of `at` for `region`.
    pub fn new(at: DateTime<Utc>, region: Region) -> Self {
        let local = at.naive_utc() + region.utc_offset();
        let hour = local.hour();
        let minute = local.minute();
        let hour_of_day =
            f64::from(hour) + f64::from(minute) / 60.0 + f64::from(local.second()) / 3600.0;
        let (sunrise, sunset) = region.daylight_window();

        Self {
            hour,
            minute,
            hour_of_day,
            day: local.day(),
            month: local.month(),
            is_weekend: matches!(local.weekday(), Weekday::Sat | Weekday::Sun),
            is_daylight: hour_of_day >= sunrise && hour_of_day < sunset,
            sunrise,
            sunset,
        }
    }

    /// Returns `true` when the local time falls in `[start_hour, end_hour)`.
    pub fn within(&self, start_hour: f64, end_hour: f64) -> bool {
        self.hour_of_day >= start_hour && self.hour_of_day < end_hour
    }
}
