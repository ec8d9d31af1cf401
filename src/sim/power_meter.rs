//! Site power meter: regional base load minus DER contribution.

use super::calendar::TimeContext;
use super::consumption::ConsumptionState;
use super::types::DerProfile;

/// Weekday share of the contract baseline drawn in each local hour.
const WEEKDAY_USAGE: [f64; 24] = [
    0.65, 0.55, 0.50, 0.45, 0.50, 0.70, // overnight to early morning
    0.85, 1.10, 1.20, 1.05, 0.85, 0.80, // morning peak to mid-day
    0.75, 0.70, 0.65, 0.70, 0.85, 1.05, // mid-day to evening
    1.20, 1.15, 1.00, 0.90, 0.80, 0.70, // evening peak to night
];

/// Weekend overrides for hours 06–16: later, smaller morning peak and busier mid-day.
const WEEKEND_USAGE: [(u32, f64); 11] = [
    (6, 0.70),
    (7, 0.80),
    (8, 0.90),
    (9, 1.00),
    (10, 1.05),
    (11, 0.95),
    (12, 0.90),
    (13, 0.85),
    (14, 0.80),
    (15, 0.85),
    (16, 0.95),
];

/// Minutes at each hour edge over which neighbouring hours are blended.
const BLEND_MINUTES: f64 = 15.0;

fn hourly_usage(hour: u32, is_weekend: bool) -> f64 {
    let hour = hour % 24;
    if is_weekend {
        if let Some(&(_, f)) = WEEKEND_USAGE.iter().find(|(h, _)| *h == hour) {
            return f;
        }
    }
    WEEKDAY_USAGE[hour as usize]
}

/// Time-of-day usage factor with 15-minute blending at the hour edges.
///
/// Within a quarter hour of a boundary the factor is interpolated between the
/// two neighbouring hourly values, meeting at their midpoint on the boundary.
pub fn usage_factor(time: &TimeContext) -> f64 {
    let current = hourly_usage(time.hour, time.is_weekend);
    let minute = f64::from(time.minute);
    if minute < BLEND_MINUTES {
        let prev = hourly_usage(time.hour + 23, time.is_weekend);
        let ratio = (BLEND_MINUTES - minute) / (2.0 * BLEND_MINUTES);
        current * (1.0 - ratio) + prev * ratio
    } else if minute > 60.0 - BLEND_MINUTES {
        let next = hourly_usage(time.hour + 1, time.is_weekend);
        let ratio = (minute - (60.0 - BLEND_MINUTES)) / (2.0 * BLEND_MINUTES);
        current * (1.0 - ratio) + next * ratio
    } else {
        current
    }
}

/// Site consumption before any DER offset, in kW.
///
/// `baseline × region factor × usage factor × trend × appliance event`.
pub fn base_load_kw(profile: &DerProfile, time: &TimeContext, consumption: &ConsumptionState) -> f64 {
    profile.baseline_kw
        * profile.region.load_factor()
        * usage_factor(time)
        * consumption.trend()
        * consumption.event_multiplier()
}

/// Contract violation mode: DER output is divided by `multiplier` before it
/// offsets the meter, so the site appears to under-deliver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViolationMode {
    pub enabled: bool,
    pub multiplier: f64,
}

impl ViolationMode {
    /// Normal operation.
    pub const OFF: ViolationMode = ViolationMode {
        enabled: false,
        multiplier: 1.0,
    };

    /// Violation mode with the given divisor.
    pub fn with_multiplier(multiplier: f64) -> Self {
        Self {
            enabled: true,
            multiplier,
        }
    }

    /// DER output as seen by the meter.
    pub fn effective_der_kw(&self, der_kw: f64) -> f64 {
        if self.enabled && self.multiplier > 0.0 {
            der_kw / self.multiplier
        } else {
            der_kw
        }
    }
}

impl Default for ViolationMode {
    fn default() -> Self {
        Self::OFF
    }
}

/// Meter reading in kW: base load net of the effective DER output, never negative.
///
/// Pure, so violation thresholds can be asserted exactly.
pub fn meter_reading_kw(base_load_kw: f64, der_kw: f64, violation: ViolationMode) -> f64 {
    (base_load_kw - violation.effective_der_kw(der_kw)).max(0.0)
}

/// Meter reading for one DER's site at this tick.
pub fn reading(
    profile: &DerProfile,
    time: &TimeContext,
    consumption: &ConsumptionState,
    der_kw: f64,
    violation: ViolationMode,
) -> f64 {
    meter_reading_kw(base_load_kw(profile, time, consumption), der_kw, violation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::{DerKind, Region};
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    /// Midnight local time (AST) on a Wednesday in March.
    fn local_midnight() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 4, 0, 0).single().expect("valid timestamp")
    }

    fn ctx(minutes: i64) -> TimeContext {
        TimeContext::new(local_midnight() + TimeDelta::minutes(minutes), Region::Fredericton)
    }

    fn profile(region: Region) -> DerProfile {
        DerProfile {
            der_id: "12".to_string(),
            kind: DerKind::Solar,
            nameplate_capacity_kw: 8.0,
            region,
            project_id: "p".to_string(),
            utility_id: "u".to_string(),
            is_standalone: false,
            baseline_kw: 20.0,
            contract_threshold_kw: 15.0,
        }
    }

    #[test]
    fn usage_is_flat_mid_hour() {
        assert_eq!(usage_factor(&ctx(8 * 60 + 30)), 1.20);
        assert_eq!(usage_factor(&ctx(3 * 60 + 20)), 0.45);
    }

    #[test]
    fn usage_blends_at_hour_edges() {
        // 08:00 sits midway between the 07:00 and 08:00 values.
        assert!((usage_factor(&ctx(8 * 60)) - 1.15).abs() < 1e-12);
        assert!((usage_factor(&ctx(8 * 60 + 15)) - 1.20).abs() < 1e-12);
        // 18:52 is part way from 1.20 toward 1.15.
        let f = usage_factor(&ctx(18 * 60 + 52));
        assert!(f < 1.20 && f > 1.15);
    }

    #[test]
    fn usage_changes_smoothly_minute_to_minute() {
        for m in 1..(24 * 60) {
            let step = (usage_factor(&ctx(m)) - usage_factor(&ctx(m - 1))).abs();
            assert!(step < 0.05, "jump {step} at minute {m}");
        }
    }

    #[test]
    fn weekend_overrides_morning_peak() {
        // 2025-03-15 is a Saturday.
        let sat = Utc.with_ymd_and_hms(2025, 3, 15, 12, 30, 0).single().expect("valid timestamp");
        let t = TimeContext::new(sat, Region::Fredericton);
        assert!(t.is_weekend);
        assert_eq!(usage_factor(&t), 0.90);
        assert_eq!(usage_factor(&ctx(8 * 60 + 30)), 1.20);
    }

    #[test]
    fn base_load_applies_region_factor() {
        let c = ConsumptionState::new(local_midnight());
        let t = ctx(8 * 60 + 30);
        let fredericton = base_load_kw(&profile(Region::Fredericton), &t, &c);
        let saint_john = base_load_kw(&profile(Region::SaintJohn), &t, &c);
        assert!((fredericton - 24.0).abs() < 1e-9);
        assert!((saint_john - 24.0 * 1.02).abs() < 1e-9);
    }

    #[test]
    fn meter_never_negative() {
        assert_eq!(meter_reading_kw(5.0, 8.0, ViolationMode::OFF), 0.0);
        assert_eq!(meter_reading_kw(10.0, 4.0, ViolationMode::OFF), 6.0);
    }

    #[test]
    fn violation_suppresses_der_offset() {
        let normal = meter_reading_kw(10.0, 6.0, ViolationMode::OFF);
        let violated = meter_reading_kw(10.0, 6.0, ViolationMode::with_multiplier(3.0));
        assert_eq!(normal, 4.0);
        assert_eq!(violated, 8.0);
    }

    #[test]
    fn larger_multiplier_never_lowers_meter() {
        let mut prev = meter_reading_kw(12.0, 7.0, ViolationMode::OFF);
        for m in [1.0, 1.5, 2.0, 3.0, 10.0] {
            let reading = meter_reading_kw(12.0, 7.0, ViolationMode::with_multiplier(m));
            assert!(reading >= prev);
            prev = reading;
        }
    }
}
