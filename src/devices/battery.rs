use std::f64::consts::PI;

use rand::{Rng, rngs::StdRng};

use crate::devices::solar;
use crate::devices::types::{Device, DeviceContext, DeviceOutput};
use crate::sim::calendar::TimeContext;
use crate::sim::types::DerKind;

/// Deep-discharge protection floor in percent.
pub const SOC_MIN: f64 = 10.0;
/// Upper SOC bound in percent.
pub const SOC_MAX: f64 = 100.0;
/// Usable energy per kW of nameplate power.
pub const STORAGE_HOURS: f64 = 2.0;
/// Output magnitude never exceeds this share of nameplate power.
const MAX_OUTPUT_SHARE: f64 = 0.8;
/// Peak charge rate (share of capacity) at the solar peak.
const SOLAR_CHARGE_RATE: f64 = 0.5;
/// Half-width of the off-peak drift rate.
const DRIFT_RATE: f64 = 0.05;

/// Morning discharge window, local hours.
const MORNING: (f64, f64) = (6.0, 9.0);
/// Evening peak discharge window, local hours.
const EVENING: (f64, f64) = (17.0, 20.0);

/// What the battery is doing in the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryMode {
    /// Morning peak discharge.
    MorningDischarge,
    /// Charging from co-located solar.
    SolarCharge,
    /// Evening peak discharge.
    EveningDischarge,
    /// Small undirected drift.
    Idle,
}

/// A battery energy storage system following the daily New Brunswick pattern.
///
/// Tracks its own state of charge (SOC, percent) across ticks and enforces
/// `SOC_MIN <= soc <= SOC_MAX` on every step.
///
/// # Power Convention
/// - Positive output: discharging (offsets grid draw)
/// - Negative output: charging
#[derive(Debug, Clone)]
pub struct Battery {
    /// Nameplate power in kilowatts.
    pub capacity_kw: f64,

    /// Usable energy in kilowatt-hours.
    pub energy_kwh: f64,

    /// State of charge in percent.
    pub soc: f64,

    /// Standalone batteries have no solar array to charge from.
    pub is_standalone: bool,
}

impl Battery {
    /// Creates a new battery.
    ///
    /// # Arguments
    ///
    /// * `capacity_kw` - Nameplate power in kW (must be > 0)
    /// * `soc` - Initial state of charge in percent, clamped into bounds
    /// * `is_standalone` - Whether the battery lacks co-located solar
    ///
    /// # Panics
    ///
    /// Panics if `capacity_kw` is not positive.
    pub fn new(capacity_kw: f64, soc: f64, is_standalone: bool) -> Self {
        assert!(capacity_kw > 0.0, "battery capacity must be > 0");
        Self {
            capacity_kw,
            energy_kwh: capacity_kw * STORAGE_HOURS,
            soc: soc.clamp(SOC_MIN, SOC_MAX),
            is_standalone,
        }
    }

    /// Selects the operating mode for this time of day.
    ///
    /// Precedence: morning discharge, then solar charging (non-standalone only),
    /// then evening discharge, then idle drift.
    pub fn mode(&self, time: &TimeContext) -> BatteryMode {
        if time.within(MORNING.0, MORNING.1) {
            BatteryMode::MorningDischarge
        } else if time.is_daylight && !self.is_standalone {
            BatteryMode::SolarCharge
        } else if time.within(EVENING.0, EVENING.1) {
            BatteryMode::EveningDischarge
        } else {
            BatteryMode::Idle
        }
    }

    /// Signed share of capacity requested this tick (positive = discharge).
    fn rate(&self, mode: BatteryMode, time: &TimeContext, rng: &mut StdRng) -> f64 {
        match mode {
            BatteryMode::MorningDischarge => {
                let phase = (time.hour_of_day - MORNING.0) / (MORNING.1 - MORNING.0);
                0.35 + 0.20 * (PI * phase).sin()
            }
            BatteryMode::SolarCharge => {
                -SOLAR_CHARGE_RATE * solar::time_of_day_factor(time) / solar::PEAK_FACTOR
            }
            BatteryMode::EveningDischarge => {
                let phase = (time.hour_of_day - EVENING.0) / (EVENING.1 - EVENING.0);
                0.60 + 0.10 * (PI * phase).sin()
            }
            BatteryMode::Idle => rng.random_range(-DRIFT_RATE..=DRIFT_RATE),
        }
    }

    /// Applies a requested power for `dt_hours`, limited so SOC stays in bounds.
    ///
    /// Returns the power actually delivered (positive = discharge).
    fn apply(&mut self, requested_kw: f64, dt_hours: f64) -> f64 {
        if dt_hours <= 0.0 {
            return 0.0;
        }

        let actual_kw = if requested_kw > 0.0 {
            let max_kw = (self.soc - SOC_MIN) / 100.0 * self.energy_kwh / dt_hours;
            requested_kw.min(max_kw.max(0.0))
        } else if requested_kw < 0.0 {
            let max_kw = (SOC_MAX - self.soc) / 100.0 * self.energy_kwh / dt_hours;
            -(-requested_kw).min(max_kw.max(0.0))
        } else {
            0.0
        };

        self.soc -= actual_kw * dt_hours / self.energy_kwh * 100.0;
        self.soc = self.soc.clamp(SOC_MIN, SOC_MAX);
        actual_kw
    }
}

/// SOC-dependent willingness to discharge: 0.55 at the floor, 1.0 when full.
pub fn soc_factor(soc: f64) -> f64 {
    0.5 + soc / 200.0
}

/// Small deterministic variation cycling with the minute of the hour (0.95–1.04).
pub fn minute_variation(time: &TimeContext) -> f64 {
    0.95 + f64::from(time.minute % 10) / 100.0
}

/// Typical state of charge for this time of day.
///
/// Follows the daily cycle (charging overnight, drawn down in the morning,
/// topped up by solar mid-day, drawn down again in the evening), shifted by a
/// per-DER offset of -5..=4 points and a ±3 point drift across the hour.
pub fn initial_soc(time: &TimeContext, der_seed: u64) -> f64 {
    let hour = f64::from(time.hour);
    let base = match time.hour {
        0..=5 => 65.0 + hour * 3.0,
        6..=8 => 80.0 - (hour - 6.0) * 6.0,
        9..=14 => 62.0 + (hour - 9.0) * 3.0,
        15..=20 => 80.0 - (hour - 15.0) * 5.0,
        _ => 50.0 + (hour - 21.0) * 3.0,
    };
    let day_seed = u64::from(time.day) + u64::from(time.month) * 31;
    let offset = (der_seed.wrapping_add(day_seed) % 10) as f64 - 5.0;
    let drift = f64::from(time.minute) / 60.0 * 6.0 - 3.0;
    (base + offset + drift).clamp(SOC_MIN, 95.0)
}

impl Device for Battery {
    /// Computes this tick's output and commits the matching SOC change.
    fn step(&mut self, context: &DeviceContext<'_>, rng: &mut StdRng) -> DeviceOutput {
        let mode = self.mode(context.time);
        let rate = self.rate(mode, context.time, rng);
        let cap = self.capacity_kw * MAX_OUTPUT_SHARE;
        let requested_kw = (self.capacity_kw
            * rate
            * soc_factor(self.soc)
            * minute_variation(context.time))
        .clamp(-cap, cap);

        let output_kw = self.apply(requested_kw, context.dt_hours);

        DeviceOutput {
            output_kw,
            soc_pct: Some(self.soc),
            is_online: true,
            connection_start_at: None,
        }
    }

    fn device_type(&self) -> DerKind {
        DerKind::BatteryStorage
    }
}
