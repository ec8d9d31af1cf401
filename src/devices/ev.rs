use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, rngs::StdRng};

use crate::devices::types::{Device, DeviceContext, DeviceOutput};
use crate::sim::calendar::TimeContext;
use crate::sim::types::DerKind;

/// Hourly probability that the vehicle is plugged in on a weekday.
const WEEKDAY_CONNECTION: [f64; 24] = [
    0.85, 0.90, 0.90, 0.90, 0.80, 0.70, // overnight, at home
    0.50, 0.30, 0.20, 0.30, 0.35, 0.35, // commute and morning
    0.30, 0.30, 0.35, 0.35, 0.30, 0.25, // workplace and errands
    0.30, 0.45, 0.60, 0.75, 0.80, 0.85, // back home
];

/// Weekend overrides: more daytime home charging.
const WEEKEND_CONNECTION: [(u32, f64); 8] = [
    (9, 0.40),
    (10, 0.45),
    (11, 0.45),
    (12, 0.40),
    (13, 0.40),
    (14, 0.45),
    (15, 0.45),
    (16, 0.40),
];

/// Minimum time between connection re-evaluations.
pub const DWELL_MINUTES: i64 = 20;
/// Vehicle pack size in kWh.
pub const PACK_KWH: f64 = 60.0;
/// V2G stops below this SOC so the vehicle keeps range.
pub const V2G_SOC_FLOOR: f64 = 20.0;
/// SOC range a vehicle arrives with.
const ARRIVAL_SOC_MIN: f64 = 40.0;
const ARRIVAL_SOC_MAX: f64 = 90.0;

/// Returns the probability that the vehicle is plugged in at this time.
pub fn connection_probability(time: &TimeContext) -> f64 {
    if time.is_weekend {
        if let Some(&(_, p)) = WEEKEND_CONNECTION.iter().find(|(h, _)| *h == time.hour) {
            return p;
        }
    }
    WEEKDAY_CONNECTION[time.hour as usize % 24]
}

/// Morning (07–09) and evening (17–20) demand peaks, inclusive hours.
pub fn is_peak_hour(time: &TimeContext) -> bool {
    matches!(time.hour, 7..=9 | 17..=20)
}

#[derive(Debug, Clone)]
struct EvSession {
    connected_at: DateTime<Utc>,
    v2g_draw: f64,
}

/// A V2G-capable electric vehicle that plugs in and out over the day.
///
/// Connection is re-sampled from the hourly probability tables only when the
/// current dwell period expires, so the vehicle does not flicker between
/// states. While connected it discharges a per-session share of capacity back
/// to the grid; while disconnected it reports zero output and its SOC is left
/// untouched.
///
/// # Power Convention
/// Returns **positive** values while discharging to the grid.
#[derive(Debug, Clone)]
pub struct ElectricVehicle {
    /// Charger/inverter capacity in kilowatts.
    pub capacity_kw: f64,

    /// Vehicle state of charge in percent.
    pub soc: f64,

    session: Option<EvSession>,
    next_evaluation: Option<DateTime<Utc>>,
}

impl ElectricVehicle {
    /// Creates a disconnected vehicle with the given SOC.
    ///
    /// # Panics
    ///
    /// Panics if `capacity_kw` is not positive.
    pub fn new(capacity_kw: f64, soc: f64) -> Self {
        assert!(capacity_kw > 0.0, "EV capacity must be > 0");
        Self {
            capacity_kw,
            soc: soc.clamp(0.0, 100.0),
            session: None,
            next_evaluation: None,
        }
    }

    /// Whether a session is active.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Start of the active session.
    pub fn connection_start_at(&self) -> Option<DateTime<Utc>> {
        self.session.as_ref().map(|s| s.connected_at)
    }

    fn evaluate_connection(&mut self, now: DateTime<Utc>, time: &TimeContext, rng: &mut StdRng) {
        if self.next_evaluation.is_some_and(|t| now < t) {
            return;
        }
        self.next_evaluation = Some(now + TimeDelta::minutes(DWELL_MINUTES));

        let connected = rng.random_bool(connection_probability(time));
        match (connected, self.session.is_some()) {
            (true, false) => {
                self.soc = rng.random_range(ARRIVAL_SOC_MIN..=ARRIVAL_SOC_MAX);
                self.session = Some(EvSession {
                    connected_at: now,
                    v2g_draw: rng.random(),
                });
                tracing::debug!(soc = self.soc, "EV connected");
            }
            (false, true) => {
                self.session = None;
                tracing::debug!(soc = self.soc, "EV disconnected");
            }
            _ => {}
        }
    }
}

impl Device for ElectricVehicle {
    fn step(&mut self, context: &DeviceContext<'_>, rng: &mut StdRng) -> DeviceOutput {
        self.evaluate_connection(context.now, context.time, rng);

        let Some(session) = &self.session else {
            return DeviceOutput {
                output_kw: 0.0,
                soc_pct: Some(self.soc),
                is_online: false,
                connection_start_at: None,
            };
        };

        let share = if is_peak_hour(context.time) {
            0.15 + session.v2g_draw * 0.10
        } else {
            0.05 + session.v2g_draw * 0.05
        };
        let requested_kw = self.capacity_kw * share;

        let output_kw = if context.dt_hours > 0.0 {
            let max_kw = (self.soc - V2G_SOC_FLOOR).max(0.0) / 100.0 * PACK_KWH / context.dt_hours;
            requested_kw.min(max_kw)
        } else {
            0.0
        };
        self.soc = (self.soc - output_kw * context.dt_hours / PACK_KWH * 100.0).clamp(0.0, 100.0);

        DeviceOutput {
            output_kw,
            soc_pct: Some(self.soc),
            is_online: true,
            connection_start_at: Some(session.connected_at),
        }
    }

    fn device_type(&self) -> DerKind {
        DerKind::Ev
    }
}
