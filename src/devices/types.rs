//! Common types and traits for DER device models.

use chrono::{DateTime, Utc};
use rand::{Rng, rngs::StdRng};

use crate::sim::calendar::TimeContext;
use crate::sim::types::DerKind;
use crate::sim::weather::WeatherState;

/// Contextual information passed to devices for one tick.
///
/// # Fields
/// * `now` - Timestamp of the tick
/// * `time` - Local calendar features of `now`
/// * `weather` - Cloud cover state after this tick's weather update
/// * `dt_hours` - Time elapsed since the previous tick, in hours
pub struct DeviceContext<'a> {
    pub now: DateTime<Utc>,
    pub time: &'a TimeContext,
    pub weather: &'a WeatherState,
    pub dt_hours: f64,
}

/// What a device reports for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceOutput {
    /// Instantaneous output in kW. Positive = supplying power, negative = drawing.
    pub output_kw: f64,
    /// State of charge in percent, for devices that have one.
    pub soc_pct: Option<f64>,
    /// Whether the device is connected and reporting.
    pub is_online: bool,
    /// Start of the current connection session, for devices that plug in.
    pub connection_start_at: Option<DateTime<Utc>>,
}

impl DeviceOutput {
    /// An always-connected device without state of charge.
    pub fn online(output_kw: f64) -> Self {
        Self {
            output_kw,
            soc_pct: None,
            is_online: true,
            connection_start_at: None,
        }
    }
}

/// Trait defining a DER model that advances once per tick.
///
/// Devices own their persistent state (state of charge, connection session);
/// the SOC/session update and the returned output are produced together, so a
/// caller never observes one without the other.
pub trait Device {
    /// Advances the device by one tick and returns what it reports.
    ///
    /// # Arguments
    ///
    /// * `context` - Time, weather and tick length for this step
    /// * `rng` - Seeded random source owned by the simulator
    fn step(&mut self, context: &DeviceContext<'_>, rng: &mut StdRng) -> DeviceOutput;

    /// Returns the resource kind this model simulates.
    fn device_type(&self) -> DerKind;
}

/// Utility function to generate Gaussian noise using Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// Random value from a Gaussian distribution with mean 0 and specified standard deviation
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Clamps a computed power value into `[min_kw, max_kw]`.
///
/// Model formulas are total over their inputs, so a non-finite or out-of-range
/// value here is a defect. It is logged and replaced rather than allowed to
/// stop the tick loop.
pub fn sanitize_kw(value: f64, min_kw: f64, max_kw: f64, label: &str) -> f64 {
    if !value.is_finite() {
        tracing::warn!(label, value, "non-finite model output replaced with 0");
        return 0.0_f64.clamp(min_kw, max_kw);
    }
    if value < min_kw || value > max_kw {
        tracing::warn!(label, value, min_kw, max_kw, "model output out of range, clamping");
        return value.clamp(min_kw, max_kw);
    }
    value
}
