use std::f64::consts::FRAC_PI_2;

use rand::{Rng, rngs::StdRng};

use crate::devices::types::{Device, DeviceContext, DeviceOutput};
use crate::sim::calendar::TimeContext;
use crate::sim::types::DerKind;

/// Local hour at which the time-of-day curve peaks (12:30).
pub const PEAK_HOUR: f64 = 12.5;
/// Fraction of capacity reached at the peak under optimal conditions.
pub const PEAK_FACTOR: f64 = 0.75;
/// Fixed March derating against summer potential.
pub const SEASONAL_FACTOR: f64 = 0.60;
/// Half-width of the uniform per-reading jitter.
const JITTER: f64 = 0.03;

/// A rooftop or commercial solar array.
///
/// `SolarPv` follows a bell-shaped time-of-day curve between the region's
/// sunrise and sunset, derated for March, scaled by the simulator's cloud
/// factor and a small fresh jitter on every reading.
///
/// # Power Convention
/// Returns **positive** values during daylight (generation offsets grid draw)
/// and exactly `0.0` outside the daylight window.
#[derive(Debug, Clone)]
pub struct SolarPv {
    /// Nameplate capacity in kilowatts.
    pub capacity_kw: f64,
}

impl SolarPv {
    /// Creates a new solar array.
    ///
    /// # Panics
    ///
    /// Panics if `capacity_kw` is not positive.
    pub fn new(capacity_kw: f64) -> Self {
        assert!(capacity_kw > 0.0, "solar capacity must be > 0");
        Self { capacity_kw }
    }
}

/// Bell-shaped share of capacity available at this time of day.
///
/// Two quarter-sine flanks meet at [`PEAK_HOUR`] with value [`PEAK_FACTOR`]
/// and fall to zero at sunrise and sunset. Outside daylight the factor is 0.
pub fn time_of_day_factor(time: &TimeContext) -> f64 {
    if !time.is_daylight {
        return 0.0;
    }
    let h = time.hour_of_day;
    let phase = if h <= PEAK_HOUR {
        (h - time.sunrise) / (PEAK_HOUR - time.sunrise)
    } else {
        (time.sunset - h) / (time.sunset - PEAK_HOUR)
    };
    let s = (FRAC_PI_2 * phase.clamp(0.0, 1.0)).sin();
    PEAK_FACTOR * s * s
}

impl Device for SolarPv {
    fn step(&mut self, context: &DeviceContext<'_>, rng: &mut StdRng) -> DeviceOutput {
        let frac = time_of_day_factor(context.time);
        if frac <= 0.0 {
            return DeviceOutput::online(0.0);
        }

        let jitter = rng.random_range((1.0 - JITTER)..=(1.0 + JITTER));
        let kw = self.capacity_kw
            * frac
            * SEASONAL_FACTOR
            * context.weather.cloud_factor()
            * jitter;

        DeviceOutput::online(kw.clamp(0.0, self.capacity_kw))
    }

    fn device_type(&self) -> DerKind {
        DerKind::Solar
    }
}
