//! Slow-varying cloud cover shared by the solar model of one simulator.

use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, rngs::StdRng};

use crate::devices::types::gaussian_noise;

/// Mean of the cloud factor distribution.
const CLOUD_MEAN: f64 = 1.0;
/// Standard deviation of the cloud factor distribution.
const CLOUD_STD: f64 = 0.2;
/// Heaviest overcast the model allows.
pub const CLOUD_MIN: f64 = 0.6;
/// Brightest conditions the model allows (cloud-edge enhancement).
pub const CLOUD_MAX: f64 = 1.4;
/// Seconds over which a new draw is blended in.
const TRANSITION_SECS: f64 = 180.0;
/// Range of seconds until the next draw.
const UPDATE_SECS_MIN: i64 = 5 * 60;
const UPDATE_SECS_MAX: i64 = 15 * 60;

/// Cloud cover multiplier that changes every 5–15 minutes.
///
/// A new target is drawn from `N(1.0, 0.2)` clamped to
/// \[[`CLOUD_MIN`], [`CLOUD_MAX`]\]; the visible factor then moves linearly from
/// its previous value to the target over three minutes instead of stepping.
#[derive(Debug, Clone)]
pub struct WeatherState {
    cloud_factor: f64,
    from_factor: f64,
    target_factor: f64,
    transition_started: DateTime<Utc>,
    next_update: DateTime<Utc>,
}

impl WeatherState {
    /// Creates a weather state with an initial draw applied directly.
    pub fn new(now: DateTime<Utc>, rng: &mut StdRng) -> Self {
        let factor = draw_cloud_factor(rng);
        Self {
            cloud_factor: factor,
            from_factor: factor,
            target_factor: factor,
            transition_started: now,
            next_update: now + next_update_delay(rng),
        }
    }

    /// Creates a weather state pinned at `factor` until the next scheduled draw.
    ///
    /// The factor is clamped to the allowed range.
    pub fn with_factor(factor: f64, now: DateTime<Utc>) -> Self {
        let factor = factor.clamp(CLOUD_MIN, CLOUD_MAX);
        Self {
            cloud_factor: factor,
            from_factor: factor,
            target_factor: factor,
            transition_started: now,
            next_update: now + TimeDelta::seconds(UPDATE_SECS_MAX),
        }
    }

    /// Advances the weather to `now`, drawing a new target when one is due.
    pub fn update(&mut self, now: DateTime<Utc>, rng: &mut StdRng) {
        if now >= self.next_update {
            self.from_factor = self.cloud_factor;
            self.target_factor = draw_cloud_factor(rng);
            self.transition_started = now;
            self.next_update = now + next_update_delay(rng);
        }

        let elapsed = (now - self.transition_started).num_milliseconds() as f64 / 1000.0;
        let progress = (elapsed / TRANSITION_SECS).clamp(0.0, 1.0);
        self.cloud_factor = self.from_factor + (self.target_factor - self.from_factor) * progress;
    }

    /// Current cloud multiplier applied to solar output.
    pub fn cloud_factor(&self) -> f64 {
        self.cloud_factor
    }

    /// Target the factor is currently moving toward.
    pub fn target_factor(&self) -> f64 {
        self.target_factor
    }

    /// When the next target will be drawn.
    pub fn next_update(&self) -> DateTime<Utc> {
        self.next_update
    }
}

fn draw_cloud_factor(rng: &mut StdRng) -> f64 {
    (CLOUD_MEAN + gaussian_noise(rng, CLOUD_STD)).clamp(CLOUD_MIN, CLOUD_MAX)
}

fn next_update_delay(rng: &mut StdRng) -> TimeDelta {
    TimeDelta::seconds(rng.random_range(UPDATE_SECS_MIN..=UPDATE_SECS_MAX))
}
