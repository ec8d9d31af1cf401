//! Household consumption drift and appliance events.

use chrono::{DateTime, TimeDelta, Utc};
use rand::{Rng, rngs::StdRng};

/// Trend targets are drawn from this range (±8 %).
const TREND_MIN: f64 = 0.92;
const TREND_MAX: f64 = 1.08;
/// Fraction of the distance to a new target covered at each trend change.
const TREND_STEP: f64 = 0.3;
/// Minutes between trend changes.
const TREND_MINUTES_MIN: i64 = 10;
const TREND_MINUTES_MAX: i64 = 30;
/// Seconds between checks for a new appliance event.
const EVENT_CHECK_SECS: i64 = 30;
/// Probability that a check starts a new event.
const EVENT_PROBABILITY: f64 = 0.15;
/// Event duration range in seconds.
const EVENT_SECS_MIN: i64 = 60;
const EVENT_SECS_MAX: i64 = 300;

/// Size class of an appliance event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMagnitude {
    /// Small appliance, 1.1–1.3× load. 70 % of events.
    Small,
    /// Dryer, oven and similar, 1.4–1.8×. 25 % of events.
    Medium,
    /// Several large loads at once, 1.8–2.5×. 5 % of events.
    Large,
}

impl EventMagnitude {
    /// Multiplier range for this class.
    pub fn multiplier_range(&self) -> (f64, f64) {
        match self {
            EventMagnitude::Small => (1.1, 1.3),
            EventMagnitude::Medium => (1.4, 1.8),
            EventMagnitude::Large => (1.8, 2.5),
        }
    }
}

/// An appliance event currently raising consumption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplianceEvent {
    pub magnitude: EventMagnitude,
    pub multiplier: f64,
    pub remaining: TimeDelta,
}

impl ApplianceEvent {
    fn sample(rng: &mut StdRng) -> Self {
        let r: f64 = rng.random();
        let magnitude = if r < 0.7 {
            EventMagnitude::Small
        } else if r < 0.95 {
            EventMagnitude::Medium
        } else {
            EventMagnitude::Large
        };
        let (lo, hi) = magnitude.multiplier_range();
        Self {
            magnitude,
            multiplier: rng.random_range(lo..=hi),
            remaining: TimeDelta::seconds(rng.random_range(EVENT_SECS_MIN..=EVENT_SECS_MAX)),
        }
    }
}

/// Slow consumption trend plus at most one active appliance event.
#[derive(Debug, Clone)]
pub struct ConsumptionState {
    trend: f64,
    next_trend_change: DateTime<Utc>,
    event: Option<ApplianceEvent>,
    next_event_check: DateTime<Utc>,
    last_update: DateTime<Utc>,
}

impl ConsumptionState {
    /// Creates a neutral state: trend 1.0, no event, first trend change due at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            trend: 1.0,
            next_trend_change: now,
            event: None,
            next_event_check: now + TimeDelta::seconds(EVENT_CHECK_SECS),
            last_update: now,
        }
    }

    /// Advances the state to `now`.
    ///
    /// The active event loses the elapsed time and clears once its remaining
    /// duration reaches zero. The trend moves 30 % toward a fresh target every
    /// 10–30 minutes. Every 30 seconds an idle state may start a new event.
    pub fn update(&mut self, now: DateTime<Utc>, rng: &mut StdRng) {
        let elapsed = (now - self.last_update).max(TimeDelta::zero());
        self.last_update = now;

        if let Some(event) = &mut self.event {
            event.remaining = event.remaining - elapsed;
            if event.remaining <= TimeDelta::zero() {
                self.event = None;
            }
        }

        if now >= self.next_trend_change {
            let target = rng.random_range(TREND_MIN..=TREND_MAX);
            self.trend = self.trend * (1.0 - TREND_STEP) + target * TREND_STEP;
            let minutes = rng.random_range(TREND_MINUTES_MIN..=TREND_MINUTES_MAX);
            self.next_trend_change = now + TimeDelta::minutes(minutes);
        }

        if now >= self.next_event_check {
            self.next_event_check = now + TimeDelta::seconds(EVENT_CHECK_SECS);
            if self.event.is_none() && rng.random_bool(EVENT_PROBABILITY) {
                let event = ApplianceEvent::sample(rng);
                tracing::debug!(
                    magnitude = ?event.magnitude,
                    multiplier = event.multiplier,
                    secs = event.remaining.num_seconds(),
                    "appliance event started"
                );
                self.event = Some(event);
            }
        }
    }

    /// Slow-varying consumption multiplier.
    pub fn trend(&self) -> f64 {
        self.trend
    }

    /// The active appliance event, if any.
    pub fn active_event(&self) -> Option<&ApplianceEvent> {
        self.event.as_ref()
    }

    /// Multiplier of the active event, or `1.0` when idle.
    pub fn event_multiplier(&self) -> f64 {
        self.event.map_or(1.0, |e| e.multiplier)
    }

    /// Replaces the active event. Used to pin consumption in tests and replays.
    pub fn set_event(&mut self, event: Option<ApplianceEvent>) {
        self.event = event;
    }
}
