use chrono::{DateTime, TimeDelta, Utc};

/// Source of tick timestamps.
///
/// `Wall` stamps every tick with the current time. `Simulated` starts at a
/// fixed instant and advances by a fixed step per tick, so runs are
/// reproducible.
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use der_telemetry_sim::sim::clock::Clock;
///
/// let start = Utc.with_ymd_and_hms(2025, 3, 12, 16, 0, 0).unwrap();
/// let mut clock = Clock::simulated(start, TimeDelta::seconds(1));
///
/// assert_eq!(clock.tick(), start);
/// assert_eq!(clock.tick(), start + TimeDelta::seconds(1));
/// ```
#[derive(Debug, Clone)]
pub enum Clock {
    /// Real time.
    Wall,
    /// Deterministic time.
    Simulated {
        /// Timestamp returned by the next tick.
        next: DateTime<Utc>,
        /// Advance per tick.
        step: TimeDelta,
    },
}

impl Clock {
    /// Creates a simulated clock starting at `start`.
    pub fn simulated(start: DateTime<Utc>, step: TimeDelta) -> Self {
        Clock::Simulated { next: start, step }
    }

    /// Returns the timestamp of the current tick and advances the clock.
    pub fn tick(&mut self) -> DateTime<Utc> {
        match self {
            Clock::Wall => Utc::now(),
            Clock::Simulated { next, step } => {
                let now = *next;
                *next = now + *step;
                now
            }
        }
    }

    /// Returns what the next tick would report, without advancing.
    pub fn peek(&self) -> DateTime<Utc> {
        match self {
            Clock::Wall => Utc::now(),
            Clock::Simulated { next, .. } => *next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 16, 0, 0).single().expect("valid timestamp")
    }

    #[test]
    fn test_simulated_advances_by_step() {
        let mut clock = Clock::simulated(start(), TimeDelta::milliseconds(500));
        assert_eq!(clock.tick(), start());
        assert_eq!(clock.tick(), start() + TimeDelta::milliseconds(500));
        assert_eq!(clock.peek(), start() + TimeDelta::seconds(1));
    }

    #[test]
    fn test_peek_does_not_advance() {
        let clock = Clock::simulated(start(), TimeDelta::seconds(1));
        assert_eq!(clock.peek(), start());
        assert_eq!(clock.peek(), start());
    }

    #[test]
    fn test_wall_is_monotone_enough() {
        let mut clock = Clock::Wall;
        let a = clock.tick();
        let b = clock.tick();
        assert!(b >= a);
    }
}
