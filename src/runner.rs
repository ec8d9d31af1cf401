//! Wires a validated scenario into a ready-to-run orchestrator.

use std::time::Duration;

use chrono::TimeDelta;

use crate::config::{MAX_TICK_INTERVAL_MS, ScenarioConfig};
use crate::error::SimError;
use crate::publish::Publisher;
use crate::sim::clock::Clock;
use crate::sim::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::sim::simulator::DerSimulator;

/// Picks the clock: simulated from `start_time` when set, wall time otherwise.
///
/// The simulated step is capped at [`MAX_TICK_INTERVAL_MS`], the largest
/// interval validation accepts.
pub fn clock_for(config: &ScenarioConfig) -> Clock {
    match config.simulation.start_time {
        Some(start) => {
            let step_ms = config.simulation.tick_interval_ms.min(MAX_TICK_INTERVAL_MS);
            Clock::simulated(start, TimeDelta::milliseconds(step_ms as i64))
        }
        None => Clock::Wall,
    }
}

/// Validates `config` and builds one simulator per DER behind an orchestrator.
///
/// # Errors
///
/// Returns `SimError::Config` with every validation problem found.
pub fn build_orchestrator<P: Publisher>(
    config: &ScenarioConfig,
    publisher: P,
) -> Result<Orchestrator<P>, SimError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(SimError::Config(errors));
    }

    let clock = clock_for(config);
    let start = clock.peek();
    let violation = config.violation.mode();
    let seed = config.simulation.seed;

    let simulators: Vec<DerSimulator> = config
        .profiles()
        .into_iter()
        .map(|profile| {
            tracing::info!(
                der_id = %profile.der_id,
                kind = %profile.kind,
                region = %profile.region,
                capacity_kw = profile.nameplate_capacity_kw,
                project_id = %profile.project_id,
                "configured DER"
            );
            DerSimulator::new(profile, violation, seed, start)
        })
        .collect();

    if violation.enabled {
        tracing::warn!(multiplier = violation.multiplier, "contract violation mode enabled");
    }

    let orchestrator_config = OrchestratorConfig {
        tick_interval: Duration::from_millis(config.simulation.tick_interval_ms),
        max_messages: config.simulation.max_messages,
        topic_prefix: config.simulation.topic_prefix.clone(),
    };

    Ok(Orchestrator::new(orchestrator_config, simulators, publisher, clock))
}
