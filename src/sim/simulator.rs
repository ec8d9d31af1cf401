//! One DER with all of its mutable state.

use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng};

use crate::devices::types::sanitize_kw;
use crate::devices::{DerDevice, Device, DeviceContext};
use crate::telemetry::{Measurement, Reading};

use super::calendar::TimeContext;
use super::consumption::ConsumptionState;
use super::contract::{ContractEvaluator, ContractSample, ContractStatus};
use super::power_meter::{self, ViolationMode};
use super::types::DerProfile;
use super::weather::WeatherState;

/// Tick length assumed before the first tick, in hours (one second).
const DEFAULT_DT_HOURS: f64 = 1.0 / 3600.0;

/// Simulates one DER: weather, consumption, device model, meter and contract.
///
/// Owns every piece of state it touches, including its random source, so
/// simulators never share anything and a fixed seed reproduces a run.
#[derive(Debug, Clone)]
pub struct DerSimulator {
    profile: DerProfile,
    violation: ViolationMode,
    rng: StdRng,
    weather: WeatherState,
    consumption: ConsumptionState,
    device: DerDevice,
    contract: ContractEvaluator,
    last_tick: Option<DateTime<Utc>>,
}

impl DerSimulator {
    /// Creates a simulator whose random stream is `seed` offset by the DER id.
    pub fn new(profile: DerProfile, violation: ViolationMode, seed: u64, now: DateTime<Utc>) -> Self {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(profile.id_seed()));
        let weather = WeatherState::new(now, &mut rng);
        let consumption = ConsumptionState::new(now);
        let device = DerDevice::for_profile(&profile, &TimeContext::new(now, profile.region));
        let contract = ContractEvaluator::new(profile.baseline_kw, profile.contract_threshold_kw);

        Self {
            profile,
            violation,
            rng,
            weather,
            consumption,
            device,
            contract,
            last_tick: None,
        }
    }

    /// Advances every model to `now` and returns this tick's reading.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Reading {
        let dt_hours = match self.last_tick {
            Some(prev) if now > prev => (now - prev).num_milliseconds() as f64 / 3_600_000.0,
            Some(_) => 0.0,
            None => DEFAULT_DT_HOURS,
        };
        self.last_tick = Some(now);

        let time = TimeContext::new(now, self.profile.region);
        self.weather.update(now, &mut self.rng);
        self.consumption.update(now, &mut self.rng);

        let context = DeviceContext {
            now,
            time: &time,
            weather: &self.weather,
            dt_hours,
        };
        let output = self.device.step(&context, &mut self.rng);

        let capacity = self.profile.nameplate_capacity_kw;
        let output_kw = sanitize_kw(output.output_kw, -capacity, capacity, "der_output");
        let meter_kw = power_meter::reading(
            &self.profile,
            &time,
            &self.consumption,
            output_kw,
            self.violation,
        );
        let meter_kw = sanitize_kw(meter_kw, 0.0, f64::MAX, "power_meter");

        let was_violated = self.contract.status().violated;
        let status = self.contract.record(ContractSample {
            timestamp: now,
            meter_kw,
            der_kw: output_kw,
        });
        if status.violated && !was_violated {
            tracing::warn!(
                der_id = %self.profile.der_id,
                reduction_kw = status.reduction_kw,
                threshold_kw = status.threshold_kw,
                "contract violation"
            );
        } else if was_violated && !status.violated {
            tracing::info!(
                der_id = %self.profile.der_id,
                reduction_kw = status.reduction_kw,
                "contract back in compliance"
            );
        }

        Reading::new(
            &self.profile,
            Measurement {
                timestamp: now,
                is_online: output.is_online,
                output_kw,
                meter_kw,
                soc_pct: output.soc_pct,
                connection_start_at: output.connection_start_at,
            },
        )
    }

    pub fn profile(&self) -> &DerProfile {
        &self.profile
    }

    /// Contract status as of the last tick.
    pub fn contract_status(&self) -> ContractStatus {
        self.contract.status()
    }

    pub fn contract(&self) -> &ContractEvaluator {
        &self.contract
    }

    pub fn weather(&self) -> &WeatherState {
        &self.weather
    }

    /// Mutable consumption state, for pinning events in tests and replays.
    pub fn consumption_mut(&mut self) -> &mut ConsumptionState {
        &mut self.consumption
    }

    pub fn device(&self) -> &DerDevice {
        &self.device
    }
}
