//! DER models: solar arrays, battery storage and V2G electric vehicles.

/// Stationary battery storage model.
pub mod battery;
/// V2G electric vehicle model.
pub mod ev;
/// Solar photovoltaic generation model.
pub mod solar;
pub mod types;

use rand::rngs::StdRng;

pub use battery::Battery;
pub use ev::ElectricVehicle;
pub use solar::SolarPv;
pub use types::{Device, DeviceContext, DeviceOutput};

use crate::sim::calendar::TimeContext;
use crate::sim::types::{DerKind, DerProfile};

/// SOC an EV reports before its first session.
const EV_INITIAL_SOC: f64 = 60.0;

/// The device model behind one DER, selected by its kind.
#[derive(Debug, Clone)]
pub enum DerDevice {
    Solar(SolarPv),
    Battery(Battery),
    Ev(ElectricVehicle),
}

impl DerDevice {
    /// Builds the model for `profile`, seeding battery SOC from the start time.
    pub fn for_profile(profile: &DerProfile, start: &TimeContext) -> Self {
        let capacity = profile.nameplate_capacity_kw;
        match profile.kind {
            DerKind::Solar => DerDevice::Solar(SolarPv::new(capacity)),
            DerKind::BatteryStorage => {
                let soc = battery::initial_soc(start, profile.id_seed());
                DerDevice::Battery(Battery::new(capacity, soc, profile.is_standalone))
            }
            DerKind::Ev => DerDevice::Ev(ElectricVehicle::new(capacity, EV_INITIAL_SOC)),
        }
    }
}

impl Device for DerDevice {
    fn step(&mut self, context: &DeviceContext<'_>, rng: &mut StdRng) -> DeviceOutput {
        match self {
            DerDevice::Solar(d) => d.step(context, rng),
            DerDevice::Battery(d) => d.step(context, rng),
            DerDevice::Ev(d) => d.step(context, rng),
        }
    }

    fn device_type(&self) -> DerKind {
        match self {
            DerDevice::Solar(d) => d.device_type(),
            DerDevice::Battery(d) => d.device_type(),
            DerDevice::Ev(d) => d.device_type(),
        }
    }
}
