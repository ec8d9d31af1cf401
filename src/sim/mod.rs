/// Local calendar features of a timestamp.
pub mod calendar;
/// Tick timestamp source.
pub mod clock;
pub mod consumption;
pub mod contract;
pub mod orchestrator;
pub mod power_meter;
pub mod simulator;
pub mod types;
pub mod weather;
