//! Synthetic telemetry for distributed energy resources in New Brunswick.

pub mod cli;
pub mod config;
pub mod devices;
pub mod error;
pub mod io;
pub mod publish;
pub mod runner;
/// Time, weather, consumption, metering and the tick loop.
pub mod sim;
pub mod telemetry;
