//! Command-line interface.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

use crate::config::{ConfigError, ScenarioConfig};

/// Preset used when neither `--scenario` nor `--preset` is given.
pub const DEFAULT_PRESET: &str = "new_brunswick";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "der-telemetry-sim",
    version,
    about = "Synthetic DER telemetry for New Brunswick sites"
)]
pub struct Cli {
    /// Enable contract violation mode.
    #[arg(long)]
    pub violation: bool,

    /// DER output divisor in violation mode (default 1.5).
    #[arg(long, value_name = "F64")]
    pub multiplier: Option<f64>,

    /// Stop after this many ticks; 0 runs until interrupted.
    #[arg(long, value_name = "N")]
    pub max_messages: Option<u64>,

    /// Load the scenario from a TOML file.
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Use a built-in scenario (new_brunswick, single_solar).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Override the random seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run on simulated time starting at this RFC 3339 instant.
    #[arg(long, value_name = "RFC3339")]
    pub start_time: Option<DateTime<Utc>>,

    /// Also append every reading to this CSV file.
    #[arg(long, value_name = "PATH")]
    pub telemetry_out: Option<PathBuf>,
}

impl Cli {
    /// Loads the scenario named by `--scenario`/`--preset` and applies the
    /// remaining flags on top.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file or preset cannot be loaded.
    pub fn load_scenario(&self) -> Result<ScenarioConfig, ConfigError> {
        let mut config = match (&self.scenario, &self.preset) {
            (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
            (None, Some(name)) => ScenarioConfig::from_preset(name)?,
            (None, None) => ScenarioConfig::from_preset(DEFAULT_PRESET)?,
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Command-line flags win over file and preset values.
    pub fn apply_overrides(&self, config: &mut ScenarioConfig) {
        if self.violation {
            config.violation.enabled = true;
        }
        if let Some(multiplier) = self.multiplier {
            config.violation.multiplier = multiplier;
        }
        if let Some(max) = self.max_messages {
            config.simulation.max_messages = max;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(start) = self.start_time {
            config.simulation.start_time = Some(start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("der-telemetry-sim").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_to_new_brunswick_preset() {
        let cli = parse(&[]).expect("no args parse");
        let config = cli.load_scenario().expect("default preset loads");
        assert_eq!(config.profiles().len(), 7);
        assert!(!config.violation.enabled);
        assert_eq!(config.violation.multiplier, 1.5);
        assert_eq!(config.simulation.max_messages, 0);
    }

    #[test]
    fn violation_flags_override_preset() {
        let cli = parse(&[
            "--preset",
            "single_solar",
            "--violation",
            "--multiplier=3.0",
            "--max-messages=5",
            "--seed",
            "9",
        ])
        .expect("flags parse");
        let config = cli.load_scenario().expect("preset loads");
        assert!(config.violation.enabled);
        assert_eq!(config.violation.multiplier, 3.0);
        assert_eq!(config.simulation.max_messages, 5);
        assert_eq!(config.simulation.seed, 9);
        assert_eq!(config.profiles().len(), 1);
    }

    #[test]
    fn start_time_parses_rfc3339() {
        let cli = parse(&["--start-time", "2025-03-12T16:00:00Z"]).expect("parse");
        let config = cli.load_scenario().expect("loads");
        assert!(config.simulation.start_time.is_some());
    }

    #[test]
    fn scenario_and_preset_conflict() {
        assert!(parse(&["--scenario", "a.toml", "--preset", "single_solar"]).is_err());
    }

    #[test]
    fn malformed_values_rejected() {
        assert!(parse(&["--multiplier", "lots"]).is_err());
        assert!(parse(&["--max-messages", "-1"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
    }

    #[test]
    fn unknown_preset_is_config_error() {
        let cli = parse(&["--preset", "atlantis"]).expect("parse");
        let err = cli.load_scenario().expect_err("unknown preset");
        assert_eq!(err.field, "preset");
    }
}
