//! TOML-based scenario configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::sim::power_meter::ViolationMode;
use crate::sim::types::{DerKind, DerProfile, Region};

/// Utility every bundled site reports under.
const DEFAULT_UTILITY_ID: &str = "utility1234";

/// Maximum DERs behind one site controller.
pub const MAX_DERS_PER_SITE: usize = 5;

/// Longest accepted tick interval: one hour.
pub const MAX_TICK_INTERVAL_MS: u64 = 3_600_000;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the `new_brunswick` preset. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::new_brunswick`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Tick timing, seed and publishing.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Contract violation mode.
    #[serde(default)]
    pub violation: ViolationConfig,
    /// Sites (projects) and their DERs.
    #[serde(default = "new_brunswick_sites")]
    pub sites: Vec<SiteConfig>,
}

/// Tick timing, seed and publishing parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed.
    pub seed: u64,
    /// Milliseconds between ticks (must be > 0).
    pub tick_interval_ms: u64,
    /// Ticks to run before stopping; `0` runs until interrupted.
    pub max_messages: u64,
    /// Readings go to `{topic_prefix}/{project_id}`.
    pub topic_prefix: String,
    /// Start of simulated time (RFC 3339 string). Wall-clock time when absent.
    pub start_time: Option<DateTime<Utc>>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_interval_ms: 1000,
            max_messages: 0,
            topic_prefix: "projects".to_string(),
            start_time: None,
        }
    }
}

/// Contract violation mode parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViolationConfig {
    /// Suppress DER effectiveness in meter readings.
    pub enabled: bool,
    /// DER output divisor while enabled (>= 1).
    pub multiplier: f64,
}

impl Default for ViolationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            multiplier: 1.5,
        }
    }
}

impl ViolationConfig {
    /// Mode the meter model applies.
    pub fn mode(&self) -> ViolationMode {
        if self.enabled {
            ViolationMode::with_multiplier(self.multiplier)
        } else {
            ViolationMode::OFF
        }
    }
}

/// One site controller: a project with a contract and its DERs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Project identifier; selects the publish topic.
    pub project_id: String,
    /// Utility identifier.
    #[serde(default = "default_utility_id")]
    pub utility_id: String,
    /// Service region.
    pub region: Region,
    /// Contract baseline consumption (kW, > 0).
    pub baseline_kw: f64,
    /// Minimum required reduction (kW, >= 0).
    pub contract_threshold_kw: f64,
    /// DERs behind this controller (1–5).
    #[serde(default)]
    pub ders: Vec<DerConfig>,
}

/// One DER entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerConfig {
    /// Identifier, unique across the scenario.
    pub der_id: String,
    /// `"solar"`, `"battery_storage"` or `"ev"`.
    #[serde(rename = "type")]
    pub kind: DerKind,
    /// Nameplate capacity (kW, > 0).
    pub nameplate_capacity_kw: f64,
    /// Runs without co-located solar.
    #[serde(default)]
    pub is_standalone: bool,
}

fn default_utility_id() -> String {
    DEFAULT_UTILITY_ID.to_string()
}

fn der(der_id: &str, kind: DerKind, nameplate_capacity_kw: f64) -> DerConfig {
    DerConfig {
        der_id: der_id.to_string(),
        kind,
        nameplate_capacity_kw,
        is_standalone: false,
    }
}

/// The three New Brunswick sites: Fredericton, Saint John and Moncton.
fn new_brunswick_sites() -> Vec<SiteConfig> {
    vec![
        SiteConfig {
            project_id: "492e323a-b7c5-48ff-bcf7-36ffd170f409".to_string(),
            utility_id: default_utility_id(),
            region: Region::Fredericton,
            baseline_kw: 18.0,
            contract_threshold_kw: 15.0,
            ders: vec![
                der("11", DerKind::BatteryStorage, 10.0),
                der("12", DerKind::Solar, 8.0),
                DerConfig {
                    is_standalone: true,
                    ..der("13", DerKind::BatteryStorage, 5.0)
                },
            ],
        },
        SiteConfig {
            project_id: "0b2a26cc-3573-40d6-a685-a025920bc700".to_string(),
            utility_id: default_utility_id(),
            region: Region::SaintJohn,
            baseline_kw: 35.0,
            contract_threshold_kw: 29.0,
            ders: vec![
                der("14", DerKind::BatteryStorage, 20.0),
                der("15", DerKind::Solar, 15.0),
            ],
        },
        SiteConfig {
            project_id: "8b434748-ff61-4e0f-9f24-654c3abf81fb".to_string(),
            utility_id: default_utility_id(),
            region: Region::Moncton,
            baseline_kw: 22.0,
            contract_threshold_kw: 18.0,
            ders: vec![der("16", DerKind::Solar, 10.0), der("17", DerKind::Ev, 11.0)],
        },
    ]
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"sites[0].ders"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the three-site New Brunswick scenario with seven DERs.
    pub fn new_brunswick() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            violation: ViolationConfig::default(),
            sites: new_brunswick_sites(),
        }
    }

    /// Returns a single Fredericton site with one 8 kW solar array.
    pub fn single_solar() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            violation: ViolationConfig::default(),
            sites: vec![SiteConfig {
                project_id: "492e323a-b7c5-48ff-bcf7-36ffd170f409".to_string(),
                utility_id: default_utility_id(),
                region: Region::Fredericton,
                baseline_kw: 18.0,
                contract_threshold_kw: 15.0,
                ders: vec![der("12", DerKind::Solar, 8.0)],
            }],
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["new_brunswick", "single_solar"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "new_brunswick" => Ok(Self::new_brunswick()),
            "single_solar" => Ok(Self::single_solar()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.tick_interval_ms == 0 || s.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            errors.push(ConfigError::new(
                "simulation.tick_interval_ms",
                format!(
                    "must be between 1 and {MAX_TICK_INTERVAL_MS}, got {}",
                    s.tick_interval_ms
                ),
            ));
        }
        if s.topic_prefix.is_empty() {
            errors.push(ConfigError::new("simulation.topic_prefix", "must not be empty"));
        }

        let v = &self.violation;
        if !v.multiplier.is_finite() || v.multiplier < 1.0 {
            errors.push(ConfigError::new(
                "violation.multiplier",
                format!("must be a finite number >= 1, got {}", v.multiplier),
            ));
        }

        if self.sites.is_empty() {
            errors.push(ConfigError::new("sites", "at least one site is required"));
        }

        let mut seen_ids = HashSet::new();
        for (i, site) in self.sites.iter().enumerate() {
            let at = |field: &str| format!("sites[{i}].{field}");

            if site.project_id.is_empty() {
                errors.push(ConfigError::new(at("project_id"), "must not be empty"));
            }
            if !(site.baseline_kw.is_finite() && site.baseline_kw > 0.0) {
                errors.push(ConfigError::new(at("baseline_kw"), "must be > 0"));
            }
            if !(site.contract_threshold_kw.is_finite() && site.contract_threshold_kw >= 0.0) {
                errors.push(ConfigError::new(at("contract_threshold_kw"), "must be >= 0"));
            }
            if site.ders.is_empty() || site.ders.len() > MAX_DERS_PER_SITE {
                errors.push(ConfigError::new(
                    at("ders"),
                    format!(
                        "a site needs 1 to {MAX_DERS_PER_SITE} DERs, got {}",
                        site.ders.len()
                    ),
                ));
            }

            for (j, d) in site.ders.iter().enumerate() {
                let at = |field: &str| format!("sites[{i}].ders[{j}].{field}");
                if d.der_id.is_empty() {
                    errors.push(ConfigError::new(at("der_id"), "must not be empty"));
                } else if !seen_ids.insert(d.der_id.as_str()) {
                    errors.push(ConfigError::new(
                        at("der_id"),
                        format!("duplicate DER id \"{}\"", d.der_id),
                    ));
                }
                if !(d.nameplate_capacity_kw.is_finite() && d.nameplate_capacity_kw > 0.0) {
                    errors.push(ConfigError::new(at("nameplate_capacity_kw"), "must be > 0"));
                }
            }
        }

        errors
    }

    /// Flattens sites into one immutable profile per DER, in file order.
    pub fn profiles(&self) -> Vec<DerProfile> {
        self.sites
            .iter()
            .flat_map(|site| {
                site.ders.iter().map(move |d| DerProfile {
                    der_id: d.der_id.clone(),
                    kind: d.kind,
                    nameplate_capacity_kw: d.nameplate_capacity_kw,
                    region: site.region,
                    project_id: site.project_id.clone(),
                    utility_id: site.utility_id.clone(),
                    is_standalone: d.is_standalone,
                    baseline_kw: site.baseline_kw,
                    contract_threshold_kw: site.contract_threshold_kw,
                })
            })
            .collect()
    }
}
