//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use der_telemetry_sim::config::{DerConfig, ScenarioConfig, SiteConfig};
use der_telemetry_sim::publish::{PublishError, Publisher};
use der_telemetry_sim::sim::types::{DerKind, DerProfile, Region};
use der_telemetry_sim::telemetry::Reading;

/// 12:00 local (AST) on Wednesday 2025-03-12.
pub fn local_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 12, 16, 0, 0).single().expect("valid timestamp")
}

/// Midnight local (AST) on Wednesday 2025-03-12.
pub fn local_midnight() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 12, 4, 0, 0).single().expect("valid timestamp")
}

/// Collects every published message.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub messages: Vec<(String, Vec<u8>)>,
}

impl RecordingPublisher {
    /// Decodes every payload as a `Reading`.
    pub fn readings(&self) -> Vec<Reading> {
        self.messages
            .iter()
            .map(|(_, payload)| serde_json::from_slice(payload).expect("payload is a reading"))
            .collect()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.messages.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// Rejects every `n`th message (1-based) and records the rest.
#[derive(Debug)]
pub struct FlakyPublisher {
    pub every: usize,
    pub attempts: usize,
    pub delivered: Vec<(String, Vec<u8>)>,
}

impl FlakyPublisher {
    pub fn new(every: usize) -> Self {
        Self {
            every,
            attempts: 0,
            delivered: Vec::new(),
        }
    }
}

impl Publisher for FlakyPublisher {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.attempts += 1;
        if self.attempts % self.every == 0 {
            return Err(PublishError::Rejected {
                topic: topic.to_string(),
                reason: "broker unavailable".to_string(),
            });
        }
        self.delivered.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// A single-site scenario with the given DERs, on simulated time from `start`.
pub fn scenario(start: DateTime<Utc>, ders: Vec<DerConfig>) -> ScenarioConfig {
    let mut config = ScenarioConfig::single_solar();
    config.simulation.start_time = Some(start);
    config.sites = vec![SiteConfig {
        project_id: "492e323a-b7c5-48ff-bcf7-36ffd170f409".to_string(),
        utility_id: "utility1234".to_string(),
        region: Region::Fredericton,
        baseline_kw: 18.0,
        contract_threshold_kw: 15.0,
        ders,
    }];
    config
}

pub fn der(der_id: &str, kind: DerKind, capacity_kw: f64) -> DerConfig {
    DerConfig {
        der_id: der_id.to_string(),
        kind,
        nameplate_capacity_kw: capacity_kw,
        is_standalone: false,
    }
}

/// Stand-alone profile for driving a `DerSimulator` directly.
pub fn profile(kind: DerKind, capacity_kw: f64, baseline_kw: f64, threshold_kw: f64) -> DerProfile {
    DerProfile {
        der_id: "t1".to_string(),
        kind,
        nameplate_capacity_kw: capacity_kw,
        region: Region::Fredericton,
        project_id: "test-project".to_string(),
        utility_id: "utility1234".to_string(),
        is_standalone: false,
        baseline_kw,
        contract_threshold_kw: threshold_kw,
    }
}
