//! Tick loop: drives every simulator and publishes its readings.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use crate::io::export::TelemetryCsvWriter;
use crate::publish::Publisher;

use super::clock::Clock;
use super::simulator::DerSimulator;

/// Lifecycle of an orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Running,
    Stopped,
}

/// Loop parameters.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Time between ticks.
    pub tick_interval: Duration,
    /// Ticks to run; `0` means until shutdown.
    pub max_messages: u64,
    /// Readings are published to `{topic_prefix}/{project_id}`.
    pub topic_prefix: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            max_messages: 0,
            topic_prefix: "projects".to_string(),
        }
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub published: usize,
    pub failed: usize,
}

/// Totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub published: u64,
    pub failed: u64,
}

/// Owns the simulators and ticks them in a single sequential loop.
pub struct Orchestrator<P: Publisher> {
    config: OrchestratorConfig,
    simulators: Vec<DerSimulator>,
    publisher: P,
    clock: Clock,
    recorder: Option<TelemetryCsvWriter>,
    state: OrchestratorState,
    summary: RunSummary,
}

impl<P: Publisher> Orchestrator<P> {
    pub fn new(
        config: OrchestratorConfig,
        simulators: Vec<DerSimulator>,
        publisher: P,
        clock: Clock,
    ) -> Self {
        Self {
            config,
            simulators,
            publisher,
            clock,
            recorder: None,
            state: OrchestratorState::Idle,
            summary: RunSummary::default(),
        }
    }

    /// Also writes every emitted reading to `recorder`.
    pub fn with_recorder(mut self, recorder: TelemetryCsvWriter) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Runs one tick: every simulator produces and publishes one reading.
    ///
    /// A failed publish or serialization is logged and counted; the remaining
    /// simulators still run.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.tick();
        let mut report = TickReport::default();

        for sim in &mut self.simulators {
            let reading = sim.tick(now);
            let topic = format!("{}/{}", self.config.topic_prefix, reading.project_id);

            let payload = match reading.to_json_bytes() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(der_id = %reading.der_id, error = %e, "failed to serialize reading");
                    report.failed += 1;
                    continue;
                }
            };

            match self.publisher.publish(&topic, &payload) {
                Ok(()) => {
                    tracing::debug!(
                        topic = %topic,
                        der_id = %reading.der_id,
                        output_kw = reading.current_output,
                        meter_kw = reading.power_meter_measurement,
                        "published reading"
                    );
                    report.published += 1;
                }
                Err(e) => {
                    tracing::warn!(topic = %topic, der_id = %reading.der_id, error = %e, "publish failed");
                    report.failed += 1;
                }
            }

            if let Some(recorder) = &mut self.recorder {
                if let Err(e) = recorder.append(&reading) {
                    tracing::warn!(error = %e, "failed to record telemetry row; recording disabled");
                    self.recorder = None;
                }
            }
        }

        self.summary.ticks += 1;
        self.summary.published += report.published as u64;
        self.summary.failed += report.failed as u64;
        report
    }

    /// Ticks on a fixed interval until `shutdown` resolves or `max_messages`
    /// ticks have run. Shutdown is only observed between ticks.
    pub async fn run<F>(&mut self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        self.state = OrchestratorState::Running;
        tracing::info!(
            ders = self.simulators.len(),
            interval_ms = self.config.tick_interval.as_millis() as u64,
            max_messages = self.config.max_messages,
            "simulation started"
        );

        let mut interval = time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    self.tick();
                    if self.config.max_messages > 0 && self.summary.ticks >= self.config.max_messages {
                        break;
                    }
                }
            }
        }

        self.stop();
        self.summary
    }

    /// Moves to `Stopped` and flushes the recorder.
    pub fn stop(&mut self) {
        if let Some(recorder) = &mut self.recorder {
            if let Err(e) = recorder.flush() {
                tracing::warn!(error = %e, "failed to flush telemetry file");
            }
        }
        if self.state != OrchestratorState::Stopped {
            tracing::info!(
                ticks = self.summary.ticks,
                published = self.summary.published,
                failed = self.summary.failed,
                "simulation stopped"
            );
        }
        self.state = OrchestratorState::Stopped;
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn simulators(&self) -> &[DerSimulator] {
        &self.simulators
    }

    pub fn simulators_mut(&mut self) -> &mut [DerSimulator] {
        &mut self.simulators
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn into_publisher(self) -> P {
        self.publisher
    }
}
