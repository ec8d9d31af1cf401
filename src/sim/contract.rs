//! Rolling-window contract evaluation for one DER.

use std::collections::VecDeque;

use chrono::{DateTime, TimeDelta, Utc};

/// Length of the rolling evaluation window in seconds.
pub const WINDOW_SECS: i64 = 5 * 60;

/// One meter/DER observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractSample {
    pub timestamp: DateTime<Utc>,
    pub meter_kw: f64,
    pub der_kw: f64,
}

/// Contract performance over the current window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractStatus {
    /// Samples currently in the window.
    pub samples: usize,
    /// Mean of `meter - der` over the window (kW).
    pub average_net_consumption_kw: f64,
    /// `baseline - average_net_consumption` (kW).
    pub reduction_kw: f64,
    /// Required reduction (kW).
    pub threshold_kw: f64,
    /// Whether the reduction falls short of the threshold.
    pub violated: bool,
}

/// Tracks whether a DER's site meets its contracted reduction.
///
/// Only samples newer than `now - 5 min` are kept; the status is recomputed
/// on every [`ContractEvaluator::record`].
#[derive(Debug, Clone)]
pub struct ContractEvaluator {
    baseline_kw: f64,
    threshold_kw: f64,
    window: VecDeque<ContractSample>,
    status: ContractStatus,
}

impl ContractEvaluator {
    /// Creates an evaluator with an empty window.
    pub fn new(baseline_kw: f64, threshold_kw: f64) -> Self {
        Self {
            baseline_kw,
            threshold_kw,
            window: VecDeque::new(),
            status: ContractStatus {
                samples: 0,
                average_net_consumption_kw: 0.0,
                reduction_kw: 0.0,
                threshold_kw,
                violated: false,
            },
        }
    }

    /// Adds a sample, evicts expired ones and returns the updated status.
    ///
    /// Samples are expected in time order; the newest timestamp defines `now`.
    pub fn record(&mut self, sample: ContractSample) -> ContractStatus {
        let cutoff = sample.timestamp - TimeDelta::seconds(WINDOW_SECS);
        self.window.push_back(sample);
        while self.window.front().is_some_and(|s| s.timestamp <= cutoff) {
            self.window.pop_front();
        }

        let n = self.window.len() as f64;
        let net_sum: f64 = self.window.iter().map(|s| s.meter_kw - s.der_kw).sum();
        let average = net_sum / n;
        let reduction = self.baseline_kw - average;

        self.status = ContractStatus {
            samples: self.window.len(),
            average_net_consumption_kw: average,
            reduction_kw: reduction,
            threshold_kw: self.threshold_kw,
            violated: reduction < self.threshold_kw,
        };
        self.status
    }

    /// Samples currently retained, oldest first.
    pub fn window(&self) -> impl Iterator<Item = &ContractSample> {
        self.window.iter()
    }

    /// Status as of the last recorded sample.
    pub fn status(&self) -> ContractStatus {
        self.status
    }
}
