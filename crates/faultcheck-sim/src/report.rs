//! Simulation results, serializable for JSON output.

use std::collections::BTreeMap;

use serde::Serialize;

use faultcheck_e2e::E2eResult;
use faultcheck_packet::{FaultPlan, StreamStats};

/// Outcome of running one channel against one fault plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelReport {
    pub stream: String,
    /// Seed the sensor payloads were drawn from.
    pub seed: u64,
    /// Frames handed to the controller.
    pub submitted: u64,
    /// Frames that came back out of the controller.
    pub delivered: u64,
    /// Frames the receiver accepted (`ok` or `ok_some_lost`).
    pub accepted: u64,
    /// Accepted frames whose payload differs from what was sent under that
    /// sequence number. Non-zero means the protection let corruption through.
    pub undetected_corruptions: u64,
    /// Receiver classifications.
    pub results: BTreeMap<E2eResult, u64>,
    /// Controller-side counters for the channel's stream.
    pub stream_stats: Option<StreamStats>,
    /// The plan that was installed.
    pub plan: FaultPlan,
}

impl ChannelReport {
    /// How many frames were classified as `result`.
    pub fn count(&self, result: E2eResult) -> u64 {
        self.results.get(&result).copied().unwrap_or(0)
    }

    pub(crate) fn record(&mut self, result: E2eResult) {
        *self.results.entry(result).or_default() += 1;
        if result.is_accepted() {
            self.accepted += 1;
        }
    }

    /// Whether no corrupted payload was accepted.
    pub fn is_sound(&self) -> bool {
        self.undetected_corruptions == 0
    }
}
