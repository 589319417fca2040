//! # Iteration triggers
//!
//! A stream's trigger decides on which iterations its faults are active.
//! Iterations are counted per stream from 0: the iteration of a packet is the
//! number of packets submitted on that stream before it.
//!
//! ```text
//! OnceAfter { 3 }            . . . X . . . .
//! After { 3 }                . . . X X X X X
//! After { 3 } + duration 2   . . . X X X . .
//! ```
//!
//! When the trigger fires it also arms the stream's drop and repeat faults.

use serde::{Deserialize, Serialize};

/// Trigger condition attached to a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Fire once, on iteration `iterations`.
    OnceAfter { iterations: u64 },
    /// Fire on iteration `iterations` and stay active from then on.
    After { iterations: u64 },
}

impl Default for Trigger {
    /// Streams without a configured trigger fault from the first packet.
    fn default() -> Self {
        Trigger::After { iterations: 0 }
    }
}

impl Trigger {
    /// Whether the trigger may fire on `iteration`.
    pub fn condition_met(&self, iteration: u64) -> bool {
        match *self {
            Trigger::OnceAfter { iterations } => iteration == iterations,
            Trigger::After { iterations } => iteration >= iterations,
        }
    }
}

/// Outcome of evaluating the trigger for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Evaluation {
    /// The trigger fired on this iteration.
    pub fired: bool,
    /// Faults gated by the trigger window apply on this iteration.
    pub active: bool,
}

/// Per-stream trigger configuration and fired state.
#[derive(Debug, Clone, Default)]
pub(crate) struct TriggerState {
    trigger: Option<Trigger>,
    duration: Option<u64>,
    fired_at: Option<u64>,
}

impl TriggerState {
    /// Replace the trigger. Resets the fired state.
    pub(crate) fn set_trigger(&mut self, trigger: Trigger) {
        self.trigger = Some(trigger);
        self.fired_at = None;
    }

    /// Bound how many iterations after firing the trigger stays active.
    pub(crate) fn set_duration(&mut self, iterations: u64) {
        self.duration = Some(iterations);
    }

    pub(crate) fn trigger(&self) -> Trigger {
        self.trigger.unwrap_or_default()
    }

    pub(crate) fn duration(&self) -> Option<u64> {
        self.duration
    }

    pub(crate) fn clear(&mut self) {
        *self = TriggerState::default();
    }

    pub(crate) fn evaluate(&mut self, iteration: u64) -> Evaluation {
        let trigger = self.trigger();
        let mut fired = false;
        if self.fired_at.is_none() && trigger.condition_met(iteration) {
            self.fired_at = Some(iteration);
            fired = true;
        }

        let active = match self.fired_at {
            None => false,
            Some(at) => match self.duration {
                Some(d) => iteration <= at.saturating_add(d),
                None => match trigger {
                    Trigger::OnceAfter { .. } => iteration == at,
                    Trigger::After { .. } => true,
                },
            },
        };

        Evaluation { fired, active }
    }
}
