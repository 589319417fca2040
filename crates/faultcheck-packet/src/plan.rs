//! # Fault plans
//!
//! Declarative description of the faults for a set of streams, loadable from
//! TOML:
//!
//! ```toml
//! version = 1
//!
//! [[streams]]
//! id = "airbag"
//! trigger = { kind = "once_after", iterations = 3 }
//! duration = 2
//!
//! [[streams.faults]]
//! kind = "bit_flip"
//! byte_index = 0
//! bit_to_flip = 3
//!
//! [[streams.faults]]
//! kind = "drop"
//! num_packets = 2
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::controller::FaultController;
use crate::error::FaultError;
use crate::fault::Fault;
use crate::trigger::Trigger;

pub const PLAN_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid plan TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported plan version {0}")]
    Version(u32),
    #[error("stream #{index} has an empty identifier")]
    EmptyIdentifier { index: usize },
    #[error("stream '{stream}': {source}")]
    Fault {
        stream: String,
        #[source]
        source: FaultError,
    },
}

// ─── Raw input ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FaultPlanInput {
    pub version: u32,
    pub streams: Vec<StreamPlanInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamPlanInput {
    pub id: String,
    pub trigger: Option<Trigger>,
    pub duration: Option<u64>,
    pub faults: Vec<Fault>,
}

// ─── Resolved plan ──────────────────────────────────────────────────────────

/// Faults, trigger and duration for one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamPlan {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    pub faults: Vec<Fault>,
}

impl StreamPlan {
    pub fn new(id: impl Into<String>) -> Self {
        StreamPlan {
            id: id.into(),
            trigger: None,
            duration: None,
            faults: Vec::new(),
        }
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn with_duration(mut self, iterations: u64) -> Self {
        self.duration = Some(iterations);
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }
}

/// A validated set of stream plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultPlan {
    pub version: u32,
    pub streams: Vec<StreamPlan>,
}

impl Default for FaultPlan {
    fn default() -> Self {
        Self {
            version: PLAN_VERSION,
            streams: Vec::new(),
        }
    }
}

impl FaultPlanInput {
    pub fn resolve(self) -> Result<FaultPlan, PlanError> {
        let version = if self.version == 0 {
            PLAN_VERSION
        } else {
            self.version
        };
        if version != PLAN_VERSION {
            return Err(PlanError::Version(version));
        }

        let mut seen = HashSet::new();
        let mut streams = Vec::new();
        for (index, stream) in self.streams.into_iter().enumerate() {
            let id = stream.id.trim().to_string();
            if id.is_empty() {
                return Err(PlanError::EmptyIdentifier { index });
            }
            if !seen.insert(id.clone()) {
                warn!(stream = %id, "duplicate stream in fault plan, keeping the first");
                continue;
            }
            for fault in &stream.faults {
                fault.validate().map_err(|source| PlanError::Fault {
                    stream: id.clone(),
                    source,
                })?;
            }
            streams.push(StreamPlan {
                id,
                trigger: stream.trigger,
                duration: stream.duration,
                faults: stream.faults,
            });
        }

        Ok(FaultPlan { version, streams })
    }
}

impl FaultPlan {
    pub fn from_toml_str(input: &str) -> Result<Self, PlanError> {
        if input.trim().is_empty() {
            return Ok(FaultPlan::default());
        }
        let parsed: FaultPlanInput = toml::from_str(input)?;
        parsed.resolve()
    }

    pub fn with_stream(mut self, stream: StreamPlan) -> Self {
        self.streams.push(stream);
        self
    }

    /// Install the plan into `controller`. Each named stream is cleared first;
    /// streams the plan does not mention are left alone.
    ///
    /// Every fault is validated before the controller is touched, so a plan
    /// with a bad entry leaves the controller unchanged.
    pub fn apply(&self, controller: &mut FaultController) -> Result<(), FaultError> {
        self.streams
            .iter()
            .flat_map(|s| &s.faults)
            .try_for_each(Fault::validate)?;

        for stream in &self.streams {
            controller.remove_all_faults_identifier(&stream.id);
            if let Some(trigger) = stream.trigger {
                controller.set_trigger(&stream.id, trigger);
            }
            if let Some(duration) = stream.duration {
                controller.set_duration_after_trigger(&stream.id, duration);
            }
            for fault in &stream.faults {
                controller.add_fault(&stream.id, *fault)?;
            }
        }
        Ok(())
    }
}
