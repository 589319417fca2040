use serde::{Deserialize, Serialize};

use faultcheck_e2e::E2eConfig;
use faultcheck_packet::plan::{FaultPlanInput, StreamPlanInput, PLAN_VERSION};
use faultcheck_packet::FaultPlan;

use crate::error::SimError;

pub const CONFIG_VERSION: u32 = 1;

pub const DEFAULT_STREAM: &str = "airbag";
pub const DEFAULT_DATA_SIZE: u8 = 2;
pub const DEFAULT_MAX_SEQ_DIFF: u8 = 2;
pub const DEFAULT_ITERATIONS: u64 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimConfigInput {
    pub version: u32,
    pub channel: ChannelConfigInput,
    pub streams: Vec<StreamPlanInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelConfigInput {
    pub stream: Option<String>,
    pub data_size: Option<u8>,
    pub max_seq_diff: Option<u8>,
    pub iterations: Option<u64>,
    pub seed: Option<u64>,
}

/// One simulated E2E-protected channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelConfig {
    /// Stream identifier used with the fault controller.
    pub stream: String,
    pub e2e: E2eConfig,
    /// Packets the sensor produces.
    pub iterations: u64,
    /// Seed for sensor payloads.
    pub seed: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            stream: DEFAULT_STREAM.to_string(),
            e2e: E2eConfig {
                max_seq_diff: DEFAULT_MAX_SEQ_DIFF,
                data_size: DEFAULT_DATA_SIZE,
            },
            iterations: DEFAULT_ITERATIONS,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    pub channel: ChannelConfig,
    pub plan: FaultPlan,
}

impl ChannelConfigInput {
    pub fn resolve(self) -> Result<ChannelConfig, SimError> {
        let defaults = ChannelConfig::default();
        let stream = match self.stream {
            Some(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(SimError::Channel("stream name is empty".into()));
                }
                trimmed.to_string()
            }
            None => defaults.stream,
        };
        let e2e = E2eConfig::new(
            self.max_seq_diff.unwrap_or(defaults.e2e.max_seq_diff),
            self.data_size.unwrap_or(defaults.e2e.data_size),
        )?;

        Ok(ChannelConfig {
            stream,
            e2e,
            iterations: self.iterations.unwrap_or(defaults.iterations),
            seed: self.seed.unwrap_or(defaults.seed),
        })
    }
}

impl SimConfigInput {
    pub fn resolve(self) -> Result<SimConfig, SimError> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(SimError::Version(version));
        }

        let channel = self.channel.resolve()?;
        let plan = FaultPlanInput {
            version: PLAN_VERSION,
            streams: self.streams,
        }
        .resolve()?;

        Ok(SimConfig { channel, plan })
    }
}

impl SimConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, SimError> {
        if input.trim().is_empty() {
            return Ok(SimConfig::default());
        }
        let parsed: SimConfigInput = toml::from_str(input)?;
        parsed.resolve()
    }
}

/// Channel settings that, when set, replace the configured ones.
#[derive(Debug, Clone, Default)]
pub struct ChannelOverrides {
    pub stream: Option<String>,
    pub data_size: Option<u8>,
    pub max_seq_diff: Option<u8>,
    pub iterations: Option<u64>,
}

impl ChannelOverrides {
    /// Validates everything before writing, so `channel` is unchanged on error.
    pub fn apply(&self, channel: &mut ChannelConfig) -> Result<(), SimError> {
        let stream = match &self.stream {
            Some(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(SimError::Channel("stream name is empty".into()));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };
        let e2e = E2eConfig::new(
            self.max_seq_diff.unwrap_or(channel.e2e.max_seq_diff),
            self.data_size.unwrap_or(channel.e2e.data_size),
        )?;

        if let Some(stream) = stream {
            channel.stream = stream;
        }
        channel.e2e = e2e;
        if let Some(iterations) = self.iterations {
            channel.iterations = iterations;
        }
        Ok(())
    }
}
