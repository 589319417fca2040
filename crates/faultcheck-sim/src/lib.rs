//! Fault-injection simulation for E2E-protected packet channels.
//!
//! A simulated sensor produces random payloads, an [`E2eSender`] protects
//! them, a [`FaultController`] corrupts, drops or repeats them, and an
//! [`E2eReceiver`] classifies what comes out. The harness records every
//! classification and flags any accepted frame whose payload differs from what
//! was sent.
//!
//! [`E2eSender`]: faultcheck_e2e::E2eSender
//! [`E2eReceiver`]: faultcheck_e2e::E2eReceiver
//! [`FaultController`]: faultcheck_packet::FaultController

pub mod config;
pub mod error;
pub mod harness;
pub mod report;
pub mod scenario;

pub use config::{ChannelConfig, ChannelOverrides, SimConfig};
pub use error::SimError;
pub use harness::Harness;
pub use report::ChannelReport;
pub use scenario::{ScenarioConfig, ScenarioGenerator};
