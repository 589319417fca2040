//! # faultcheck-packet
//!
//! Packet fault injection for testing communication protection mechanisms.
//!
//! A simulation loop pushes packets for a named stream into a
//! [`FaultController`] and pulls them back out. In between, the controller
//! corrupts, drops or repeats packets according to the stream's fault list and
//! its iteration-based trigger.
//!
//! ## Crate structure
//!
//! - [`fault`] — Fault entries and how each one transforms a packet
//! - [`trigger`] — Iteration triggers and the duration window
//! - [`controller`] — The per-stream fault table and packet queues
//! - [`shared`] — Mutex-guarded handle for producer/consumer threads
//! - [`plan`] — Declarative TOML fault plans
//! - [`stats`] — Per-stream counters
//! - [`error`] — Error types

pub mod controller;
pub mod error;
pub mod fault;
pub mod plan;
pub mod shared;
pub mod stats;
pub mod trigger;

pub use controller::FaultController;
pub use error::FaultError;
pub use fault::Fault;
pub use plan::FaultPlan;
pub use shared::SharedController;
pub use stats::StreamStats;
pub use trigger::Trigger;
