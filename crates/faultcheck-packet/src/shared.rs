//! Thread-safe handle around a [`FaultController`].
//!
//! One mutex guards the whole table, so iteration counts stay consistent when
//! a producer thread submits packets while a consumer thread drains them.

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use crate::controller::FaultController;
use crate::error::FaultError;
use crate::stats::StreamStats;
use crate::trigger::Trigger;

/// Lock a mutex, recovering from poison (prior panic in another thread).
fn lock_or_recover<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Cloneable, shareable controller.
#[derive(Debug, Clone, Default)]
pub struct SharedController {
    inner: Arc<Mutex<FaultController>>,
}

impl SharedController {
    pub fn new(controller: FaultController) -> Self {
        SharedController {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Run `f` with exclusive access to the controller.
    pub fn with<R>(&self, f: impl FnOnce(&mut FaultController) -> R) -> R {
        let mut guard = lock_or_recover(&self.inner);
        f(&mut guard)
    }

    pub fn add_packet(&self, identifier: &str, data: &[u8]) {
        self.with(|c| c.add_packet(identifier, data))
    }

    pub fn get_packet(&self, identifier: &str) -> Result<Option<Bytes>, FaultError> {
        self.with(|c| c.get_packet(identifier))
    }

    pub fn add_fault_corruption_bit_flip(
        &self,
        identifier: &str,
        byte_index: usize,
        bit_to_flip: u8,
    ) -> Result<(), FaultError> {
        self.with(|c| c.add_fault_corruption_bit_flip(identifier, byte_index, bit_to_flip))
    }

    pub fn add_fault_drop(&self, identifier: &str, num_packets: u32) -> Result<(), FaultError> {
        self.with(|c| c.add_fault_drop(identifier, num_packets))
    }

    pub fn add_fault_repeat(&self, identifier: &str, num_packets: u32) -> Result<(), FaultError> {
        self.with(|c| c.add_fault_repeat(identifier, num_packets))
    }

    pub fn set_trigger(&self, identifier: &str, trigger: Trigger) {
        self.with(|c| c.set_trigger(identifier, trigger))
    }

    pub fn set_trigger_once_after_iterations(&self, identifier: &str, iterations: u64) {
        self.with(|c| c.set_trigger_once_after_iterations(identifier, iterations))
    }

    pub fn set_trigger_after_iterations(&self, identifier: &str, iterations: u64) {
        self.with(|c| c.set_trigger_after_iterations(identifier, iterations))
    }

    pub fn set_duration_after_trigger(&self, identifier: &str, iterations: u64) {
        self.with(|c| c.set_duration_after_trigger(identifier, iterations))
    }

    pub fn remove_all_faults_identifier(&self, identifier: &str) {
        self.with(|c| c.remove_all_faults_identifier(identifier))
    }

    pub fn remove_all_faults(&self) {
        self.with(|c| c.remove_all_faults())
    }

    pub fn stream_stats(&self, identifier: &str) -> Option<StreamStats> {
        self.with(|c| c.stream_stats(identifier))
    }
}
