//! # Fault Injection Controller
//!
//! Owns the table from stream identifier to fault list, trigger and packet
//! queue. Every `add_packet` is one iteration of its stream:
//!
//! 1. evaluate the trigger for the iteration number;
//! 2. on an active iteration, arm the drop/repeat faults not yet armed in this
//!    activation;
//! 3. run the faults in registration order, each one transforming the buffer
//!    produced by the previous one (a drop ends the chain);
//! 4. enqueue whatever survives.
//!
//! `get_packet` pops from the queue, so a consumer can run in lockstep with
//! the producer or drain everything that is available. Each queue holds at
//! most [`QUEUE_CAPACITY`] packets; when a producer outruns its consumer the
//! oldest packet is evicted and counted in `StreamStats::overflowed`.
//!
//! Configuring a stream that has not seen a packet yet creates its entry.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::FaultError;
use crate::fault::{Applied, Fault, FaultSlot};
use crate::stats::StreamStats;
use crate::trigger::{Trigger, TriggerState};

/// Packets a stream queues before the oldest is evicted.
pub const QUEUE_CAPACITY: usize = 1024;

/// State of one fault-injected stream.
#[derive(Debug, Default)]
struct Stream {
    faults: Vec<FaultSlot>,
    trigger: TriggerState,
    iteration: u64,
    queue: VecDeque<Bytes>,
    last_emitted: Option<Bytes>,
    stats: StreamStats,
}

impl Stream {
    fn clear_faults(&mut self) {
        self.faults.clear();
        self.trigger.clear();
    }
}

/// Per-stream packet fault injection.
#[derive(Debug, Default)]
pub struct FaultController {
    streams: HashMap<String, Stream>,
}

impl FaultController {
    pub fn new() -> Self {
        Self::default()
    }

    fn stream_mut(&mut self, identifier: &str) -> &mut Stream {
        match self.streams.entry(identifier.to_owned()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                debug!(stream = identifier, "creating stream entry");
                e.insert(Stream::default())
            }
        }
    }

    // ─── Packet path ────────────────────────────────────────────────────────

    /// Submit a packet on `identifier`, running this iteration's faults.
    pub fn add_packet(&mut self, identifier: &str, data: &[u8]) {
        let stream = self.stream_mut(identifier);
        let iteration = stream.iteration;
        stream.iteration += 1;
        stream.stats.submitted += 1;

        let eval = stream.trigger.evaluate(iteration);
        if eval.fired {
            debug!(stream = identifier, iteration, "trigger fired");
        }
        if eval.active {
            for slot in stream.faults.iter_mut().filter(|s| !s.is_armed()) {
                slot.arm();
            }
        }

        let mut buf = Some(Bytes::copy_from_slice(data));
        for slot in stream.faults.iter_mut() {
            let Some(current) = buf.take() else {
                break;
            };
            buf = match slot.apply(current, eval.active, stream.last_emitted.as_ref()) {
                Applied::Unchanged(b) => Some(b),
                Applied::Corrupted(b) => {
                    stream.stats.corrupted += 1;
                    debug!(stream = identifier, iteration, fault = ?slot.fault, "bit flipped");
                    Some(b)
                }
                Applied::CorruptionSkipped(b) => {
                    stream.stats.corruptions_skipped += 1;
                    debug!(
                        stream = identifier,
                        iteration,
                        len = b.len(),
                        fault = ?slot.fault,
                        "corruption target past packet end"
                    );
                    Some(b)
                }
                Applied::Repeated(b) => {
                    stream.stats.repeated += 1;
                    debug!(stream = identifier, iteration, "packet repeated");
                    Some(b)
                }
                Applied::Dropped => {
                    stream.stats.dropped += 1;
                    debug!(stream = identifier, iteration, "packet dropped");
                    None
                }
            };
        }

        if let Some(out) = buf {
            if stream.queue.len() >= QUEUE_CAPACITY {
                stream.queue.pop_front();
                stream.stats.overflowed += 1;
                if stream.stats.overflowed == 1 {
                    warn!(
                        stream = identifier,
                        capacity = QUEUE_CAPACITY,
                        "packet queue full, evicting oldest packets"
                    );
                }
            }
            stream.last_emitted = Some(out.clone());
            stream.queue.push_back(out);
        }
    }

    /// Pop the next packet of `identifier`.
    ///
    /// `Ok(None)` means no data is available right now, for example because
    /// this iteration's packet was dropped.
    pub fn get_packet(&mut self, identifier: &str) -> Result<Option<Bytes>, FaultError> {
        let stream = self
            .streams
            .get_mut(identifier)
            .filter(|s| s.stats.submitted > 0)
            .ok_or_else(|| FaultError::not_found(identifier))?;

        let packet = stream.queue.pop_front();
        if packet.is_some() {
            stream.stats.delivered += 1;
        }
        Ok(packet)
    }

    // ─── Fault configuration ────────────────────────────────────────────────

    /// Append `fault` to the stream's fault list.
    pub fn add_fault(&mut self, identifier: &str, fault: Fault) -> Result<(), FaultError> {
        fault.validate()?;
        info!(stream = identifier, ?fault, "adding fault");
        self.stream_mut(identifier).faults.push(FaultSlot::new(fault));
        Ok(())
    }

    pub fn add_fault_corruption_bit_flip(
        &mut self,
        identifier: &str,
        byte_index: usize,
        bit_to_flip: u8,
    ) -> Result<(), FaultError> {
        self.add_fault(
            identifier,
            Fault::CorruptionBitFlip {
                byte_index,
                bit_to_flip,
            },
        )
    }

    pub fn add_fault_drop(&mut self, identifier: &str, num_packets: u32) -> Result<(), FaultError> {
        self.add_fault(identifier, Fault::Drop { num_packets })
    }

    pub fn add_fault_repeat(
        &mut self,
        identifier: &str,
        num_packets: u32,
    ) -> Result<(), FaultError> {
        self.add_fault(identifier, Fault::Repeat { num_packets })
    }

    // ─── Trigger configuration ──────────────────────────────────────────────

    /// Replace the stream's trigger. Any armed drop/repeat budget is dropped.
    pub fn set_trigger(&mut self, identifier: &str, trigger: Trigger) {
        info!(stream = identifier, ?trigger, "setting trigger");
        let stream = self.stream_mut(identifier);
        stream.trigger.set_trigger(trigger);
        for slot in &mut stream.faults {
            slot.disarm();
        }
    }

    pub fn set_trigger_once_after_iterations(&mut self, identifier: &str, iterations: u64) {
        self.set_trigger(identifier, Trigger::OnceAfter { iterations });
    }

    pub fn set_trigger_after_iterations(&mut self, identifier: &str, iterations: u64) {
        self.set_trigger(identifier, Trigger::After { iterations });
    }

    /// Keep a fired trigger active for `iterations` further iterations.
    pub fn set_duration_after_trigger(&mut self, identifier: &str, iterations: u64) {
        info!(stream = identifier, iterations, "setting duration after trigger");
        self.stream_mut(identifier).trigger.set_duration(iterations);
    }

    // ─── Removal ────────────────────────────────────────────────────────────

    /// Clear the faults and trigger of one stream. Queued packets and the
    /// iteration counter are kept.
    pub fn remove_all_faults_identifier(&mut self, identifier: &str) {
        if let Some(stream) = self.streams.get_mut(identifier) {
            info!(stream = identifier, "removing all faults");
            stream.clear_faults();
        }
    }

    /// Clear the whole table.
    pub fn remove_all_faults(&mut self) {
        info!(streams = self.streams.len(), "removing all faults and streams");
        self.streams.clear();
    }

    // ─── Introspection ──────────────────────────────────────────────────────

    /// Identifiers currently in the table, in no particular order.
    pub fn streams(&self) -> impl Iterator<Item = &str> {
        self.streams.keys().map(String::as_str)
    }

    /// Number of packets submitted so far on `identifier`.
    pub fn iteration(&self, identifier: &str) -> Option<u64> {
        self.streams.get(identifier).map(|s| s.iteration)
    }

    /// Configured faults of `identifier`, in registration order.
    pub fn faults(&self, identifier: &str) -> Option<Vec<Fault>> {
        self.streams
            .get(identifier)
            .map(|s| s.faults.iter().map(|slot| slot.fault).collect())
    }

    /// Effective trigger and duration of `identifier`.
    pub fn trigger(&self, identifier: &str) -> Option<(Trigger, Option<u64>)> {
        self.streams
            .get(identifier)
            .map(|s| (s.trigger.trigger(), s.trigger.duration()))
    }

    /// Snapshot of the stream's counters.
    pub fn stream_stats(&self, identifier: &str) -> Option<StreamStats> {
        self.streams.get(identifier).map(|s| StreamStats {
            queued: s.queue.len() as u64,
            ..s.stats.clone()
        })
    }
}
