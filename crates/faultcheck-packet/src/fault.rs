//! # Fault entries
//!
//! A [`Fault`] is one configured payload transformation. Inside the controller
//! each fault lives in a `FaultSlot` that carries its runtime state: whether
//! the current trigger activation has armed it, the drop/repeat budget left,
//! and the payload a repeat fault is replaying.

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::FaultError;

/// Highest valid bit index inside a byte.
pub const MAX_BIT_INDEX: u8 = 7;

/// One configured fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fault {
    /// Toggle bit `bit_to_flip` of byte `byte_index` on every active iteration.
    #[serde(rename = "bit_flip")]
    CorruptionBitFlip { byte_index: usize, bit_to_flip: u8 },
    /// Suppress the next `num_packets` packets once armed.
    Drop { num_packets: u32 },
    /// Replay the captured payload instead of the next `num_packets` inputs.
    Repeat { num_packets: u32 },
}

impl Fault {
    /// Check the fault's arguments.
    pub fn validate(&self) -> Result<(), FaultError> {
        match *self {
            Fault::CorruptionBitFlip { bit_to_flip, .. } if bit_to_flip > MAX_BIT_INDEX => {
                Err(FaultError::InvalidArgument(format!(
                    "bit_to_flip must be in 0..={MAX_BIT_INDEX}, got {bit_to_flip}"
                )))
            }
            Fault::Drop { num_packets: 0 } => Err(FaultError::InvalidArgument(
                "drop fault needs num_packets > 0".into(),
            )),
            Fault::Repeat { num_packets: 0 } => Err(FaultError::InvalidArgument(
                "repeat fault needs num_packets > 0".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Budget a drop/repeat fault receives when armed. Zero for corruption,
    /// which is governed by the trigger window alone.
    pub fn budget(&self) -> u32 {
        match *self {
            Fault::CorruptionBitFlip { .. } => 0,
            Fault::Drop { num_packets } | Fault::Repeat { num_packets } => num_packets,
        }
    }
}

/// Toggle one bit of `payload`.
///
/// Returns `None` if `byte_index` is past the end of the payload.
pub fn flip_bit(payload: &[u8], byte_index: usize, bit_to_flip: u8) -> Option<Bytes> {
    if byte_index >= payload.len() || bit_to_flip > MAX_BIT_INDEX {
        return None;
    }
    let mut buf = BytesMut::from(payload);
    buf[byte_index] ^= 1 << bit_to_flip;
    Some(buf.freeze())
}

/// Result of running one fault over a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Applied {
    /// The fault did nothing this iteration.
    Unchanged(Bytes),
    /// A bit was toggled.
    Corrupted(Bytes),
    /// The corruption target lies outside the packet.
    CorruptionSkipped(Bytes),
    /// The buffer was replaced with the replayed payload.
    Repeated(Bytes),
    /// The packet was suppressed.
    Dropped,
}

/// A fault plus its runtime state.
#[derive(Debug, Clone)]
pub(crate) struct FaultSlot {
    pub(crate) fault: Fault,
    armed: bool,
    remaining: u32,
    captured: Option<Bytes>,
}

impl FaultSlot {
    pub(crate) fn new(fault: Fault) -> Self {
        FaultSlot {
            fault,
            armed: false,
            remaining: 0,
            captured: None,
        }
    }

    /// Load the drop/repeat budget. A slot is armed at most once per trigger
    /// activation.
    pub(crate) fn arm(&mut self) {
        self.armed = true;
        self.remaining = self.fault.budget();
        self.captured = None;
    }

    /// Forget the arming and any pending budget.
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
        self.remaining = 0;
        self.captured = None;
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.armed
    }

    #[cfg(test)]
    pub(crate) fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Run the fault over `buf`.
    ///
    /// `active` is the trigger state for this iteration; `last_delivered` is
    /// the stream's most recently delivered payload, used as the replay source
    /// when a repeat fault starts.
    pub(crate) fn apply(
        &mut self,
        buf: Bytes,
        active: bool,
        last_delivered: Option<&Bytes>,
    ) -> Applied {
        match self.fault {
            Fault::CorruptionBitFlip {
                byte_index,
                bit_to_flip,
            } => {
                if !active {
                    return Applied::Unchanged(buf);
                }
                match flip_bit(&buf, byte_index, bit_to_flip) {
                    Some(flipped) => Applied::Corrupted(flipped),
                    None => Applied::CorruptionSkipped(buf),
                }
            }
            Fault::Drop { .. } => {
                if self.remaining == 0 {
                    return Applied::Unchanged(buf);
                }
                self.remaining -= 1;
                Applied::Dropped
            }
            Fault::Repeat { .. } => {
                if self.remaining == 0 {
                    return Applied::Unchanged(buf);
                }
                self.remaining -= 1;
                let replay = self
                    .captured
                    .get_or_insert_with(|| last_delivered.cloned().unwrap_or_else(|| buf.clone()))
                    .clone();
                if self.remaining == 0 {
                    self.captured = None;
                }
                Applied::Repeated(replay)
            }
        }
    }
}
