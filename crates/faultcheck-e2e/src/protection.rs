//! # E2E protection state machines
//!
//! [`E2eSender`] and [`E2eReceiver`] each own their half of the protection
//! state, so one channel's sender and receiver can live on different sides of
//! a fault-injected link.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::crc::crc16;

/// Bytes appended to every payload: sequence counter + CRC-16.
pub const E2E_OVERHEAD_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum E2eError {
    #[error("invalid E2E configuration: max_seq_diff={max_seq_diff}, data_size={data_size}")]
    InvalidConfig { max_seq_diff: u8, data_size: u8 },
    #[error("wrong length: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

// ─── Configuration ──────────────────────────────────────────────────────────

/// Protection parameters shared by sender and receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct E2eConfig {
    /// Largest sequence jump still accepted as "some lost".
    pub max_seq_diff: u8,
    /// Payload bytes per frame.
    pub data_size: u8,
}

impl E2eConfig {
    pub fn new(max_seq_diff: u8, data_size: u8) -> Result<Self, E2eError> {
        let config = E2eConfig {
            max_seq_diff,
            data_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Both fields must be non-zero.
    pub fn validate(&self) -> Result<(), E2eError> {
        if self.max_seq_diff == 0 || self.data_size == 0 {
            return Err(E2eError::InvalidConfig {
                max_seq_diff: self.max_seq_diff,
                data_size: self.data_size,
            });
        }
        Ok(())
    }

    /// Size of a protected frame.
    pub fn protected_size(&self) -> usize {
        self.data_size as usize + E2E_OVERHEAD_SIZE
    }

    /// Payload part of a protected frame.
    pub fn data_of<'a>(&self, frame: &'a [u8]) -> &'a [u8] {
        &frame[..(self.data_size as usize).min(frame.len())]
    }

    /// Sequence byte of a protected frame, if the frame is long enough.
    pub fn seq_of(&self, frame: &[u8]) -> Option<u8> {
        frame.get(self.data_size as usize).copied()
    }
}

// ─── Check result ───────────────────────────────────────────────────────────

/// Receiver-side classification of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum E2eResult {
    /// Next frame in sequence.
    Ok,
    /// Valid frame after a gap of at most `max_seq_diff`.
    OkSomeLost,
    /// First valid frame seen by the receiver.
    Initial,
    /// Same sequence number as the previous frame.
    Repetition,
    /// Sequence jump larger than `max_seq_diff`.
    OutOfSequence,
    /// CRC mismatch.
    WrongCrc,
}

impl E2eResult {
    pub const ALL: [E2eResult; 6] = [
        E2eResult::Ok,
        E2eResult::OkSomeLost,
        E2eResult::Initial,
        E2eResult::Repetition,
        E2eResult::OutOfSequence,
        E2eResult::WrongCrc,
    ];

    /// Whether the application may use the frame's data.
    pub fn is_accepted(self) -> bool {
        matches!(self, E2eResult::Ok | E2eResult::OkSomeLost)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            E2eResult::Ok => "ok",
            E2eResult::OkSomeLost => "ok_some_lost",
            E2eResult::Initial => "initial",
            E2eResult::Repetition => "repetition",
            E2eResult::OutOfSequence => "out_of_sequence",
            E2eResult::WrongCrc => "wrong_crc",
        }
    }
}

impl fmt::Display for E2eResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Sender ─────────────────────────────────────────────────────────────────

/// Sending half: appends sequence counter and CRC.
#[derive(Debug, Clone)]
pub struct E2eSender {
    config: E2eConfig,
    seq: u8,
}

impl E2eSender {
    pub fn new(config: E2eConfig) -> Result<Self, E2eError> {
        config.validate()?;
        Ok(E2eSender { config, seq: 0 })
    }

    pub fn config(&self) -> &E2eConfig {
        &self.config
    }

    /// Sequence number carried by the most recent frame (0 before the first).
    pub fn sequence(&self) -> u8 {
        self.seq
    }

    /// Build the protected frame for `data`.
    pub fn protect(&mut self, data: &[u8]) -> Result<Bytes, E2eError> {
        let data_size = self.config.data_size as usize;
        if data.len() != data_size {
            return Err(E2eError::Length {
                expected: data_size,
                actual: data.len(),
            });
        }

        self.seq = self.seq.wrapping_add(1);
        let mut buf = BytesMut::with_capacity(self.config.protected_size());
        buf.put_slice(data);
        buf.put_u8(self.seq);
        let crc = crc16(&buf);
        buf.put_u16(crc);
        Ok(buf.freeze())
    }
}

// ─── Receiver ───────────────────────────────────────────────────────────────

/// Receiving half: verifies CRC and sequence.
#[derive(Debug, Clone)]
pub struct E2eReceiver {
    config: E2eConfig,
    rec_seq: u8,
    initial: bool,
}

impl E2eReceiver {
    pub fn new(config: E2eConfig) -> Result<Self, E2eError> {
        config.validate()?;
        Ok(E2eReceiver {
            config,
            rec_seq: 0,
            initial: true,
        })
    }

    pub fn config(&self) -> &E2eConfig {
        &self.config
    }

    /// Sequence number the receiver currently expects to have seen last.
    pub fn sequence(&self) -> u8 {
        self.rec_seq
    }

    /// Classify `frame`.
    ///
    /// With a bad CRC the carried sequence number cannot be trusted, so the
    /// receiver advances its own counter by one instead of adopting it.
    pub fn check(&mut self, frame: &[u8]) -> Result<E2eResult, E2eError> {
        let expected = self.config.protected_size();
        if frame.len() != expected {
            return Err(E2eError::Length {
                expected,
                actual: frame.len(),
            });
        }

        let data_size = self.config.data_size as usize;
        let seq = frame[data_size];
        let crc_calc = crc16(&frame[..=data_size]);
        let crc_rec = u16::from_be_bytes([frame[data_size + 1], frame[data_size + 2]]);
        let seq_diff = seq.wrapping_sub(self.rec_seq);
        let crc_ok = crc_calc == crc_rec;

        if crc_ok {
            self.rec_seq = seq;
        } else {
            self.rec_seq = self.rec_seq.wrapping_add(1);
        }

        let result = if !crc_ok {
            E2eResult::WrongCrc
        } else if self.initial {
            self.initial = false;
            E2eResult::Initial
        } else if seq_diff == 0 {
            E2eResult::Repetition
        } else if seq_diff > self.config.max_seq_diff {
            E2eResult::OutOfSequence
        } else if seq_diff != 1 {
            E2eResult::OkSomeLost
        } else {
            E2eResult::Ok
        };

        if result != E2eResult::Ok {
            debug!(%result, seq, rec_seq = self.rec_seq, seq_diff, "e2e check");
        }
        Ok(result)
    }
}
