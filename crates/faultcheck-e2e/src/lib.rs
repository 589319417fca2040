//! # faultcheck-e2e
//!
//! End-to-end protection for small fixed-size payloads.
//!
//! The sender appends an 8-bit sequence counter and a CRC-16 to every payload;
//! the receiver recomputes the CRC and compares sequence numbers to classify
//! each frame as fresh, lost-some, repeated, out of sequence or corrupted.
//!
//! ## Frame layout
//!
//! ```text
//! +----------------------+-------+-------------------+
//! | data (data_size)     | seq   | crc16 (big endian)|
//! +----------------------+-------+-------------------+
//!                         1 byte   2 bytes
//! ```
//!
//! The CRC covers the data and the sequence byte.
//!
//! ## Crate structure
//!
//! - [`crc`] — CRC-16/XMODEM
//! - [`protection`] — Configuration, sender, receiver and check results

pub mod crc;
pub mod protection;

pub use protection::{E2eConfig, E2eError, E2eReceiver, E2eResult, E2eSender, E2E_OVERHEAD_SIZE};
