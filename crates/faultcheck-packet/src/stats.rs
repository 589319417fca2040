//! # Stream statistics
//!
//! Per-stream counters kept by the controller. Serializable so simulation
//! reports can embed them as JSON.

use serde::Serialize;

/// Counters for one fault-injected stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    /// Packets passed to `add_packet`.
    pub submitted: u64,
    /// Packets handed out by `get_packet`.
    pub delivered: u64,
    /// Packets suppressed by a drop fault.
    pub dropped: u64,
    /// Iterations where a repeat fault replaced the input.
    pub repeated: u64,
    /// Bit flips applied, counted per fault. A flipped buffer that a later
    /// drop or repeat discards in the same iteration still counts.
    pub corrupted: u64,
    /// Bit flips skipped because the byte index was past the packet end.
    pub corruptions_skipped: u64,
    /// Packets waiting in the queue.
    pub queued: u64,
    /// Queued packets evicted because the queue was full.
    pub overflowed: u64,
}

impl StreamStats {
    /// Fraction of submitted packets that were dropped.
    pub fn drop_rate(&self) -> f64 {
        if self.submitted == 0 {
            0.0
        } else {
            self.dropped as f64 / self.submitted as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_rate_handles_empty_stream() {
        assert_eq!(StreamStats::default().drop_rate(), 0.0);
    }

    #[test]
    fn drop_rate_ratio() {
        let stats = StreamStats {
            submitted: 4,
            dropped: 1,
            ..Default::default()
        };
        assert!((stats.drop_rate() - 0.25).abs() < f64::EPSILON);
    }
}
