use faultcheck_packet::plan::StreamPlan;
use faultcheck_packet::{Fault, FaultPlan, Trigger};
use rand::rngs::StdRng;
use rand::RngExt as _;
use rand::SeedableRng;

/// Bounds for randomly generated fault plans.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub seed: u64,
    /// Stream the generated plans target.
    pub stream: String,
    /// Upper bound for trigger iteration counts.
    pub max_trigger_iterations: u64,
    /// Upper bound for the duration after trigger.
    pub max_duration: u64,
    /// Faults per plan, at least one.
    pub max_faults: usize,
    /// Upper bound for drop/repeat packet counts.
    pub max_packets: u32,
    /// Bit flips target byte indexes below this bound. Setting it past the
    /// frame size exercises out-of-range corruption.
    pub byte_index_bound: usize,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            stream: crate::config::DEFAULT_STREAM.to_string(),
            max_trigger_iterations: 20,
            max_duration: 10,
            max_faults: 3,
            max_packets: 5,
            byte_index_bound: 6,
        }
    }
}

/// Deterministic random fault plan generator.
///
/// Given a seed, produces a reproducible sequence of [`FaultPlan`]s with a
/// random trigger (or none), an optional duration and one to `max_faults`
/// faults.
#[derive(Debug)]
pub struct ScenarioGenerator {
    cfg: ScenarioConfig,
    rng: StdRng,
}

impl ScenarioGenerator {
    pub fn new(cfg: ScenarioConfig) -> Self {
        let rng = StdRng::seed_from_u64(cfg.seed);
        Self { cfg, rng }
    }

    pub fn next_plan(&mut self) -> FaultPlan {
        let mut stream = StreamPlan::new(self.cfg.stream.clone());

        let iterations = self.rng.random_range(0..=self.cfg.max_trigger_iterations);
        stream.trigger = match self.rng.random_range(0..3u8) {
            0 => None,
            1 => Some(Trigger::OnceAfter { iterations }),
            _ => Some(Trigger::After { iterations }),
        };
        if self.rng.random::<bool>() {
            stream.duration = Some(self.rng.random_range(0..=self.cfg.max_duration));
        }

        let count = self.rng.random_range(1..=self.cfg.max_faults.max(1));
        for _ in 0..count {
            let fault = self.random_fault();
            stream.faults.push(fault);
        }

        FaultPlan::default().with_stream(stream)
    }

    pub fn plans(&mut self, n: usize) -> Vec<FaultPlan> {
        (0..n).map(|_| self.next_plan()).collect()
    }

    fn random_fault(&mut self) -> Fault {
        let packets = self.rng.random_range(1..=self.cfg.max_packets.max(1));
        match self.rng.random_range(0..3u8) {
            0 => Fault::CorruptionBitFlip {
                byte_index: self.rng.random_range(0..self.cfg.byte_index_bound.max(1)),
                bit_to_flip: self.rng.random_range(0..8u8),
            },
            1 => Fault::Drop {
                num_packets: packets,
            },
            _ => Fault::Repeat {
                num_packets: packets,
            },
        }
    }
}
