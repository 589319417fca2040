//! # Channel harness
//!
//! Per iteration: draw a sensor payload, protect it, submit it to the fault
//! controller, then drain and check every frame the controller hands back.
//! The sender's payload history (one slot per 8-bit sequence number) lets the
//! harness tell whether an accepted frame carries the data that was sent.

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::RngExt as _;
use rand::SeedableRng;
use tracing::{info, warn};

use faultcheck_e2e::{E2eReceiver, E2eSender};
use faultcheck_packet::{FaultController, FaultPlan};

use crate::config::{ChannelConfig, SimConfig};
use crate::error::SimError;
use crate::report::ChannelReport;

const SEQ_SLOTS: usize = 256;

pub struct Harness {
    channel: ChannelConfig,
    plan: FaultPlan,
    controller: FaultController,
    sender: E2eSender,
    receiver: E2eReceiver,
    rng: StdRng,
    sent: Vec<Option<Bytes>>,
}

impl Harness {
    pub fn new(channel: ChannelConfig, plan: FaultPlan) -> Result<Self, SimError> {
        let mut controller = FaultController::new();
        plan.apply(&mut controller)?;
        Ok(Harness {
            sender: E2eSender::new(channel.e2e)?,
            receiver: E2eReceiver::new(channel.e2e)?,
            rng: StdRng::seed_from_u64(channel.seed),
            sent: vec![None; SEQ_SLOTS],
            channel,
            plan,
            controller,
        })
    }

    pub fn from_config(config: SimConfig) -> Result<Self, SimError> {
        Self::new(config.channel, config.plan)
    }

    pub fn controller(&self) -> &FaultController {
        &self.controller
    }

    fn sensor_payload(&mut self) -> Vec<u8> {
        (0..self.channel.e2e.data_size)
            .map(|_| self.rng.random::<u8>())
            .collect()
    }

    /// Run the configured number of iterations.
    pub fn run(&mut self) -> Result<ChannelReport, SimError> {
        let stream = self.channel.stream.clone();
        let e2e = self.channel.e2e;
        let mut report = ChannelReport {
            stream: stream.clone(),
            seed: self.channel.seed,
            plan: self.plan.clone(),
            ..Default::default()
        };

        for iteration in 0..self.channel.iterations {
            let data = self.sensor_payload();
            let frame = self.sender.protect(&data)?;
            self.sent[self.sender.sequence() as usize] = Some(Bytes::from(data));
            self.controller.add_packet(&stream, &frame);
            report.submitted += 1;

            while let Some(received) = self.controller.get_packet(&stream)? {
                report.delivered += 1;
                let result = self.receiver.check(&received)?;
                report.record(result);
                if !result.is_accepted() {
                    continue;
                }

                let expected = e2e
                    .seq_of(&received)
                    .and_then(|seq| self.sent[seq as usize].as_deref());
                if expected != Some(e2e.data_of(&received)) {
                    report.undetected_corruptions += 1;
                    warn!(
                        stream = %stream,
                        iteration,
                        %result,
                        frame = ?&received[..],
                        "corrupted frame accepted"
                    );
                }
            }
        }

        report.stream_stats = self.controller.stream_stats(&stream);
        info!(
            stream = %stream,
            submitted = report.submitted,
            delivered = report.delivered,
            accepted = report.accepted,
            undetected = report.undetected_corruptions,
            "channel run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultcheck_e2e::E2eResult;
    use faultcheck_packet::plan::StreamPlan;
    use faultcheck_packet::{Fault, Trigger};

    fn channel(iterations: u64) -> ChannelConfig {
        ChannelConfig {
            iterations,
            ..Default::default()
        }
    }

    #[test]
    fn clean_channel_accepts_everything_after_initial() {
        let mut harness = Harness::new(channel(50), FaultPlan::default()).unwrap();
        let report = harness.run().unwrap();
        assert_eq!(report.submitted, 50);
        assert_eq!(report.delivered, 50);
        assert_eq!(report.count(E2eResult::Initial), 1);
        assert_eq!(report.count(E2eResult::Ok), 49);
        assert!(report.is_sound());
    }

    #[test]
    fn bit_flip_window_yields_wrong_crc() {
        let plan = FaultPlan::default().with_stream(
            StreamPlan::new("airbag")
                .with_trigger(Trigger::After { iterations: 10 })
                .with_duration(4)
                .with_fault(Fault::CorruptionBitFlip {
                    byte_index: 1,
                    bit_to_flip: 6,
                }),
        );
        let report = Harness::new(channel(30), plan).unwrap().run().unwrap();
        assert_eq!(report.count(E2eResult::WrongCrc), 5);
        // The frame after the window is back in sequence.
        assert_eq!(report.count(E2eResult::Ok), 30 - 5 - 1);
        assert!(report.is_sound());
    }

    #[test]
    fn drops_within_max_seq_diff_are_some_lost() {
        let plan = FaultPlan::default().with_stream(
            StreamPlan::new("airbag")
                .with_trigger(Trigger::OnceAfter { iterations: 5 })
                .with_fault(Fault::Drop { num_packets: 1 }),
        );
        let report = Harness::new(channel(20), plan).unwrap().run().unwrap();
        assert_eq!(report.delivered, 19);
        assert_eq!(report.count(E2eResult::OkSomeLost), 1);
        assert_eq!(report.stream_stats.unwrap().dropped, 1);
    }

    #[test]
    fn long_drop_is_out_of_sequence() {
        let plan = FaultPlan::default().with_stream(
            StreamPlan::new("airbag")
                .with_trigger(Trigger::OnceAfter { iterations: 5 })
                .with_fault(Fault::Drop { num_packets: 4 }),
        );
        let report = Harness::new(channel(20), plan).unwrap().run().unwrap();
        assert_eq!(report.count(E2eResult::OutOfSequence), 1);
    }

    #[test]
    fn repeats_are_detected_as_repetition() {
        let plan = FaultPlan::default().with_stream(
            StreamPlan::new("airbag")
                .with_trigger(Trigger::OnceAfter { iterations: 3 })
                .with_fault(Fault::Repeat { num_packets: 2 }),
        );
        let report = Harness::new(channel(12), plan).unwrap().run().unwrap();
        assert_eq!(report.count(E2eResult::Repetition), 2);
        assert!(report.is_sound());
    }

    #[test]
    fn plan_for_other_stream_leaves_channel_clean() {
        let plan = FaultPlan::default().with_stream(
            StreamPlan::new("brake").with_fault(Fault::Drop { num_packets: 3 }),
        );
        let harness = Harness::new(channel(10), plan).unwrap();
        assert_eq!(harness.controller().faults("brake").map(|f| f.len()), Some(1));
        assert_eq!(harness.controller().faults("airbag"), None);
    }
}
