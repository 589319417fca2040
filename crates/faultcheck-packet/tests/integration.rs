//! # Integration tests: simulation loop ↔ controller
//!
//! A lockstep loop submits one packet and reads once per iteration, the way a
//! sensor/consumer simulation drives the controller.

use bytes::Bytes;
use faultcheck_packet::plan::StreamPlan;
use faultcheck_packet::{FaultController, FaultError, FaultPlan, Trigger};

const STREAM: &str = "airbag";

// ─── Helpers ────────────────────────────────────────────────────────────────

/// Run `inputs` through the controller in lockstep and collect the outputs.
fn lockstep(ctrl: &mut FaultController, inputs: &[&[u8]]) -> Vec<Option<Bytes>> {
    inputs
        .iter()
        .map(|data| {
            ctrl.add_packet(STREAM, data);
            ctrl.get_packet(STREAM).expect("stream has packets")
        })
        .collect()
}

fn delivered(outputs: &[Option<Bytes>]) -> Vec<bool> {
    outputs.iter().map(Option::is_some).collect()
}

// ─── Lookup ─────────────────────────────────────────────────────────────────

#[test]
fn never_configured_stream_is_not_found() {
    let mut ctrl = FaultController::new();
    ctrl.add_packet("other", &[1]);
    for id in ["airbag", "", "AIRBAG"] {
        assert!(matches!(
            ctrl.get_packet(id),
            Err(FaultError::NotFound { .. })
        ));
    }
}

// ─── Triggers ───────────────────────────────────────────────────────────────

#[test]
fn once_after_three_corrupts_only_third_iteration() {
    let mut ctrl = FaultController::new();
    ctrl.add_fault_corruption_bit_flip(STREAM, 0, 7).unwrap();
    ctrl.set_trigger_once_after_iterations(STREAM, 3);

    let outputs = lockstep(&mut ctrl, &[&[0x00][..]; 8]);
    let corrupted: Vec<bool> = outputs.iter().map(|o| o.as_ref().unwrap()[0] != 0).collect();
    assert_eq!(
        corrupted,
        vec![false, false, false, true, false, false, false, false]
    );
}

#[test]
fn after_three_corrupts_every_later_iteration() {
    let mut ctrl = FaultController::new();
    ctrl.add_fault_corruption_bit_flip(STREAM, 0, 7).unwrap();
    ctrl.set_trigger_after_iterations(STREAM, 3);

    let outputs = lockstep(&mut ctrl, &[&[0x00][..]; 8]);
    let corrupted: Vec<bool> = outputs.iter().map(|o| o.as_ref().unwrap()[0] != 0).collect();
    assert_eq!(
        corrupted,
        vec![false, false, false, true, true, true, true, true]
    );
}

#[test]
fn duration_after_trigger_closes_window() {
    let mut ctrl = FaultController::new();
    ctrl.add_fault_corruption_bit_flip(STREAM, 1, 0).unwrap();
    ctrl.set_trigger_once_after_iterations(STREAM, 2);
    ctrl.set_duration_after_trigger(STREAM, 3);

    let outputs = lockstep(&mut ctrl, &[&[0, 0][..]; 8]);
    let corrupted: Vec<bool> = outputs.iter().map(|o| o.as_ref().unwrap()[1] != 0).collect();
    assert_eq!(
        corrupted,
        vec![false, false, true, true, true, true, false, false]
    );
}

// ─── Drop / Repeat ──────────────────────────────────────────────────────────

#[test]
fn drop_two_after_one() {
    let mut ctrl = FaultController::new();
    ctrl.add_fault_drop(STREAM, 2).unwrap();
    ctrl.set_trigger_after_iterations(STREAM, 1);

    let outputs = lockstep(&mut ctrl, &[&[0x01][..]; 3]);
    assert_eq!(outputs[0].as_deref(), Some(&[0x01][..]));
    assert_eq!(outputs[1], None);
    assert_eq!(outputs[2], None);
}

#[test]
fn drop_reports_exactly_n_gaps_then_resumes() {
    for n in 1..6u32 {
        let mut ctrl = FaultController::new();
        ctrl.add_fault_drop(STREAM, n).unwrap();
        ctrl.set_trigger_after_iterations(STREAM, 2);

        let outputs = lockstep(&mut ctrl, &[&[0xAB][..]; 12]);
        let mut expected = vec![true; 12];
        for slot in expected.iter_mut().skip(2).take(n as usize) {
            *slot = false;
        }
        assert_eq!(delivered(&outputs), expected, "n = {n}");
    }
}

#[test]
fn repeat_returns_same_bytes_despite_new_input() {
    let mut ctrl = FaultController::new();
    ctrl.add_fault_repeat(STREAM, 3).unwrap();
    ctrl.set_trigger_once_after_iterations(STREAM, 1);

    let inputs: Vec<Vec<u8>> = (0..6u8).map(|i| vec![i, i.wrapping_mul(3)]).collect();
    let refs: Vec<&[u8]> = inputs.iter().map(Vec::as_slice).collect();
    let outputs = lockstep(&mut ctrl, &refs);

    let repeated: Vec<&[u8]> = outputs[1..4].iter().map(|o| o.as_deref().unwrap()).collect();
    assert!(repeated.iter().all(|p| *p == &inputs[0][..]));
    assert_eq!(outputs[4].as_deref(), Some(&inputs[4][..]));
}

#[test]
fn drop_then_repeat_in_registration_order() {
    let mut ctrl = FaultController::new();
    ctrl.add_fault_drop(STREAM, 1).unwrap();
    ctrl.add_fault_repeat(STREAM, 2).unwrap();
    ctrl.set_trigger_once_after_iterations(STREAM, 1);

    let outputs = lockstep(&mut ctrl, &[&[0], &[1], &[2], &[3], &[4]]);
    let values: Vec<Option<u8>> = outputs.iter().map(|o| o.as_ref().map(|b| b[0])).collect();
    // Iteration 1 is dropped; the repeat then replays the last delivered packet.
    assert_eq!(values, vec![Some(0), None, Some(0), Some(0), Some(4)]);
}

// ─── Corruption ─────────────────────────────────────────────────────────────

#[test]
fn same_bit_flip_twice_restores_payload() {
    let mut ctrl = FaultController::new();
    ctrl.add_fault_corruption_bit_flip(STREAM, 2, 5).unwrap();
    ctrl.add_fault_corruption_bit_flip(STREAM, 2, 5).unwrap();

    let outputs = lockstep(&mut ctrl, &[&[9, 8, 7, 6]]);
    assert_eq!(outputs[0].as_deref(), Some(&[9, 8, 7, 6][..]));
    assert_eq!(ctrl.stream_stats(STREAM).unwrap().corrupted, 2);
}

// ─── Removal ────────────────────────────────────────────────────────────────

#[test]
fn remove_identifier_behaves_as_unconfigured() {
    let mut ctrl = FaultController::new();
    ctrl.add_fault_drop(STREAM, 100).unwrap();
    ctrl.add_fault_corruption_bit_flip(STREAM, 0, 0).unwrap();
    ctrl.set_trigger_after_iterations(STREAM, 0);
    lockstep(&mut ctrl, &[&[1][..]; 3]);

    ctrl.remove_all_faults_identifier(STREAM);
    let outputs = lockstep(&mut ctrl, &[&[1], &[2], &[3]]);
    let values: Vec<Option<u8>> = outputs.iter().map(|o| o.as_ref().map(|b| b[0])).collect();
    assert_eq!(values, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn remove_all_faults_forgets_every_stream() {
    let mut ctrl = FaultController::new();
    ctrl.add_packet("a", &[1]);
    ctrl.add_packet("b", &[2]);
    ctrl.remove_all_faults();
    assert!(ctrl.get_packet("a").is_err());
    assert!(ctrl.get_packet("b").is_err());
}

// ─── Plans ──────────────────────────────────────────────────────────────────

#[test]
fn plan_from_toml_drives_controller() {
    let plan = FaultPlan::from_toml_str(
        r#"
        [[streams]]
        id = "airbag"
        trigger = { kind = "after", iterations = 1 }

        [[streams.faults]]
        kind = "drop"
        num_packets = 2
        "#,
    )
    .unwrap();

    let mut ctrl = FaultController::new();
    plan.apply(&mut ctrl).unwrap();
    let outputs = lockstep(&mut ctrl, &[&[0x01][..]; 4]);
    assert_eq!(delivered(&outputs), vec![true, false, false, true]);
}

#[test]
fn plan_leaves_unmentioned_streams_alone() {
    let mut ctrl = FaultController::new();
    ctrl.add_fault_drop("keep", 1).unwrap();

    FaultPlan::default()
        .with_stream(StreamPlan::new(STREAM).with_trigger(Trigger::OnceAfter { iterations: 0 }))
        .apply(&mut ctrl)
        .unwrap();

    assert_eq!(ctrl.faults("keep").map(|f| f.len()), Some(1));
}
