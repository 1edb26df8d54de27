//! Integration tests for plausibility gating inside the running service:
//! rejected samples never reach the state machine, and a channel that
//! stays implausible escalates to a diagnostic fault.

use super::mock_hw::{MockHardware, make_service, sample};

use chargectl::app::events::AppEvent;
use chargectl::config::SystemConfig;
use chargectl::error::{FaultKind, RejectReason};
use chargectl::fsm::ChargeState;
use chargectl::fsm::context::ActuatorCmd;
use chargectl::sensors::Channel;

#[test]
fn glitch_sequence_holds_last_valid_current() {
    let (mut svc, mut sink) = make_service(SystemConfig::default());
    let mut hw = MockHardware::new(sample(3.8, 60.0, 25.0));
    for current in [10.0, 50.0, 2000.0, f32::NAN, 200.0] {
        hw.queue(sample(3.8, current, 25.0));
    }

    let mut seen = Vec::new();
    for _ in 0..6 {
        svc.tick(&mut hw, &mut sink);
        seen.push(svc.last_frame().current);
    }
    assert_eq!(seen, vec![10.0, 50.0, 50.0, 50.0, 50.0, 60.0]);

    let reasons: Vec<RejectReason> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::SampleRejected {
                channel: Channel::Current,
                reason,
                held,
                ..
            } => {
                assert_eq!(*held, 50.0);
                Some(*reason)
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            RejectReason::OutOfRange,
            RejectReason::NonFinite,
            RejectReason::SlewExceeded,
        ]
    );

    let diag = svc.diagnostics();
    assert_eq!(diag.channel_rejections(Channel::Current), 3);
    assert_eq!(diag.rejections(Channel::Current, RejectReason::NonFinite), 1);
}

#[test]
fn nan_current_in_constant_voltage_does_not_terminate() {
    let (mut svc, mut sink) = make_service(SystemConfig::default());
    let mut hw = MockHardware::new(sample(4.2, 5.0, 25.0));
    svc.tick(&mut hw, &mut sink);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::ConstantVoltage);

    hw.queue(sample(4.2, f32::NAN, 25.0));
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::ConstantVoltage);
    assert_eq!(svc.last_frame().current, 5.0);
}

#[test]
fn implausible_spike_cannot_trip_over_voltage() {
    let (mut svc, mut sink) = make_service(SystemConfig::default());
    let mut hw = MockHardware::new(sample(3.8, 0.0, 25.0));
    svc.tick(&mut hw, &mut sink);

    // 9.9 V is in range but a 6.1 V jump breaks the 5 V slew limit.
    hw.queue(sample(9.9, 0.0, 25.0));
    svc.tick(&mut hw, &mut sink);
    assert!(svc.faults().is_empty());
    assert_eq!(svc.state(), ChargeState::ConstantCurrent);
}

#[test]
fn charge_start_waits_for_every_channel() {
    let (mut svc, mut sink) = make_service(SystemConfig::default());
    // 80 °C from the 0.0 seed breaks the 30 °C slew limit.
    let mut hw = MockHardware::new(sample(3.8, 0.0, 25.0));
    hw.queue(sample(3.8, 0.0, 80.0));

    let cmd = svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::Idle);
    assert!(cmd.is_zero());
    assert!(svc.faults().is_empty());

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::ConstantCurrent);
}

#[test]
fn stale_channel_escalates_to_comm_loss() {
    let mut cfg = SystemConfig::default();
    cfg.protection.stale_reject_limit = 5;
    cfg.protection.fault_clear_cycles = 2;
    let (mut svc, mut sink) = make_service(cfg);
    let mut hw = MockHardware::new(sample(3.8, 1.0, 25.0));
    svc.tick(&mut hw, &mut sink);

    hw.steady = sample(3.8, 1.0, f32::NAN);
    for _ in 0..4 {
        svc.tick(&mut hw, &mut sink);
    }
    assert!(!svc.faults().is_active(FaultKind::CommLoss));

    svc.tick(&mut hw, &mut sink);
    assert!(svc.faults().is_active(FaultKind::CommLoss));
    assert_eq!(svc.state(), ChargeState::ConstantCurrent);
    assert!(svc.contactors_closed());

    hw.steady = sample(3.8, 1.0, 25.0);
    svc.tick(&mut hw, &mut sink);
    svc.tick(&mut hw, &mut sink);
    assert!(svc.faults().is_empty());
}

#[test]
fn baseline_channel_needs_a_measured_value_before_charging() {
    let mut cfg = SystemConfig::default();
    cfg.temperature_channel.baseline = Some(25.0);
    let (mut svc, mut sink) = make_service(cfg);

    // Every reading is too far from the baseline to pass the slew check.
    let mut hw = MockHardware::new(sample(3.8, 0.0, 60.0));
    for _ in 0..1000 {
        assert!(svc.tick(&mut hw, &mut sink).is_zero());
    }
    assert_eq!(svc.state(), ChargeState::Idle);
    assert_eq!(svc.last_frame().temp_c, 25.0);
    assert!(!svc.faults().should_open_contactors());

    hw.steady = sample(3.8, 0.0, 40.0);
    assert_eq!(svc.tick(&mut hw, &mut sink), ActuatorCmd::new(10.0, 4.2));
    assert_eq!(svc.state(), ChargeState::ConstantCurrent);
}
