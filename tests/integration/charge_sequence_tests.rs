//! Integration tests for the nominal charge sequence through the full
//! service pipeline: scripted samples in, actuator calls and events out.

use super::mock_hw::{ActuatorCall, MockHardware, make_service, sample};

use chargectl::app::commands::AppCommand;
use chargectl::app::events::AppEvent;
use chargectl::config::SystemConfig;
use chargectl::fsm::ChargeState;
use chargectl::fsm::context::ActuatorCmd;

#[test]
fn depleted_pack_runs_full_cc_cv_sequence() {
    let (mut svc, mut sink) = make_service(SystemConfig::default());
    let mut hw = MockHardware::new(sample(4.2, 0.4, 25.0));
    hw.queue(sample(2.5, 0.0, 25.0));
    hw.queue(sample(2.9, 0.5, 25.0));
    hw.queue(sample(3.0, 0.5, 25.0));
    hw.queue(sample(4.2, 10.0, 25.0));
    hw.queue(sample(4.2, 0.6, 25.0));

    let cmd = svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::Precharge);
    assert_eq!(cmd, ActuatorCmd::new(0.5, 4.2));

    let cmd = svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::Precharge);
    assert_eq!(cmd, ActuatorCmd::new(0.5, 4.2));

    let cmd = svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::ConstantCurrent);
    assert_eq!(cmd, ActuatorCmd::new(10.0, 4.2));

    let cmd = svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::ConstantVoltage);
    assert_eq!(cmd, ActuatorCmd::new(10.0, 4.2));

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::ConstantVoltage);

    // Steady sample now: 0.4 A is below termination.
    let cmd = svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::Complete);
    assert!(cmd.is_zero());

    for _ in 0..50 {
        assert!(svc.tick(&mut hw, &mut sink).is_zero());
    }
    assert_eq!(svc.state(), ChargeState::Complete);

    let transitions: Vec<(ChargeState, ChargeState)> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (ChargeState::Idle, ChargeState::Precharge),
            (ChargeState::Precharge, ChargeState::ConstantCurrent),
            (ChargeState::ConstantCurrent, ChargeState::ConstantVoltage),
            (ChargeState::ConstantVoltage, ChargeState::Complete),
        ]
    );
    assert_eq!(svc.diagnostics().transitions(), 4);
}

#[test]
fn healthy_pack_skips_precharge() {
    let (mut svc, mut sink) = make_service(SystemConfig::default());
    let mut hw = MockHardware::new(sample(3.6, 0.0, 25.0));

    let cmd = svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::ConstantCurrent);
    assert_eq!(cmd, ActuatorCmd::new(10.0, 4.2));
}

#[test]
fn idle_without_charger_stays_idle() {
    let (mut svc, mut sink) = make_service(SystemConfig::default());
    let mut steady = sample(3.6, 0.0, 25.0);
    steady.charger_connected = false;
    let mut hw = MockHardware::new(steady);

    for _ in 0..20 {
        assert!(svc.tick(&mut hw, &mut sink).is_zero());
    }
    assert_eq!(svc.state(), ChargeState::Idle);
    assert_eq!(svc.cycles_in_state(), 20);
    assert!(sink.events.is_empty());
}

#[test]
fn contactors_close_before_first_non_zero_limit() {
    let (mut svc, mut sink) = make_service(SystemConfig::default());
    let mut hw = MockHardware::new(sample(3.6, 0.0, 25.0));
    svc.tick(&mut hw, &mut sink);

    assert_eq!(
        hw.calls,
        vec![
            ActuatorCall::Contactors(true),
            ActuatorCall::Apply(ActuatorCmd::new(10.0, 4.2)),
        ]
    );
    assert!(svc.contactors_closed());
}

#[test]
fn reset_from_complete_starts_a_new_session() {
    let (mut svc, mut sink) = make_service(SystemConfig::default());
    let mut hw = MockHardware::new(sample(4.2, 0.2, 25.0));
    hw.queue(sample(3.6, 0.0, 25.0));
    hw.queue(sample(4.2, 5.0, 25.0));

    svc.tick(&mut hw, &mut sink);
    svc.tick(&mut hw, &mut sink);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::Complete);

    svc.handle_command(AppCommand::Reset, &mut hw, &mut sink)
        .unwrap();
    assert_eq!(svc.state(), ChargeState::Idle);
    assert_eq!(hw.last_applied(), Some(ActuatorCmd::ZERO));

    hw.queue(sample(3.9, 0.2, 25.0));
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::ConstantCurrent);
}

#[test]
fn custom_profile_thresholds_are_honoured() {
    let mut cfg = SystemConfig::default();
    cfg.profile.precharge_exit_v = 3.3;
    cfg.profile.fast_charge_current_a = 4.0;
    cfg.profile.cv_max_current_a = 4.0;
    let (mut svc, mut sink) = make_service(cfg);
    let mut hw = MockHardware::new(sample(3.2, 0.0, 25.0));

    let cmd = svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::Precharge);
    assert_eq!(cmd.current_limit, 0.5);

    hw.steady = sample(3.3, 0.5, 25.0);
    let cmd = svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::ConstantCurrent);
    assert_eq!(cmd, ActuatorCmd::new(4.0, 4.2));
}
