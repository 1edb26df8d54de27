//! Integration tests for the fault path: critical faults override the
//! charge sequence, contactors open, and recovery requires an explicit
//! reset once the faults are gone.

use super::mock_hw::{ActuatorCall, MockHardware, RecordingSink, make_service, sample};

use chargectl::app::commands::AppCommand;
use chargectl::app::events::AppEvent;
use chargectl::app::service::ChargeService;
use chargectl::config::SystemConfig;
use chargectl::error::{Error, FaultKind};
use chargectl::faults::FaultLatch;
use chargectl::fsm::ChargeState;
use chargectl::fsm::context::ActuatorCmd;

/// A service in constant current with the call log and events cleared.
fn charging() -> (ChargeService, RecordingSink, MockHardware) {
    let (mut svc, mut sink) = make_service(SystemConfig::default());
    let mut hw = MockHardware::new(sample(3.8, 10.0, 30.0));
    hw.queue(sample(3.8, 0.0, 25.0));
    svc.tick(&mut hw, &mut sink);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::ConstantCurrent);
    sink.clear();
    hw.calls.clear();
    (svc, sink, hw)
}

#[test]
fn over_temp_forces_fault_in_the_same_cycle() {
    let (mut svc, mut sink, mut hw) = charging();
    hw.steady = sample(3.8, 10.0, 50.0);

    let cmd = svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::Fault);
    assert!(cmd.is_zero());
    assert!(svc.faults().is_active(FaultKind::OverTemp));

    // Limits drop to zero before the contactors open.
    assert_eq!(
        hw.calls,
        vec![
            ActuatorCall::Apply(ActuatorCmd::ZERO),
            ActuatorCall::Contactors(false),
        ]
    );
    assert!(!svc.contactors_closed());

    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::FaultRaised {
                kind: FaultKind::OverTemp,
                ..
            }
        )),
        1
    );
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ContactorsOpened { .. })),
        1
    );
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::StateChanged {
                from: ChargeState::ConstantCurrent,
                to: ChargeState::Fault
            }
        )),
        1
    );
}

#[test]
fn fault_overrides_every_charging_state() {
    for (steady, expected) in [
        (sample(2.5, 0.0, 25.0), ChargeState::Precharge),
        (sample(3.8, 0.0, 25.0), ChargeState::ConstantCurrent),
    ] {
        let (mut svc, mut sink) = make_service(SystemConfig::default());
        let mut hw = MockHardware::new(steady);
        svc.tick(&mut hw, &mut sink);
        assert_eq!(svc.state(), expected);

        hw.steady = sample(4.4, 0.0, 25.0);
        // Voltage slew limit is 5 V per call; both steps stay inside it.
        let cmd = svc.tick(&mut hw, &mut sink);
        assert_eq!(svc.state(), ChargeState::Fault);
        assert!(cmd.is_zero());
        assert!(svc.faults().is_active(FaultKind::OverVoltage));
    }
}

#[test]
fn under_voltage_from_idle() {
    let (mut svc, mut sink) = make_service(SystemConfig::default());
    let mut hw = MockHardware::new(sample(1.5, 0.0, 25.0));
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::Fault);
    assert!(svc.faults().is_active(FaultKind::UnderVoltage));
    assert!(!hw.contactors_closed());
}

#[test]
fn fault_state_is_absorbing_after_conditions_clear() {
    let (mut svc, mut sink, mut hw) = charging();
    hw.steady = sample(3.8, 0.0, 50.0);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::Fault);

    hw.steady = sample(3.8, 0.0, 25.0);
    let clear_cycles = svc.config().protection.fault_clear_cycles;
    for _ in 0..clear_cycles {
        svc.tick(&mut hw, &mut sink);
    }
    assert!(svc.faults().is_empty());
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::FaultCleared {
                kind: FaultKind::OverTemp,
                ..
            }
        )),
        1
    );

    for _ in 0..100 {
        assert!(svc.tick(&mut hw, &mut sink).is_zero());
    }
    assert_eq!(svc.state(), ChargeState::Fault);
    assert!(!hw.contactors_closed());
}

#[test]
fn reset_refused_until_critical_faults_clear() {
    let (mut svc, mut sink, mut hw) = charging();
    hw.steady = sample(3.8, 0.0, 50.0);
    svc.tick(&mut hw, &mut sink);

    assert_eq!(
        svc.handle_command(AppCommand::Reset, &mut hw, &mut sink),
        Err(Error::ResetInhibited)
    );
    assert_eq!(svc.state(), ChargeState::Fault);

    hw.steady = sample(3.8, 0.0, 25.0);
    for _ in 0..svc.config().protection.fault_clear_cycles {
        svc.tick(&mut hw, &mut sink);
    }
    svc.handle_command(AppCommand::Reset, &mut hw, &mut sink)
        .unwrap();
    assert_eq!(svc.state(), ChargeState::Idle);

    hw.calls.clear();
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::ConstantCurrent);
    assert_eq!(hw.calls.first(), Some(&ActuatorCall::Contactors(true)));
}

#[test]
fn comm_loss_alone_never_opens_contactors() {
    static LATCH: FaultLatch = FaultLatch::new();

    let (mut svc, mut sink, mut hw) = charging();
    svc.attach_latch(&LATCH);
    LATCH.raise(FaultKind::CommLoss);

    let cmd = svc.tick(&mut hw, &mut sink);
    assert!(svc.faults().is_active(FaultKind::CommLoss));
    assert_eq!(svc.state(), ChargeState::ConstantCurrent);
    assert_eq!(cmd, ActuatorCmd::new(10.0, 4.2));
    assert!(svc.contactors_closed());
    assert!(LATCH.pending().is_empty());
}

#[test]
fn latched_isr_fault_holds_until_explicitly_cleared() {
    static LATCH: FaultLatch = FaultLatch::new();

    let (mut svc, mut sink, mut hw) = charging();
    svc.attach_latch(&LATCH);
    LATCH.raise(FaultKind::OverVoltage);

    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::Fault);

    // Readings are fine, but the latched kind stays.
    for _ in 0..500 {
        svc.tick(&mut hw, &mut sink);
    }
    assert!(svc.faults().is_active(FaultKind::OverVoltage));
    assert_eq!(
        svc.handle_command(AppCommand::Reset, &mut hw, &mut sink),
        Err(Error::ResetInhibited)
    );

    svc.handle_command(AppCommand::ClearFault(FaultKind::OverVoltage), &mut hw, &mut sink)
        .unwrap();
    assert!(svc.faults().is_empty());
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::FaultCleared {
                kind: FaultKind::OverVoltage,
                ..
            }
        )),
        1
    );

    svc.handle_command(AppCommand::Reset, &mut hw, &mut sink)
        .unwrap();
    assert_eq!(svc.state(), ChargeState::Idle);
}

#[test]
fn multiple_faults_must_all_clear() {
    let (mut svc, mut sink, mut hw) = charging();
    hw.steady = sample(4.4, 0.0, 50.0);
    svc.tick(&mut hw, &mut sink);
    assert!(svc.faults().is_active(FaultKind::OverVoltage));
    assert!(svc.faults().is_active(FaultKind::OverTemp));

    // Temperature recovers, voltage does not.
    hw.steady = sample(4.4, 0.0, 25.0);
    for _ in 0..svc.config().protection.fault_clear_cycles {
        svc.tick(&mut hw, &mut sink);
    }
    assert!(!svc.faults().is_active(FaultKind::OverTemp));
    assert!(svc.faults().should_open_contactors());
    assert!(svc.handle_command(AppCommand::Reset, &mut hw, &mut sink).is_err());
}

#[test]
fn reset_refused_while_isr_trip_is_pending() {
    static LATCH: FaultLatch = FaultLatch::new();

    let (mut svc, mut sink, mut hw) = charging();
    svc.attach_latch(&LATCH);
    hw.steady = sample(3.8, 0.0, 50.0);
    svc.tick(&mut hw, &mut sink);
    assert_eq!(svc.state(), ChargeState::Fault);

    hw.steady = sample(3.8, 0.0, 25.0);
    for _ in 0..svc.config().protection.fault_clear_cycles {
        svc.tick(&mut hw, &mut sink);
    }
    assert!(svc.faults().is_empty());

    // Trip lands between cycles; nothing has drained it yet.
    LATCH.raise(FaultKind::OverVoltage);
    sink.clear();
    assert_eq!(
        svc.handle_command(AppCommand::Reset, &mut hw, &mut sink),
        Err(Error::ResetInhibited)
    );
    assert_eq!(svc.state(), ChargeState::Fault);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ResetRefused { faults } if faults.is_active(FaultKind::OverVoltage)
    )));
    assert!(LATCH.pending().is_active(FaultKind::OverVoltage));

    svc.tick(&mut hw, &mut sink);
    assert!(svc.faults().is_active(FaultKind::OverVoltage));
    assert!(!hw.contactors_closed());
}
