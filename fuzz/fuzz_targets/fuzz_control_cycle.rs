//! Fuzz target: full control cycle
//!
//! Drives `ChargeService` with arbitrary raw samples, ISR fault bits and
//! commands, and verifies after every step:
//! - No panics
//! - Contactors are open and limits are zero whenever a critical fault is
//!   active or the state is `Fault`
//! - Reset never succeeds while a critical fault is active
//!
//! cargo fuzz run fuzz_control_cycle

#![no_main]

use chargectl::app::commands::AppCommand;
use chargectl::app::events::AppEvent;
use chargectl::app::ports::{ActuatorPort, EventSink, SensorPort};
use chargectl::app::service::ChargeService;
use chargectl::config::SystemConfig;
use chargectl::error::FaultKind;
use chargectl::faults::FaultLatch;
use chargectl::fsm::ChargeState;
use chargectl::fsm::context::ActuatorCmd;
use chargectl::sensors::RawSample;
use libfuzzer_sys::fuzz_target;

static LATCH: FaultLatch = FaultLatch::new();

struct Bench {
    next: RawSample,
    contactors: bool,
    applied: ActuatorCmd,
}

impl SensorPort for Bench {
    fn read_raw(&mut self) -> RawSample {
        self.next
    }
}

impl ActuatorPort for Bench {
    fn apply(&mut self, cmd: &ActuatorCmd) {
        self.applied = *cmd;
    }

    fn set_contactors(&mut self, closed: bool) {
        self.contactors = closed;
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(mut svc) = ChargeService::new(SystemConfig::default()) else {
        return;
    };
    LATCH.take();
    svc.attach_latch(&LATCH);

    let mut bench = Bench {
        next: RawSample::default(),
        contactors: false,
        applied: ActuatorCmd::ZERO,
    };
    svc.start(&mut bench, &mut Discard);

    // 14-byte records: 3 × f32, flags, op.
    for rec in data.chunks_exact(14) {
        let f = |i: usize| f32::from_le_bytes([rec[i], rec[i + 1], rec[i + 2], rec[i + 3]]);
        let flags = rec[12];
        bench.next = RawSample {
            voltage: f(0),
            current: f(4),
            temp_c: f(8),
            charger_connected: flags & 0x80 != 0,
        };
        for kind in FaultKind::ALL {
            if flags & kind.mask() != 0 && flags & 0x40 != 0 {
                LATCH.raise(kind);
            }
        }

        match rec[13] % 8 {
            0 => {
                let critical = svc.faults().should_open_contactors();
                let r = svc.handle_command(AppCommand::Reset, &mut bench, &mut Discard);
                assert!(!(critical && r.is_ok()));
            }
            1 => {
                let kind = FaultKind::ALL[usize::from(rec[12]) % FaultKind::COUNT];
                let _ = svc.handle_command(AppCommand::ClearFault(kind), &mut bench, &mut Discard);
            }
            _ => {
                svc.tick(&mut bench, &mut Discard);
            }
        }

        if svc.faults().should_open_contactors() || svc.state() == ChargeState::Fault {
            assert!(!bench.contactors);
            assert!(bench.applied.is_zero());
        }
    }
});
