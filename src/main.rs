//! # chargectl-sim
//!
//! Host simulator for the charge controller. Runs the real
//! [`ChargeService`] against a [`SimulatedPack`] at the configured cycle
//! period (in simulated time) and reports the outcome.
//!
//! ```text
//!  JsonConfigFile ──▶ SystemConfig ──▶ ChargeService ◀──▶ SimulatedPack
//!                                            │
//!                                            ▼
//!                                 LogEventSink (+ JSON lines)
//! ```
//!
//! Exits non-zero when the session ends in `Fault`.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use chargectl::adapters::config_file::JsonConfigFile;
use chargectl::adapters::log_sink::LogEventSink;
use chargectl::adapters::sim::{PackModel, SimulatedPack};
use chargectl::app::events::AppEvent;
use chargectl::app::ports::{ConfigPort, EventSink};
use chargectl::app::service::ChargeService;
use chargectl::config::SystemConfig;
use chargectl::fsm::ChargeState;

/// Run a charge session against a simulated pack
#[derive(Parser, Debug)]
#[command(name = "chargectl-sim")]
#[command(version)]
#[command(about = "Simulate a safety-gated CC/CV charge session")]
struct Args {
    /// JSON configuration file. Defaults apply when omitted or missing.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum control cycles to run.
    #[arg(long, default_value_t = 5000)]
    cycles: u64,

    /// Open-circuit voltage of the pack at the start (V).
    #[arg(long, default_value_t = 2.8)]
    initial_voltage: f32,

    /// Start a thermal runaway at this cycle.
    #[arg(long, value_name = "CYCLE")]
    overtemp_at: Option<u64>,

    /// Corrupt the current reading at this cycle.
    #[arg(long, value_name = "CYCLE")]
    glitch_at: Option<u64>,

    /// Emit every application event as a JSON line on stdout.
    #[arg(long)]
    json: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,
}

/// Forwards to the log sink and optionally mirrors events as JSON lines.
///
/// The first failed write (typically a closed pipe) disables the JSON
/// mirror; logging continues.
struct SimSink<W: Write> {
    log: LogEventSink,
    json: Option<W>,
}

impl<W: Write> EventSink for SimSink<W> {
    fn emit(&mut self, event: &AppEvent) {
        self.log.emit(event);
        let Some(out) = self.json.as_mut() else {
            return;
        };
        match serde_json::to_string(event) {
            Ok(line) => {
                if let Err(e) = writeln!(out, "{line}") {
                    warn!("JSON event output disabled, write failed: {e}");
                    self.json = None;
                }
            }
            Err(e) => error!("event serialisation failed: {e}"),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_tracing(&args);

    info!("chargectl-sim v{} starting", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(ChargeState::Fault) => {
            error!("session ended in Fault");
            ExitCode::from(2)
        }
        Ok(state) => {
            info!("session ended in {state}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("FATAL: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ChargeState> {
    let config = match &args.config {
        Some(path) => JsonConfigFile::new(path)
            .load()
            .with_context(|| format!("loading {}", path.display()))?,
        None => SystemConfig::default(),
    };
    let dt = config.cycle_secs();

    let mut svc = ChargeService::new(config).context("building charge service")?;
    let mut pack = SimulatedPack::new(args.initial_voltage, PackModel::default());
    let mut sink = SimSink {
        log: LogEventSink::new(),
        json: args.json.then(io::stdout),
    };

    svc.start(&mut pack, &mut sink);

    for cycle in 1..=args.cycles {
        if args.glitch_at == Some(cycle) {
            pack.inject_glitch();
        }
        if args.overtemp_at == Some(cycle) {
            pack.inject_overtemp();
        }

        svc.tick(&mut pack, &mut sink);

        if matches!(svc.state(), ChargeState::Complete | ChargeState::Fault) {
            break;
        }
        pack.advance(dt);
    }

    let diag = svc.diagnostics().summary();
    info!(
        "{} cycles ({:.1}s simulated), final state {}, faults {}",
        svc.cycle_count(),
        svc.cycle_count() as f32 * dt,
        svc.state(),
        svc.faults()
    );
    info!(
        "transitions={} rejections V/I/T={}/{}/{} pack OCV={:.3}V T={:.1}\u{00b0}C",
        diag.transitions,
        diag.voltage_rejections,
        diag.current_rejections,
        diag.temperature_rejections,
        pack.open_circuit_voltage(),
        pack.temperature()
    );

    Ok(svc.state())
}

fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout is reserved for --json event lines.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}
