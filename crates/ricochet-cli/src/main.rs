mod printer;
mod scenario;
mod settings;

use clap::Parser;
use printer::Printer;
use ricochet_core::{trace, ConfigError, HintSession, SessionEvent, SolverBackend};
use scenario::{Scenario, ScenarioError};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Owner tick; also the auto-advance resolution
const TICK: Duration = Duration::from_millis(33);

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the scenario file (JSON)
    scenario: PathBuf,

    /// Hint configuration file; defaults to the user config directory
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Seed for the pre-hint draw
    #[clap(short, long)]
    seed: Option<u64>,

    /// Override the scenario's starting level (0 = random map)
    #[clap(short, long)]
    level: Option<i32>,

    /// Print notifications as NDJSON
    #[clap(long)]
    json: bool,

    /// Dump the trace history to stderr when done
    #[clap(long)]
    trace_history: bool,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    if args.trace_history {
        for line in trace::history_lines() {
            eprintln!("{}", line);
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let scenario = Scenario::from_path(&args.scenario)?;
    let config = settings::load(args.config.as_deref())?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let level_id = args.level.unwrap_or(scenario.level_id);

    let backend: Arc<dyn SolverBackend<String>> = Arc::new(scenario.solver());
    let mut session = HintSession::with_seed(config, backend, seed);

    let started = Instant::now();
    let mut printer = Printer::new(io::stdout().lock(), args.json, started);
    printer.action(&format!("seed {}", seed));
    trace::debug("cli", &format!("scenario loaded: {} steps", scenario.script.len()));

    let initial = SessionEvent::SessionReset {
        level_id,
        board: scenario.start.clone(),
    };
    for note in session.handle(initial, started) {
        printer.emit(&note);
    }

    let end = started + Duration::from_millis(scenario.duration_ms());
    let mut steps = scenario.script.iter().peekable();
    loop {
        let now = Instant::now();
        while let Some(step) = steps.next_if(|s| started + Duration::from_millis(s.at_ms) <= now) {
            printer.action(&step.action.to_string());
            for note in session.handle(step.action.to_event(), now) {
                printer.emit(&note);
            }
        }
        for note in session.handle(SessionEvent::Tick, now) {
            printer.emit(&note);
        }

        if steps.peek().is_none() && now >= end {
            break;
        }
        std::thread::sleep(TICK);
    }

    if session.is_solving() {
        trace::debug("cli", "scenario ended with a solve still running");
    }
    Ok(())
}
