//! CP/M harness for Z80 instruction exercisers.
//!
//! Usage:
//!   cargo run -p zilog-z80 --features cli --bin zextest --release -- --program zexdoc
//!
//! `prelim` runs the built-in preliminary test. `zexdoc` and `zexall` load
//! `tests/data/<name>.com` from the crate directory; anything else is taken
//! as a path to a .com file. Exerciser output is printed as it arrives.
//! `-v` sends the core's `log` records to stderr (`-vv` for trace).

#![allow(clippy::cast_precision_loss)] // Throughput display only.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};
use zilog_z80::cpm::{CpmMachine, PRELIM};

#[derive(Parser, Debug)]
#[command(about = "Run a CP/M Z80 exerciser and report the result")]
struct Args {
    /// prelim, zexdoc, zexall or a path to a .com file.
    #[arg(long, default_value = "prelim")]
    program: String,

    /// Stop after this many T-states (0 = run to completion).
    #[arg(long, default_value_t = 0)]
    max_tstates: u64,

    /// Log level: -v for debug, -vv for trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(verbose: u8) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log_level(verbose));
    }
}

fn load(program: &str) -> io::Result<Vec<u8>> {
    match program {
        "prelim" => Ok(PRELIM.to_vec()),
        "zexdoc" | "zexall" => {
            let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("tests/data")
                .join(format!("{program}.com"));
            std::fs::read(path)
        }
        path => std::fs::read(path),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let binary = match load(&args.program) {
        Ok(binary) => binary,
        Err(err) => {
            eprintln!("cannot load {}: {err}", args.program);
            return ExitCode::FAILURE;
        }
    };
    let mut machine = match CpmMachine::new(&binary) {
        Ok(machine) => machine,
        Err(err) => {
            eprintln!("{}: {err}", args.program);
            return ExitCode::FAILURE;
        }
    };
    let limit = if args.max_tstates == 0 {
        u64::MAX
    } else {
        args.max_tstates
    };

    eprintln!("Running {}...\n", args.program);
    let start = Instant::now();
    let mut output = String::new();
    let mut stdout = io::stdout();

    while !machine.finished() && machine.t_states() < limit {
        let before = output.len();
        machine.run_slice(|ch| {
            print!("{ch}");
            output.push(ch);
        });
        let flushed = if output.len() == before {
            Ok(())
        } else {
            stdout.flush()
        };
        if let Err(err) = flushed {
            eprintln!("cannot write output: {err}");
            return ExitCode::FAILURE;
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let t_states = machine.t_states();
    eprintln!("\n\nCompleted in {elapsed:.2}s");
    eprintln!(
        "T-states: {t_states} ({:.1} MHz effective)",
        t_states as f64 / elapsed / 1_000_000.0
    );

    let mut failed = output.contains("ERROR");
    if !machine.finished() {
        eprintln!("T-state limit reached before warm boot");
        failed = true;
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
