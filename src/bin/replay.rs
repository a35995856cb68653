use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use chainmap::{
    ReplayError,
    replay::{ReplayOptions, replay_trace},
    trace::parse_trace,
};
use clap::Parser;
use collections::{CapacityLadder, TableConfig};
use log::{error, info};

/// Replays trace files against the chained hash map and a reference map
#[derive(Parser, Debug)]
struct Args {
    /// Allowed bucket counts, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [209, 1021, 2039])]
    capacities: Vec<usize>,

    /// Grow once the load factor goes above this
    #[arg(short, long, default_value_t = 0.75)]
    upper: f32,

    /// Shrink once the load factor goes below this
    #[arg(short, long, default_value_t = 0.20)]
    lower: f32,

    /// Also check a copy of the replayed table
    #[arg(short = 'c', long)]
    copy: bool,

    /// Also check a table assigned from the replayed one
    #[arg(short = 'a', long)]
    assignment: bool,

    /// Also walk the table through its whole capacity ladder
    #[arg(short = 'd', long)]
    dynamic: bool,

    #[arg(required = true)]
    traces: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::builder().init();
    let args = Args::parse();

    let config = match CapacityLadder::new(args.capacities.iter().copied())
        .and_then(|ladder| TableConfig::new(ladder, args.upper, args.lower))
    {
        Ok(config) => config,
        Err(e) => {
            error!(target: "main", "{}", ReplayError::from(e));
            return ExitCode::FAILURE;
        }
    };
    info!(target: "main", "table config: {config:?}");

    let options = ReplayOptions {
        copy: args.copy,
        assignment: args.assignment,
        dynamic: args.dynamic,
    };

    let mut all_passed = true;
    for path in &args.traces {
        match run(path, &config, options) {
            Ok(passed) => all_passed &= passed,
            Err(e) => {
                error!(target: "main", "{}: {e}", path.display());
                println!("Trace file: {}\nfailed: {e}\n", path.display());
                all_passed = false;
            }
        }
    }

    if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(path: &Path, config: &TableConfig, options: ReplayOptions) -> Result<bool, ReplayError> {
    let src = std::fs::read_to_string(path)?;
    let commands = parse_trace(&src)?;

    let report = replay_trace(&path.display().to_string(), &commands, config, options)?;
    print!("{report}");

    Ok(report.all_passed())
}
