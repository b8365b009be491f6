use std::io::{self, BufRead, BufReader, Write};
use std::process::ExitCode;

use tracing::{error, info, warn};

use upbot::prelude::*;

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let mut dump = false;
    let mut input: Option<String> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" | "help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "--dump" => dump = true,
            _ if arg.starts_with('-') => {
                eprintln!("Unknown option: {arg}");
                print_help();
                return ExitCode::from(2);
            }
            _ => input = Some(arg),
        }
    }

    let cfg = config_from_env();
    let mut sup = match Supervisor::new(cfg) {
        Ok(sup) => sup,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(2);
        }
    };

    let reader: Box<dyn BufRead> = match &input {
        Some(path) => match std::fs::File::open(path) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => {
                error!("Failed to open {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    if let Err(e) = run(&mut sup, reader) {
        error!("I/O error: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        episodes = sup.hierarchy().episode_count(),
        goals = sup.goal_count(),
        "input exhausted"
    );

    if dump {
        let snapshot = SupervisorAdapter::new(&sup).snapshot();
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("Failed to serialize snapshot: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

/// One command code per accepted token. Rejected tokens are logged and skipped.
fn run(sup: &mut Supervisor, reader: Box<dyn BufRead>) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match sup.tick(&line) {
            Ok(tick) => {
                writeln!(out, "{}", tick.command.code())?;
                out.flush()?;
            }
            Err(e) => warn!("Skipping token {:?}: {e}", line.trim()),
        }
    }
    Ok(())
}

fn config_from_env() -> SupervisorConfig {
    let mut cfg = SupervisorConfig::default();

    if let Some(n) = env_usize("UPBOT_SENSORS") {
        cfg.num_sensors = n;
    }
    if let Some(g) = env_usize("UPBOT_GOAL_SENSOR") {
        cfg.goal_sensor = g;
    }
    if let Some(d) = env_usize("UPBOT_MAX_DEPTH") {
        cfg.max_depth = d;
    }
    if let Ok(v) = std::env::var("UPBOT_SEED") {
        match v.trim().parse::<u64>() {
            Ok(seed) => cfg.seed = Some(seed),
            Err(_) => warn!("Ignoring UPBOT_SEED value: {}", v),
        }
    }
    cfg
}

fn env_usize(name: &str) -> Option<usize> {
    let v = std::env::var(name).ok()?;
    match v.trim().parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("Ignoring {} value: {}", name, v);
            None
        }
    }
}

fn print_help() {
    println!("upbot (hierarchical rule learner and route planner)");
    println!("usage:");
    println!("  upbot [--dump] [FILE]");
    println!("  upbot --help");
    println!();
    println!("Reads one sensor token per line (bits, optional timestamp) from FILE or stdin");
    println!("and prints the chosen command code for each accepted token.");
    println!();
    println!("environment:");
    println!("  UPBOT_SENSORS      sensor vector width (default 10)");
    println!("  UPBOT_GOAL_SENSOR  goal bit position (default 0)");
    println!("  UPBOT_MAX_DEPTH    abstraction levels (default 3)");
    println!("  UPBOT_SEED         exploration seed (default: clock)");
}
