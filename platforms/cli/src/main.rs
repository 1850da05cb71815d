use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tmsim::{Results, SimulationOptions, SpecLoader, TuringMachine, DEFAULT_MAX_STEPS};
use tracing_subscriber::EnvFilter;

/// Simulates deterministic Turing machines described in a YAML specification.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  tmsim-cli machine.yaml
  tmsim-cli machine.yaml -s 0011 -s 0101 --max-steps 500 --json")]
struct Cli {
    /// Path to the machine specification
    config: PathBuf,

    /// An input string to simulate. Can be repeated.
    /// Defaults to the specification's `simulation_strings`.
    #[clap(short = 's', long = "string")]
    strings: Vec<String>,

    /// Maximum number of steps before a run is suspended
    #[clap(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Do not record or print instantaneous descriptions
    #[clap(long)]
    no_ids: bool,

    /// Print the results as JSON
    #[clap(long)]
    json: bool,

    /// Simulate the input strings on several threads
    #[clap(long)]
    parallel: bool,

    /// Increase log verbosity (-v for debug, -vv for trace). `RUST_LOG` takes precedence.
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let spec = match SpecLoader::load_spec(&cli.config) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let strings = if cli.strings.is_empty() {
        spec.simulation_strings.clone()
    } else {
        cli.strings.clone()
    };

    if strings.is_empty() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "No input strings to simulate. Add 'simulation_strings' to the specification or use --string",
            )
            .exit();
    }

    let options = SimulationOptions {
        max_steps: cli.max_steps,
        capture_trace: !cli.no_ids,
        ..SimulationOptions::default()
    };

    let machine = TuringMachine::new(spec);
    let results = if cli.parallel {
        machine.simulate_parallel(&strings, &options)
    } else {
        machine.simulate(&strings, &options)
    };

    if cli.json {
        match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_results(&results, options.capture_trace);
    }

    ExitCode::SUCCESS
}

/// Installs a stderr logger so stdout stays clean for results.
fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_results(results: &Results, show_ids: bool) {
    for (input, execution) in results {
        let header = format!("String '{input}'");
        let rule = "=".repeat(header.chars().count());

        println!("{rule}");
        println!("{header}");
        println!("{rule}");
        println!(
            "Accepted: {}",
            if execution.accepted { "yes" } else { "no" }
        );
        println!("Reason: {}", execution.reason());
        println!("Steps: {}", execution.steps);

        if show_ids {
            println!("Instantaneous descriptions:");
            for id in &execution.ids {
                println!("{id}");
            }
        }

        println!();
    }
}
