use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use chrono::Local;
use clap::Parser;
use faultlib::config::SimulationConfig;
use faultlib::results::{CsvFileSink, ResultsSink};
use faultlib::simulator::Simulator;
use faultlib::util::find_result_files;
use faultlib::Error;
use log::error;

// Exit code when the results file can't be created or written
const OUTPUT_FAILURE_EXIT_CODE: u8 = 255;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Monte Carlo comparison of LRU, FIFO and Clock page replacement"))]
struct Args {
    /// JSON configuration file, every field is optional
    config: Option<PathBuf>,

    #[arg(long)]
    trials: Option<u64>,

    #[arg(long)]
    trace_length: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    threads: Option<usize>,

    /// Directory the results file is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Also print the results as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

impl Args {
    fn to_config(&self) -> Result<SimulationConfig, Error> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_path(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(trials) = self.trials {
            config.trials = trials;
        }
        if let Some(trace_length) = self.trace_length {
            config.trace_length = trace_length;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_output_failure() => {
            println!("ERROR: {e}");
            ExitCode::from(OUTPUT_FAILURE_EXIT_CODE)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    let start = Instant::now();
    // The file is named after the time the run started, not when it finished
    let started = Local::now().naive_local();
    let config = args.to_config()?;
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
        match find_result_files(&args.output_dir) {
            Ok(earlier) => {
                for file in earlier {
                    println!("Earlier result from {}: {}", file.started, file.path.display());
                }
            }
            Err(e) => error!("Couldn't list earlier results in {}: {e}", args.output_dir.display()),
        }
    }
    let mut simulator = Simulator::new(&config);
    let result = simulator.run();
    let mut sink = CsvFileSink::new(&args.output_dir, &started);
    sink.write_results(result)?;
    println!("Results written to {}", sink.path().display());
    if args.json {
        match serde_json::to_string_pretty(result) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("Couldn't serialise the output {e}"),
        }
    }
    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes configuration and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    Ok(())
}
