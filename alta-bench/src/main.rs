//! `alta-bench`: run the ALTA trial loop on a simulated stage
//!
//! # Usage
//!
//! ```bash
//! alta-bench run --config alta.toml --out runs --trials 10 isothermal --setpoint -15
//! alta-bench run --out runs linear --rate -1
//! alta-bench tune --gain -0.42 --time-constant 124 --dead-time 5
//! alta-bench check-config alta.toml
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use alta_bench::{run_simulated, BenchConfig, RunOptions};
use alta_core::control::{Aggressiveness, FopdtModel};
use alta_core::Profile;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "alta-bench",
    version,
    about = "Automated lag-time apparatus bench",
    long_about = None
)]
struct Args {
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run repeated freezing trials on the simulated stage
    Run(RunArgs),
    /// Compute controller gains from a step-response fit
    Tune(TuneArgs),
    /// Validate a configuration file and print it with defaults filled in
    CheckConfig {
        #[arg(value_name = "FILE")]
        config: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// TOML configuration file; defaults are used when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory trial logs are written to
    #[arg(short, long, value_name = "DIR", default_value = "runs")]
    out: PathBuf,

    /// Stop after this many trials
    #[arg(short = 'n', long)]
    trials: Option<u32>,

    /// Stop after the current trial once this file exists
    #[arg(long, value_name = "FILE")]
    stop_file: Option<PathBuf>,

    /// Override the simulation seed
    #[arg(long)]
    seed: Option<u64>,

    /// Pace the simulation in real time
    #[arg(long, default_value_t = false)]
    realtime: bool,

    #[command(subcommand)]
    profile: ProfileArg,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum ProfileArg {
    /// Hold the stage at a fixed temperature
    Isothermal {
        /// Hold temperature (°C)
        #[arg(long, allow_hyphen_values = true)]
        setpoint: f32,
    },
    /// Cool the stage at a constant rate
    Linear {
        /// Ramp rate (°C/min, negative)
        #[arg(long, allow_hyphen_values = true, default_value_t = -1.0)]
        rate: f32,
    },
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Isothermal { setpoint } => Profile::Isothermal { setpoint },
            ProfileArg::Linear { rate } => Profile::Linear { rate },
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Speed {
    Aggressive,
    Moderate,
    Conservative,
}

impl From<Speed> for Aggressiveness {
    fn from(speed: Speed) -> Self {
        match speed {
            Speed::Aggressive => Aggressiveness::Aggressive,
            Speed::Moderate => Aggressiveness::Moderate,
            Speed::Conservative => Aggressiveness::Conservative,
        }
    }
}

#[derive(clap::Args, Debug)]
struct TuneArgs {
    /// Process gain (°C per duty %)
    #[arg(long, allow_hyphen_values = true, default_value_t = -0.42)]
    gain: f32,

    /// Process time constant (s)
    #[arg(long, default_value_t = 124.0)]
    time_constant: f32,

    /// Dead time (s)
    #[arg(long, default_value_t = 5.0)]
    dead_time: f32,

    /// Closed-loop speed
    #[arg(long, value_enum, default_value_t = Speed::Aggressive)]
    speed: Speed,

    /// Emit PID gains instead of PI
    #[arg(long, default_value_t = false)]
    pid: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let result = match args.command {
        Command::Run(run) => run_command(run),
        Command::Tune(tune) => tune_command(&tune),
        Command::CheckConfig { config } => check_config(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<BenchConfig> {
    match path {
        Some(path) => BenchConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => {
            info!("no configuration file given, using defaults");
            Ok(BenchConfig::default())
        }
    }
}

fn run_command(args: RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.sim.seed = seed;
    }

    let profile = Profile::from(args.profile);
    let options = RunOptions {
        out_dir: args.out,
        trials: args.trials,
        realtime: args.realtime,
        stop_file: args.stop_file,
    };

    let summary = run_simulated(&config, profile, &options).context("simulated run failed")?;
    info!(
        trials = summary.trials,
        frozen = summary.frozen,
        liquid = summary.liquid,
        early = summary.early,
        aborted = summary.aborted,
        "run complete"
    );
    Ok(())
}

fn tune_command(args: &TuneArgs) -> Result<()> {
    let model = FopdtModel {
        gain: args.gain,
        time_constant: args.time_constant,
        dead_time: args.dead_time,
    };
    let tuning = model
        .imc(args.speed.into())
        .map_err(alta_bench::BenchError::from)?;
    let controller = if args.pid {
        tuning.to_pid()
    } else {
        tuning.to_pi()
    };
    info!(tau_c = tuning.tau_c, alpha = tuning.alpha, "imc tuning");

    println!("[controller]");
    println!("k_c = {:.3}", controller.k_c);
    println!("tau_i = {:.3}", controller.tau_i);
    if let Some(tau_d) = controller.tau_d {
        println!("tau_d = {:.3}", tau_d);
    }
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = load_config(Some(path))?;
    print!("{}", config.to_toml()?);
    info!("configuration is valid");
    Ok(())
}
