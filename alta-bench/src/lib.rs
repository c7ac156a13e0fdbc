//! Host bench for the ALTA freezing apparatus
//!
//! Runs the core trial loop against a simulated Peltier stage and writes
//! trial logs to a directory, one CSV file per trial:
//!
//! - [`config`]: TOML configuration (experiment plus simulation parameters)
//! - [`store`]: filesystem artifact store
//! - [`sim`]: lumped thermal model of the stage and sample
//! - [`ticker`]: simulated and real-time sample clocks
//! - [`display`]: status display rendered through `tracing`
//! - [`stop`]: trial-count and stop-file signals

pub mod config;
pub mod display;
pub mod error;
pub mod sim;
pub mod stop;
pub mod store;
pub mod ticker;

use std::path::PathBuf;

use alta_core::trial::{Apparatus, RunSummary, TrialRunner};
use alta_core::Profile;
use tracing::info;

pub use config::BenchConfig;
pub use error::BenchError;

/// Options for a simulated run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory the trial logs are written to
    pub out_dir: PathBuf,
    /// Stop after this many trials
    pub trials: Option<u32>,
    /// Pace ticks in real time instead of as fast as possible
    pub realtime: bool,
    /// Stop after the current trial once this file exists
    pub stop_file: Option<PathBuf>,
}

/// Run trials of `profile` on a simulated stage
pub fn run_simulated(
    config: &BenchConfig,
    profile: Profile,
    options: &RunOptions,
) -> Result<RunSummary, BenchError> {
    let stage = sim::SimulatedStage::new(&config.sim);
    let apparatus = Apparatus {
        primary: stage.primary_probe(),
        secondary: config.sim.sample_probe.then(|| stage.sample_probe()),
        optical: stage.ldr(),
        actuator: stage.peltier(),
        display: display::TracingDisplay::default(),
    };
    let store = store::FsArtifactStore::open(&options.out_dir)?;
    let ticker = ticker::SimTicker::new(stage.clone(), config.experiment.timing.sample_period_ms)
        .realtime(options.realtime);

    let mut runner = TrialRunner::new(config.experiment.clone(), apparatus, store, ticker)?;
    let mut stop = stop::BenchStop::new(options.trials, options.stop_file.clone());

    info!(
        dir = %options.out_dir.display(),
        seed = config.sim.seed,
        "starting simulated run"
    );
    let summary = runner.run(profile, &mut stop)?;
    Ok(summary)
}
