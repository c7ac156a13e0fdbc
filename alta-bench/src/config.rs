//! Bench configuration
//!
//! One TOML file carries the experiment parameters (same tables as the
//! firmware uses) plus a `[sim]` table describing the simulated stage.
//! Missing tables fall back to the reference apparatus defaults.

use std::fs;
use std::path::Path;

use alta_core::ExperimentConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::BenchError;

/// Parameters of the simulated stage and sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed; identical seeds give identical runs
    pub seed: u64,
    /// Room temperature (°C)
    pub ambient: f32,
    /// Start temperature of stage and sample (°C)
    pub initial: f32,
    /// Stage cooling rate at full duty (°C/s)
    pub cooling_rate: f32,
    /// Stage heating rate at full duty (°C/s)
    pub heating_rate: f32,
    /// Stage to room coupling (1/s)
    pub ambient_coupling: f32,
    /// Stage to sample coupling (1/s)
    pub sample_coupling: f32,
    /// Nucleation hazard at `reference_temperature` (1/s)
    pub nucleation_rate: f32,
    /// Temperature the hazard is quoted at (°C)
    pub reference_temperature: f32,
    /// Supercooling per e-fold of hazard (°C)
    pub nucleation_scale: f32,
    /// Stage temperature rise when the sample releases latent heat (°C)
    pub exotherm: f32,
    /// LDR intensity through a clear sample
    pub clear_intensity: f32,
    /// Intensity drop of a fully frozen sample
    pub frozen_drop: f32,
    /// Fraction of the drop reached per second after nucleation
    pub opacity_rate: f32,
    /// Uniform noise amplitude on the probes (°C)
    pub temperature_noise: f32,
    /// Uniform noise amplitude on the LDR
    pub optical_noise: f32,
    /// Whether the in-sample calibration probe is fitted
    pub sample_probe: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            ambient: 20.0,
            initial: 15.0,
            cooling_rate: 1.0,
            heating_rate: 2.0,
            ambient_coupling: 0.02,
            sample_coupling: 0.1,
            nucleation_rate: 0.02,
            reference_temperature: -15.0,
            nucleation_scale: 2.0,
            exotherm: 1.5,
            clear_intensity: 3000.0,
            frozen_drop: 600.0,
            opacity_rate: 0.5,
            temperature_noise: 0.02,
            optical_noise: 5.0,
            sample_probe: true,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), BenchError> {
        let positive = [
            (self.cooling_rate, "cooling_rate"),
            (self.heating_rate, "heating_rate"),
            (self.ambient_coupling, "ambient_coupling"),
            (self.sample_coupling, "sample_coupling"),
            (self.nucleation_scale, "nucleation_scale"),
            (self.opacity_rate, "opacity_rate"),
        ];
        for (value, name) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(BenchError::Sim(name));
            }
        }
        if !(self.nucleation_rate >= 0.0) {
            return Err(BenchError::Sim("nucleation_rate"));
        }
        if !(self.temperature_noise >= 0.0) || !(self.optical_noise >= 0.0) {
            return Err(BenchError::Sim("noise"));
        }
        if !(self.frozen_drop >= 0.0) || !(self.clear_intensity > self.frozen_drop) {
            return Err(BenchError::Sim("clear_intensity"));
        }
        Ok(())
    }
}

/// Complete bench configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    #[serde(flatten)]
    pub experiment: ExperimentConfig,
    pub sim: SimConfig,
}

impl BenchConfig {
    /// Parse a configuration from TOML text without validating it
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        info!(path = %path.display(), "loading configuration");
        let text = fs::read_to_string(path).map_err(|source| BenchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| BenchError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        config.log_summary();
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        self.experiment.validate()?;
        self.sim.validate()
    }

    /// Render back to TOML, defaults filled in
    pub fn to_toml(&self) -> Result<String, BenchError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn log_summary(&self) {
        let e = &self.experiment;
        debug!(
            k_c = e.controller.k_c,
            tau_i = e.controller.tau_i,
            tau_d = ?e.controller.tau_d,
            "controller"
        );
        debug!(
            period_ms = e.timing.sample_period_ms,
            max_wait_ms = e.timing.max_wait_ms,
            soak_ms = e.timing.melt_soak_ms,
            "timing"
        );
        debug!(detector = ?e.detector, "freeze detector");
    }
}
