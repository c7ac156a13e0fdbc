//! Bench error types

use std::io;
use std::path::PathBuf;

use alta_core::config::ConfigError;
use alta_core::control::TuningError;
use alta_core::trial::RunError;
use thiserror::Error;

/// Errors raised by the host bench
#[derive(Debug, Error)]
pub enum BenchError {
    /// Configuration file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration file is not valid TOML for this schema
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    /// Experiment parameters rejected by validation
    #[error("invalid configuration: {0:?}")]
    Config(ConfigError),

    /// Simulation parameters out of range
    #[error("invalid simulation parameter: {0}")]
    Sim(&'static str),

    /// Log directory could not be prepared
    #[error("log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Trial loop stopped on a fatal error
    #[error("run aborted: {0:?}")]
    Run(RunError),

    #[error("tuning failed: {0:?}")]
    Tuning(TuningError),
}

impl From<ConfigError> for BenchError {
    fn from(e: ConfigError) -> Self {
        BenchError::Config(e)
    }
}

impl From<RunError> for BenchError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::Config(c) => BenchError::Config(c),
            other => BenchError::Run(other),
        }
    }
}

impl From<TuningError> for BenchError {
    fn from(e: TuningError) -> Self {
        BenchError::Tuning(e)
    }
}
