//! Configuration type definitions
//!
//! Defaults reproduce the constants of the reference apparatus.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::control::{ControllerConfig, FeedForward, OvershootConfig};
use crate::detect::{DetectorConfig, MAX_WINDOW};

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Sample period is zero
    InvalidSamplePeriod,
    /// Integral or derivative time constant is not positive
    InvalidTimeConstant,
    /// Controller gain is zero or not finite
    InvalidGain,
    /// Feed-forward polynomial has no coefficients
    EmptyFeedForward,
    /// Latent-heat window length outside `2..=MAX_WINDOW`
    InvalidWindow,
    /// Detector threshold is not positive
    InvalidThreshold,
    /// Temperature thresholds are inconsistent
    InvalidTemperatures,
    /// Experiment profile parameter is unusable
    InvalidProfile,
}

/// Which phases the warm-fault check covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WarmFaultCheck {
    /// Only when the trial is classified
    #[default]
    TerminalOnly,
    /// Also every tick of active hold or ramp
    DuringControl,
}

/// Loop timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimingConfig {
    /// Time between ticks (ms)
    pub sample_period_ms: u32,
    /// Longest a trial may cool without freezing (ms)
    pub max_wait_ms: u32,
    /// Soak at the melt temperature (ms)
    pub melt_soak_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 200,
            max_wait_ms: 150_000,
            melt_soak_ms: 60_000,
        }
    }
}

impl TimingConfig {
    /// Sample period in seconds
    pub fn delta_t(&self) -> f32 {
        self.sample_period_ms as f32 / 1000.0
    }
}

/// Temperature thresholds (°C)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ThresholdConfig {
    /// End of the fast cool for isothermal runs
    pub cold: f32,
    /// End of the fast cool and start of the ramp for linear runs
    pub ramp_start: f32,
    /// Linear ramp gives up at this temperature
    pub ramp_floor: f32,
    /// Melt recovery heats until above this
    pub melt: f32,
    /// A primary reading above this after cooling means a sensor fault
    pub warm_fault_limit: f32,
    /// Scope of the warm-fault check
    pub warm_fault_check: WarmFaultCheck,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            cold: 0.0,
            ramp_start: 0.0,
            ramp_floor: -25.0,
            melt: 15.0,
            warm_fault_limit: 0.0,
            warm_fault_check: WarmFaultCheck::TerminalOnly,
        }
    }
}

/// Complete experiment configuration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExperimentConfig {
    pub controller: ControllerConfig,
    pub feed_forward: FeedForward,
    pub overshoot: OvershootConfig,
    pub detector: DetectorConfig,
    pub timing: TimingConfig,
    pub thresholds: ThresholdConfig,
}

impl ExperimentConfig {
    /// Check the configuration for values the loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.controller;
        if c.k_c == 0.0 || !c.k_c.is_finite() {
            return Err(ConfigError::InvalidGain);
        }
        if !(c.tau_i > 0.0) {
            return Err(ConfigError::InvalidTimeConstant);
        }
        if let Some(tau_d) = c.tau_d {
            if !(tau_d >= 0.0) {
                return Err(ConfigError::InvalidTimeConstant);
            }
        }

        if self.feed_forward.coefficients.is_empty() {
            return Err(ConfigError::EmptyFeedForward);
        }

        if self.timing.sample_period_ms == 0 {
            return Err(ConfigError::InvalidSamplePeriod);
        }

        match self.detector {
            DetectorConfig::Optical { threshold } => {
                if !(threshold > 0.0) {
                    return Err(ConfigError::InvalidThreshold);
                }
            }
            DetectorConfig::LatentHeat { window, rise } => {
                if !(2..=MAX_WINDOW).contains(&window) {
                    return Err(ConfigError::InvalidWindow);
                }
                if !(rise > 0.0) {
                    return Err(ConfigError::InvalidThreshold);
                }
            }
        }

        let t = &self.thresholds;
        let ordered = t.ramp_floor < t.ramp_start && t.cold < t.melt && t.ramp_start < t.melt;
        if !ordered || !t.warm_fault_limit.is_finite() {
            return Err(ConfigError::InvalidTemperatures);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_apparatus() {
        let config = ExperimentConfig::default();
        assert_eq!(config.controller.k_c, -10.0);
        assert_eq!(config.controller.tau_i, 100.0);
        assert_eq!(config.timing.sample_period_ms, 200);
        assert_eq!(config.timing.max_wait_ms, 150_000);
        assert_eq!(config.thresholds.melt, 15.0);
        assert_eq!(config.feed_forward.coefficients.len(), 3);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_delta_t() {
        assert!((TimingConfig::default().delta_t() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_zero_period() {
        let mut config = ExperimentConfig::default();
        config.timing.sample_period_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidSamplePeriod));
    }

    #[test]
    fn test_rejects_bad_window() {
        let mut config = ExperimentConfig::default();
        config.detector = DetectorConfig::LatentHeat {
            window: 1,
            rise: 0.3,
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidWindow));
        config.detector = DetectorConfig::LatentHeat {
            window: MAX_WINDOW + 1,
            rise: 0.3,
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidWindow));
    }

    #[test]
    fn test_rejects_bad_controller() {
        let mut config = ExperimentConfig::default();
        config.controller.tau_i = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeConstant));

        let mut config = ExperimentConfig::default();
        config.controller.k_c = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidGain));
    }

    #[test]
    fn test_rejects_empty_polynomial() {
        let mut config = ExperimentConfig::default();
        config.feed_forward = FeedForward::zero();
        assert_eq!(config.validate(), Err(ConfigError::EmptyFeedForward));
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut config = ExperimentConfig::default();
        config.thresholds.ramp_floor = 5.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidTemperatures));
    }

    #[test]
    fn test_rejects_non_positive_optical_threshold() {
        let mut config = ExperimentConfig::default();
        config.detector = DetectorConfig::Optical { threshold: 0.0 };
        assert_eq!(config.validate(), Err(ConfigError::InvalidThreshold));
    }
}
