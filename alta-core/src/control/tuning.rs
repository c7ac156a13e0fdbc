//! IMC (lambda) tuning from a first-order-plus-dead-time model
//!
//! The stage response to a duty step is fitted offline to
//! `K_p · e^(-θs) / (τ_p·s + 1)`. These correlations turn that fit into
//! controller gains.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::law::ControllerConfig;

/// First-order-plus-dead-time process model
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FopdtModel {
    /// Process gain (°C per duty %)
    pub gain: f32,
    /// Process time constant (s)
    pub time_constant: f32,
    /// Dead time (s)
    pub dead_time: f32,
}

impl Default for FopdtModel {
    fn default() -> Self {
        // Step-response fit of the reference stage
        Self {
            gain: -0.42,
            time_constant: 124.0,
            dead_time: 5.0,
        }
    }
}

/// Closed-loop speed requested from the tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Aggressiveness {
    #[default]
    Aggressive,
    Moderate,
    Conservative,
}

/// Tuning errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TuningError {
    /// Process gain is zero
    ZeroGain,
    /// Time constant or dead time is not positive
    InvalidTiming,
}

/// Controller parameters from IMC tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImcTuning {
    /// Closed-loop time constant used (s)
    pub tau_c: f32,
    /// Controller gain
    pub k_c: f32,
    /// Integral time constant (s)
    pub tau_i: f32,
    /// Derivative time constant (s)
    pub tau_d: f32,
    /// Derivative filter factor
    pub alpha: f32,
}

impl ImcTuning {
    /// PI gains (derivative dropped)
    pub fn to_pi(&self) -> ControllerConfig {
        ControllerConfig::pi(self.k_c, self.tau_i)
    }

    /// PID gains
    pub fn to_pid(&self) -> ControllerConfig {
        ControllerConfig::pid(self.k_c, self.tau_i, self.tau_d)
    }
}

impl FopdtModel {
    /// Closed-loop time constant for the requested speed
    pub fn closed_loop_time_constant(&self, aggressiveness: Aggressiveness) -> f32 {
        let tau_p = self.time_constant;
        let theta = self.dead_time;
        match aggressiveness {
            Aggressiveness::Aggressive => (0.1 * tau_p).max(0.8 * theta),
            Aggressiveness::Moderate => tau_p.max(8.0 * theta),
            Aggressiveness::Conservative => (10.0 * tau_p).max(80.0 * theta),
        }
    }

    /// Compute IMC PID parameters
    pub fn imc(&self, aggressiveness: Aggressiveness) -> Result<ImcTuning, TuningError> {
        if self.gain == 0.0 || self.gain.is_nan() {
            return Err(TuningError::ZeroGain);
        }
        if !(self.time_constant > 0.0) || !(self.dead_time >= 0.0) {
            return Err(TuningError::InvalidTiming);
        }

        let tau_p = self.time_constant;
        let theta = self.dead_time;
        let tau_c = self.closed_loop_time_constant(aggressiveness);

        let k_c = (tau_p + 0.5 * theta) / (self.gain * (tau_c + 0.5 * theta));
        let tau_i = tau_p + 0.5 * theta;
        let tau_d = (tau_p * theta) / (2.0 * tau_p + theta);
        let alpha = (tau_c * (tau_p + 0.5 * theta)) / (tau_p * (tau_c + theta));

        debug!("imc: tau_c={} k_c={} tau_i={} tau_d={}", tau_c, k_c, tau_i, tau_d);

        Ok(ImcTuning {
            tau_c,
            k_c,
            tau_i,
            tau_d,
            alpha,
        })
    }
}
