//! Experiment profiles
//!
//! The target temperature is a pure function of the profile and the time
//! spent under closed-loop control.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ThresholdConfig};

/// Experiment profile
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Profile {
    /// Cool to `setpoint` (°C) and hold there
    Isothermal { setpoint: f32 },
    /// Cool to the ramp start, then follow `rate` (°C/min, negative)
    Linear { rate: f32 },
}

/// Profile family, used in artifact names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileKind {
    Isothermal,
    Linear,
}

impl ProfileKind {
    /// Name used in artifact identifiers
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Isothermal => "isothermal",
            ProfileKind::Linear => "linear",
        }
    }

    /// Name shown on the display banner
    pub fn banner(&self) -> &'static str {
        match self {
            ProfileKind::Isothermal => "Isothermal",
            ProfileKind::Linear => "Linear Cool",
        }
    }
}

impl Profile {
    pub fn kind(&self) -> ProfileKind {
        match self {
            Profile::Isothermal { .. } => ProfileKind::Isothermal,
            Profile::Linear { .. } => ProfileKind::Linear,
        }
    }

    /// Setpoint (isothermal) or rate (linear)
    pub fn parameter(&self) -> f32 {
        match *self {
            Profile::Isothermal { setpoint } => setpoint,
            Profile::Linear { rate } => rate,
        }
    }

    /// Target temperature `since_control_ms` after closed-loop control began
    ///
    /// `ramp_start` is the temperature the linear ramp begins from.
    pub fn target_at(&self, ramp_start: f32, since_control_ms: u32) -> f32 {
        match *self {
            Profile::Isothermal { setpoint } => setpoint,
            Profile::Linear { rate } => ramp_start + rate * (since_control_ms as f32 / 60_000.0),
        }
    }

    /// Temperature the feed-forward polynomial is evaluated at
    pub fn feed_forward_point(&self, thresholds: &ThresholdConfig) -> f32 {
        match *self {
            Profile::Isothermal { setpoint } => setpoint,
            Profile::Linear { .. } => thresholds.ramp_start,
        }
    }

    /// Expected ramp duration (ms) from start to floor, 0 for isothermal
    pub fn ramp_duration_ms(&self, thresholds: &ThresholdConfig) -> u32 {
        match *self {
            Profile::Isothermal { .. } => 0,
            Profile::Linear { rate } => {
                let span = thresholds.ramp_start - thresholds.ramp_floor;
                let minutes = span / -rate;
                (minutes * 60_000.0) as u32
            }
        }
    }

    /// Reject profiles the phase machine cannot complete
    ///
    /// An isothermal setpoint must lie below the cold threshold; a linear
    /// rate must be negative.
    pub fn validate(&self, thresholds: &ThresholdConfig) -> Result<(), ConfigError> {
        match *self {
            Profile::Isothermal { setpoint } => {
                if setpoint.is_finite() && setpoint < thresholds.cold {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidProfile)
                }
            }
            Profile::Linear { rate } => {
                if rate.is_finite() && rate < 0.0 {
                    Ok(())
                } else {
                    Err(ConfigError::InvalidProfile)
                }
            }
        }
    }
}
