//! Freeze detection
//!
//! Two strategies are available:
//! - [`optical`]: the transmitted light drops when the sample turns opaque
//! - [`latent`]: the exotherm of crystallisation warms the sample while the
//!   stage is still cooling
//!
//! The strategy is chosen by [`DetectorConfig`]; detector state is created
//! fresh for every trial.

pub mod latent;
pub mod optical;
pub mod window;

pub use latent::LatentHeatDetector;
pub use optical::OpticalDetector;
pub use window::{DetectionWindow, MAX_WINDOW};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::state::Phase;

/// Default optical drop that counts as frozen (ADC counts)
pub const DEFAULT_OPTICAL_THRESHOLD: f32 = 150.0;
/// Default latent-heat window length (samples)
pub const DEFAULT_WINDOW: usize = 5;
/// Default latent-heat rise (°C)
pub const DEFAULT_RISE: f32 = 0.3;

/// Freeze detection strategy
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DetectorConfig {
    /// Frozen when the intensity falls more than `threshold` below the
    /// clear baseline
    Optical { threshold: f32 },
    /// Frozen when the temperature rises more than `rise` over `window`
    /// samples
    LatentHeat { window: usize, rise: f32 },
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig::Optical {
            threshold: DEFAULT_OPTICAL_THRESHOLD,
        }
    }
}

/// Per-trial freeze detector
#[derive(Debug, Clone)]
pub enum FreezeDetector {
    Optical(OpticalDetector),
    LatentHeat(LatentHeatDetector),
}

impl FreezeDetector {
    /// Build a fresh detector from configuration
    pub fn new(config: &DetectorConfig) -> Self {
        match *config {
            DetectorConfig::Optical { threshold } => {
                FreezeDetector::Optical(OpticalDetector::new(threshold))
            }
            DetectorConfig::LatentHeat { window, rise } => {
                FreezeDetector::LatentHeat(LatentHeatDetector::new(window, rise))
            }
        }
    }

    /// Forget all history and capture the clear baseline
    pub fn begin_trial(&mut self, clear_baseline: f32) {
        match self {
            FreezeDetector::Optical(d) => d.begin(clear_baseline),
            FreezeDetector::LatentHeat(d) => d.clear(),
        }
    }

    /// Feed one tick of readings and report whether the sample froze
    ///
    /// Returns `false` in phases where the strategy is not eligible. The
    /// latent window is not fed outside its phases either, so a hold
    /// starts from an empty window.
    pub fn observe(&mut self, phase: Phase, temperature: f32, intensity: f32) -> bool {
        match self {
            FreezeDetector::Optical(d) => phase.optical_eligible() && d.is_frozen(intensity),
            FreezeDetector::LatentHeat(d) => {
                phase.latent_eligible() && d.observe(temperature)
            }
        }
    }
}
