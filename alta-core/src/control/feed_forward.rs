//! Setpoint-dependent feed-forward and overshoot margin
//!
//! Both are empirical fits for the physical apparatus. The coefficients
//! come from configuration.

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum polynomial order + 1
pub const MAX_COEFFICIENTS: usize = 4;

/// Polynomial fit of steady-state duty vs. target temperature
///
/// Coefficients are in ascending powers: `c0 + c1·T + c2·T² + c3·T³`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeedForward {
    pub coefficients: Vec<f32, MAX_COEFFICIENTS>,
}

impl Default for FeedForward {
    fn default() -> Self {
        // Fit measured on the reference stage
        Self::from_slice(&[32.913, -1.623, 0.014])
    }
}

impl FeedForward {
    /// Build from a coefficient slice, ignoring anything past cubic
    pub fn from_slice(coefficients: &[f32]) -> Self {
        let mut c = Vec::new();
        for &k in coefficients.iter().take(MAX_COEFFICIENTS) {
            let _ = c.push(k);
        }
        Self { coefficients: c }
    }

    /// No feed-forward at all
    pub fn zero() -> Self {
        Self {
            coefficients: Vec::new(),
        }
    }

    /// Evaluate the fit at `setpoint` (Horner's scheme)
    pub fn evaluate(&self, setpoint: f32) -> f32 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &k| acc * setpoint + k)
    }
}

/// Linear overshoot margin fit
///
/// At warmer setpoints the aluminium block is allowed to undershoot the
/// target a little more, because the sample lags behind the block.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OvershootConfig {
    /// Margin per °C of setpoint
    pub slope: f32,
    /// Margin at 0 °C
    pub intercept: f32,
    /// Coldest setpoint the fit is valid for (°C)
    pub min_setpoint: f32,
    /// Warmest setpoint the fit is valid for (°C)
    pub max_setpoint: f32,
}

impl Default for OvershootConfig {
    fn default() -> Self {
        Self {
            slope: 0.05,
            intercept: 1.25,
            min_setpoint: -25.0,
            max_setpoint: 0.0,
        }
    }
}

impl OvershootConfig {
    /// Margin below the setpoint (°C), floored to one decimal place
    ///
    /// Zero outside the fitted range.
    pub fn margin(&self, setpoint: f32) -> f32 {
        if setpoint < self.min_setpoint || setpoint > self.max_setpoint {
            return 0.0;
        }
        let margin = self.slope * setpoint + self.intercept;
        floor_tenths(margin)
    }
}

/// Floor to one decimal place without libm
fn floor_tenths(value: f32) -> f32 {
    // The epsilon absorbs f32 representation error, e.g. 0.49999997 -> 0.5
    let scaled = value * 10.0 + 1e-4;
    let truncated = scaled as i32 as f32;
    let floored = if truncated > scaled {
        truncated - 1.0
    } else {
        truncated
    };
    floored / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_default_fit() {
        let ff = FeedForward::default();
        // 32.913 - 1.623 * -15 + 0.014 * 225
        assert!(close(ff.evaluate(-15.0), 60.408));
        assert!(close(ff.evaluate(0.0), 32.913));
    }

    #[test]
    fn test_cubic() {
        let ff = FeedForward::from_slice(&[1.0, 0.0, 0.0, 2.0, 99.0]);
        assert_eq!(ff.coefficients.len(), MAX_COEFFICIENTS);
        assert!(close(ff.evaluate(2.0), 17.0));
    }

    #[test]
    fn test_zero() {
        assert_eq!(FeedForward::zero().evaluate(-20.0), 0.0);
    }

    #[test]
    fn test_overshoot_in_range() {
        let o = OvershootConfig::default();
        assert!(close(o.margin(-15.0), 0.5));
        assert!(close(o.margin(-10.0), 0.7)); // 0.75 floored
        assert!(close(o.margin(0.0), 1.2)); // 1.25 floored
        assert!(close(o.margin(-25.0), 0.0));
    }

    #[test]
    fn test_overshoot_out_of_range() {
        let o = OvershootConfig::default();
        assert_eq!(o.margin(-25.5), 0.0);
        assert_eq!(o.margin(2.0), 0.0);
    }

    #[test]
    fn test_warmer_setpoints_get_larger_margin() {
        let o = OvershootConfig::default();
        assert!(o.margin(-5.0) > o.margin(-20.0));
    }
}
