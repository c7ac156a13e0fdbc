//! PI(D) control law
//!
//! Proportional-integral controller with an optional derivative-on-
//! measurement term. The output is a cooling duty cycle in percent.
//!
//! With the apparatus gain `K_c` negative, a measurement above the setpoint
//! (negative error) gives a positive output, i.e. more cooling.
//!
//! There is no anti-windup beyond the output clamp: the integral keeps
//! accumulating while the output is saturated. Holds are short and start
//! from a fresh integral, so this has not been a problem in practice.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the clamped output is converted to an integer duty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DutyRounding {
    /// Drop the fractional part
    #[default]
    Truncate,
    /// Round half up
    Nearest,
}

/// Controller gains
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControllerConfig {
    /// Controller gain (duty % per °C, signed)
    pub k_c: f32,
    /// Integral time constant (s)
    pub tau_i: f32,
    /// Derivative time constant (s); `None` for a plain PI controller
    pub tau_d: Option<f32>,
    /// Duty rounding mode
    pub rounding: DutyRounding,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::pi(-10.0, 100.0)
    }
}

impl ControllerConfig {
    /// PI controller with truncating output
    pub const fn pi(k_c: f32, tau_i: f32) -> Self {
        Self {
            k_c,
            tau_i,
            tau_d: None,
            rounding: DutyRounding::Truncate,
        }
    }

    /// PID controller with rounded output
    pub const fn pid(k_c: f32, tau_i: f32, tau_d: f32) -> Self {
        Self {
            k_c,
            tau_i,
            tau_d: Some(tau_d),
            rounding: DutyRounding::Nearest,
        }
    }

    /// Check if the derivative term is active
    pub fn has_derivative(&self) -> bool {
        self.tau_d.is_some()
    }
}

/// Result of one control tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlOutput {
    /// Proportional contribution
    pub p: f32,
    /// Integral contribution
    pub i: f32,
    /// Derivative contribution (0 for PI)
    pub d: f32,
    /// Unclamped sum including feed-forward
    pub raw: f32,
    /// Clamped duty cycle (0-100)
    pub duty: u8,
}

/// Clamp a raw controller output to an integer duty cycle
///
/// NaN maps to 0.
pub fn clamp_duty(raw: f32, rounding: DutyRounding) -> u8 {
    if raw > 100.0 {
        100
    } else if !(raw >= 0.0) {
        0
    } else {
        match rounding {
            DutyRounding::Truncate => raw as u8,
            DutyRounding::Nearest => ((raw + 0.5) as u8).min(100),
        }
    }
}

/// PI(D) controller state
#[derive(Debug, Clone)]
pub struct ControlLaw {
    config: ControllerConfig,
    /// Sample period (s)
    delta_t: f32,
    setpoint: f32,
    feed_forward: f32,
    integral: f32,
    last_measurement: Option<f32>,
}

impl ControlLaw {
    /// Create a controller with a zero integral
    ///
    /// # Arguments
    /// - `delta_t`: sample period in seconds
    /// - `setpoint`: target temperature (°C)
    /// - `feed_forward`: duty bias for this setpoint
    pub fn new(config: ControllerConfig, delta_t: f32, setpoint: f32, feed_forward: f32) -> Self {
        Self {
            config,
            delta_t,
            setpoint,
            feed_forward,
            integral: 0.0,
            last_measurement: None,
        }
    }

    /// Get the gains
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Get the current setpoint
    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    /// Move the setpoint without touching the integral (ramps)
    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    /// Get the feed-forward offset
    pub fn feed_forward(&self) -> f32 {
        self.feed_forward
    }

    /// Get the raw integral accumulator (°C·s)
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Zero the integral and forget the previous measurement
    ///
    /// Call once when a new hold target is entered, never mid-hold.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_measurement = None;
    }

    /// Run one control tick
    pub fn update(&mut self, measurement: f32) -> ControlOutput {
        let k_c = self.config.k_c;
        let error = self.setpoint - measurement;

        let p = k_c * error;

        self.integral += error * self.delta_t;
        let i = (k_c / self.config.tau_i) * self.integral;

        // Derivative on measurement avoids a kick when a ramp moves the setpoint
        let d = match (self.config.tau_d, self.last_measurement) {
            (Some(tau_d), Some(last)) => -k_c * tau_d * (measurement - last) / self.delta_t,
            _ => 0.0,
        };
        self.last_measurement = Some(measurement);

        let raw = p + i + d + self.feed_forward;
        let duty = clamp_duty(raw, self.config.rounding);

        trace!("control: e={} p={} i={} d={} duty={}", error, p, i, d, duty);

        ControlOutput { p, i, d, raw, duty }
    }
}
