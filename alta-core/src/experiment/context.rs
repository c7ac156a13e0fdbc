//! Trial-scoped phase context

use crate::state::Phase;

/// One tick of sensor readings, after the hold policy
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// Time since the trial started (ms)
    pub elapsed_ms: u32,
    /// Stage temperature (°C)
    pub primary: f32,
    /// In-sample probe temperature (°C), if fitted and readable
    pub secondary: Option<f32>,
    /// Transmitted light intensity (arb. units)
    pub optical: f32,
}

/// Phase context of a single trial
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseContext {
    pub phase: Phase,
    /// Time of the latest tick since trial start (ms)
    pub elapsed_ms: u32,
    /// Set once, when closed-loop control (hold or ramp) begins
    pub hold_start_ms: Option<u32>,
    /// Optical intensity of the clear sample, fixed for the trial
    pub clear_baseline: f32,
    /// Permitted undershoot below the setpoint before holding (°C)
    pub overshoot_margin: f32,
    /// Set when melt recovery first passes the melt temperature
    pub melted_at_ms: Option<u32>,
    /// Cooling ended on the safety timeout and heating has not started yet
    pub timed_out: bool,
}

impl PhaseContext {
    pub fn new(clear_baseline: f32, overshoot_margin: f32) -> Self {
        Self {
            phase: Phase::Idle,
            elapsed_ms: 0,
            hold_start_ms: None,
            clear_baseline,
            overshoot_margin,
            melted_at_ms: None,
            timed_out: false,
        }
    }

    /// Time under closed-loop control (ms), 0 before it began
    pub fn since_hold_ms(&self) -> u32 {
        match self.hold_start_ms {
            Some(start) => self.elapsed_ms.saturating_sub(start),
            None => 0,
        }
    }

    /// Label for logs and display
    ///
    /// Melt recovery reads `Warm` on the tick a trial times out, then
    /// `Heat`, then `Wait` for the soak.
    pub fn label(&self) -> &'static str {
        match (self.phase, self.melted_at_ms) {
            (Phase::MeltRecovery, _) if self.timed_out => "Warm",
            (Phase::MeltRecovery, Some(_)) => "Wait",
            (phase, _) => phase.label(),
        }
    }
}
