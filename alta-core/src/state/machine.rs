//! Phase definitions and the transition table
//!
//! Actuator and detector behavior is a function of the current phase.

use super::events::PhaseEvent;

/// Experiment phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Not running; outputs off
    Idle,
    /// Full cooling towards the cold threshold
    FastCool,
    /// Full cooling towards the hold target (isothermal)
    Approaching,
    /// Closed-loop hold at the setpoint (isothermal)
    ActiveHold,
    /// Closed-loop tracking of a moving target (linear)
    Ramp,
    /// Freeze detected; outputs off for one tick
    Frozen,
    /// Heating to the melt temperature, then soaking
    MeltRecovery,
}

impl Phase {
    /// Four-character label used in logs and on the display
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::FastCool => "Fast",
            Phase::Approaching => "Cool",
            Phase::ActiveHold => "Hold",
            Phase::Ramp => "Ramp",
            Phase::Frozen => "Froz",
            Phase::MeltRecovery => "Heat",
        }
    }

    /// Check if this phase is part of the cooling (logged) part of a trial
    pub fn is_cooling(&self) -> bool {
        matches!(
            self,
            Phase::FastCool | Phase::Approaching | Phase::ActiveHold | Phase::Ramp
        )
    }

    /// Check if the control law drives the stage in this phase
    pub fn is_controlled(&self) -> bool {
        matches!(self, Phase::ActiveHold | Phase::Ramp)
    }

    /// Check if the optical detector is consulted in this phase
    ///
    /// Never during the fast cool, where condensation and the stage
    /// settling make the intensity unreliable.
    pub fn optical_eligible(&self) -> bool {
        matches!(self, Phase::Approaching | Phase::ActiveHold | Phase::Ramp)
    }

    /// Check if the latent-heat detector is fed in this phase
    pub fn latent_eligible(&self) -> bool {
        self.is_controlled()
    }

    /// Process an event and return the next phase
    pub fn transition(self, event: PhaseEvent) -> Self {
        use Phase::*;
        use PhaseEvent::*;

        match (self, event) {
            (Idle, Start) => FastCool,

            // FastCool transitions
            (FastCool, ColdReached) => Approaching,
            (FastCool, RampStartReached) => Ramp,
            (FastCool, TimedOut) => MeltRecovery,

            // Approaching transitions
            (Approaching, HoldReached) => ActiveHold,
            (Approaching, FreezeDetected) => Frozen,
            (Approaching, TimedOut) => MeltRecovery,

            // ActiveHold transitions
            (ActiveHold, FreezeDetected) => Frozen,
            (ActiveHold, TimedOut) => MeltRecovery,
            (ActiveHold, WarmFault) => MeltRecovery,

            // Ramp transitions
            (Ramp, FreezeDetected) => Frozen,
            (Ramp, RampFloorReached) => MeltRecovery,
            (Ramp, TimedOut) => MeltRecovery,
            (Ramp, WarmFault) => MeltRecovery,

            (Frozen, Recover) => MeltRecovery,
            (MeltRecovery, SoakComplete) => Idle,

            // Default: stay in current phase
            _ => self,
        }
    }
}
