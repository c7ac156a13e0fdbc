//! Events that trigger phase transitions

/// Events that can trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseEvent {
    // Lifecycle events
    /// Trial started
    Start,

    // Cooling events
    /// Temperature fell below the cold threshold (isothermal)
    ColdReached,
    /// Temperature fell below the ramp start (linear)
    RampStartReached,
    /// Temperature passed the setpoint minus the overshoot margin
    HoldReached,

    // Terminal events
    /// Freeze detector fired
    FreezeDetected,
    /// Cooling ran past the maximum wait without freezing
    TimedOut,
    /// Linear ramp reached its floor without freezing
    RampFloorReached,
    /// Primary temperature implausibly warm during control
    WarmFault,

    // Recovery events
    /// Frozen tick done, start melting
    Recover,
    /// Melt soak finished
    SoakComplete,
}

impl PhaseEvent {
    /// Check if this event ends the cooling part of a trial
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PhaseEvent::FreezeDetected
                | PhaseEvent::TimedOut
                | PhaseEvent::RampFloorReached
                | PhaseEvent::WarmFault
        )
    }
}
