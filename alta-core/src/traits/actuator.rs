//! Peltier actuator trait
//!
//! The physical stage is a Peltier module driven through a pair of
//! direction relays and a smoothed PWM channel, with fans as forced-air
//! assist on the hot side.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Direction of current through the Peltier module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CurrentDirection {
    /// Sample side heats up
    Heat,
    /// Sample side cools down
    Cool,
}

impl CurrentDirection {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            CurrentDirection::Heat => CurrentDirection::Cool,
            CurrentDirection::Cool => CurrentDirection::Heat,
        }
    }
}

/// Errors reported by actuator hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// PWM channel rejected the duty cycle
    Pwm,
    /// A direction relay could not be switched
    Relay,
    /// Forced-air assist could not be switched
    Assist,
}

/// Low-level actuator collaborator
///
/// Every call must be idempotent and cheap enough to issue once per tick.
/// Implementations do not need to guard against hot switching; the
/// [`Stage`](crate::stage::Stage) wrapper does that.
pub trait ThermalActuator {
    /// Set the PWM duty cycle (0-100 %)
    fn set_pwm_duty(&mut self, percent: u8) -> Result<(), ActuatorError>;

    /// Set the relays for the given current direction
    fn set_direction(&mut self, direction: CurrentDirection) -> Result<(), ActuatorError>;

    /// Switch the forced-air assist on or off
    fn set_assist(&mut self, on: bool) -> Result<(), ActuatorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite() {
        assert_eq!(CurrentDirection::Heat.opposite(), CurrentDirection::Cool);
        assert_eq!(CurrentDirection::Cool.opposite(), CurrentDirection::Heat);
    }
}
