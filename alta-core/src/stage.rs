//! Peltier stage abstraction
//!
//! Wraps a [`ThermalActuator`] and enforces the hot-switch rule: the
//! direction relays are only ever switched with the PWM duty at zero.
//!
//! ```ignore
//! let mut stage = Stage::new(bridge)?;
//! stage.apply(ActuatorCommand::cool(100))?;
//! // ... later, relays flip only after the duty has been zeroed
//! stage.apply(ActuatorCommand::heat(100))?;
//! ```

use crate::traits::{ActuatorError, CurrentDirection, ThermalActuator};

/// Requested thermal action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Drive heat into the sample
    Heat,
    /// Pull heat out of the sample
    Cool,
    /// No drive; relays rest in the cooling position
    Idle,
}

impl Direction {
    /// Relay position used for this direction
    pub fn relays(self) -> CurrentDirection {
        match self {
            Direction::Heat => CurrentDirection::Heat,
            Direction::Cool | Direction::Idle => CurrentDirection::Cool,
        }
    }
}

/// Command issued by the phase machine each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorCommand {
    /// Requested direction
    pub direction: Direction,
    /// Duty cycle (0-100 %)
    pub duty: u8,
}

impl ActuatorCommand {
    /// Cooling at `duty` percent
    pub const fn cool(duty: u8) -> Self {
        Self {
            direction: Direction::Cool,
            duty,
        }
    }

    /// Heating at `duty` percent
    pub const fn heat(duty: u8) -> Self {
        Self {
            direction: Direction::Heat,
            duty,
        }
    }

    /// Outputs off, relays in the safe cooling position
    pub const fn idle() -> Self {
        Self {
            direction: Direction::Idle,
            duty: 0,
        }
    }

    /// Map a signed thermal power (positive heats) to a command
    ///
    /// Magnitude is clamped to 100; zero maps to idle.
    pub fn from_signed(power: i16) -> Self {
        let magnitude = power.unsigned_abs().min(100) as u8;
        if power > 0 {
            Self::heat(magnitude)
        } else if power < 0 {
            Self::cool(magnitude)
        } else {
            Self::idle()
        }
    }

    /// Duty that will actually be applied
    pub fn effective_duty(&self) -> u8 {
        match self.direction {
            Direction::Idle => 0,
            _ => self.duty.min(100),
        }
    }
}

/// Peltier stage with hot-switch protection
pub struct Stage<A> {
    actuator: A,
    /// Current relay position
    relays: CurrentDirection,
    /// Current duty cycle (0-100)
    duty: u8,
    /// Forced-air assist state
    assist: bool,
}

impl<A: ThermalActuator> Stage<A> {
    /// Take ownership of the actuator and switch everything off
    pub fn new(actuator: A) -> Result<Self, ActuatorError> {
        let mut stage = Self {
            actuator,
            relays: CurrentDirection::Cool,
            duty: 0,
            assist: false,
        };
        stage.actuator.set_pwm_duty(0)?;
        stage.actuator.set_assist(false)?;
        stage.actuator.set_direction(CurrentDirection::Cool)?;
        Ok(stage)
    }

    /// Get access to the underlying actuator
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Current relay position
    pub fn relays(&self) -> CurrentDirection {
        self.relays
    }

    /// Current duty cycle
    pub fn duty(&self) -> u8 {
        self.duty
    }

    /// Check if forced-air assist is on
    pub fn assist(&self) -> bool {
        self.assist
    }

    /// Switch the relays, zeroing the duty first
    ///
    /// The duty is left at zero afterwards.
    pub fn set_direction(&mut self, direction: CurrentDirection) -> Result<(), ActuatorError> {
        self.set_duty(0)?;
        self.actuator.set_direction(direction)?;
        self.relays = direction;
        Ok(())
    }

    /// Set the duty cycle, clamped to 100
    ///
    /// Forced-air assist follows the duty: off at zero, on otherwise.
    pub fn set_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        let duty = duty.min(100);
        self.actuator.set_pwm_duty(duty)?;
        self.duty = duty;

        let assist = duty > 0;
        self.actuator.set_assist(assist)?;
        self.assist = assist;
        Ok(())
    }

    /// Apply a command, passing through zero duty on a direction change
    pub fn apply(&mut self, command: ActuatorCommand) -> Result<(), ActuatorError> {
        let relays = command.direction.relays();
        if relays != self.relays {
            debug!("stage: relays {:?} -> {:?}", self.relays, relays);
            self.set_direction(relays)?;
        }
        self.set_duty(command.effective_duty())
    }

    /// Outputs off, relays to cooling
    pub fn switch_off(&mut self) -> Result<(), ActuatorError> {
        self.set_duty(0)?;
        if self.relays != CurrentDirection::Cool {
            self.set_direction(CurrentDirection::Cool)?;
        }
        Ok(())
    }
}
