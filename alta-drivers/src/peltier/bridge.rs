//! Relay H-bridge Peltier driver
//!
//! Two relays set the current direction through the Peltier modules, a PWM
//! channel sets the power and a GPIO switches the heat-sink fans.
//!
//! | Direction | Relay 1 | Relay 2 |
//! |-----------|---------|---------|
//! | Cool      | low     | high    |
//! | Heat      | high    | low     |
//!
//! The driver zeroes the PWM before touching the relays, so it is safe even
//! without the [`alta_core::stage::Stage`] wrapper.
//!
//! ```ignore
//! let bridge = PeltierBridge::new(relay_1, relay_2, pwm, fans)?;
//! let mut stage = Stage::new(bridge)?;
//! ```

use alta_core::traits::{ActuatorError, CurrentDirection, ThermalActuator};
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

/// Relay H-bridge with PWM power and fan assist
pub struct PeltierBridge<R1, R2, PWM, FAN> {
    relay_1: R1,
    relay_2: R2,
    pwm: PWM,
    fans: FAN,
    /// Last duty written (0-100)
    duty: u8,
    direction: CurrentDirection,
    fans_on: bool,
}

impl<R1, R2, PWM, FAN> PeltierBridge<R1, R2, PWM, FAN>
where
    R1: OutputPin,
    R2: OutputPin,
    PWM: SetDutyCycle,
    FAN: OutputPin,
{
    /// Create the driver with all outputs off and the relays set to cool
    pub fn new(relay_1: R1, relay_2: R2, pwm: PWM, fans: FAN) -> Result<Self, ActuatorError> {
        let mut bridge = Self {
            relay_1,
            relay_2,
            pwm,
            fans,
            duty: 0,
            direction: CurrentDirection::Cool,
            fans_on: false,
        };
        bridge.set_assist(false)?;
        bridge.set_direction(CurrentDirection::Cool)?;
        Ok(bridge)
    }

    /// Current duty cycle
    pub fn duty(&self) -> u8 {
        self.duty
    }

    /// Current relay direction
    pub fn direction(&self) -> CurrentDirection {
        self.direction
    }

    /// Check if the fans are running
    pub fn fans_on(&self) -> bool {
        self.fans_on
    }

    /// Release the pins
    pub fn release(self) -> (R1, R2, PWM, FAN) {
        (self.relay_1, self.relay_2, self.pwm, self.fans)
    }
}

impl<R1, R2, PWM, FAN> ThermalActuator for PeltierBridge<R1, R2, PWM, FAN>
where
    R1: OutputPin,
    R2: OutputPin,
    PWM: SetDutyCycle,
    FAN: OutputPin,
{
    fn set_pwm_duty(&mut self, percent: u8) -> Result<(), ActuatorError> {
        let percent = percent.min(100);
        self.pwm
            .set_duty_cycle_percent(percent)
            .map_err(|_| ActuatorError::Pwm)?;
        self.duty = percent;
        Ok(())
    }

    fn set_direction(&mut self, direction: CurrentDirection) -> Result<(), ActuatorError> {
        // Never switch the relays under load
        self.set_pwm_duty(0)?;

        let (r1_high, r2_high) = match direction {
            CurrentDirection::Cool => (false, true),
            CurrentDirection::Heat => (true, false),
        };
        set_pin(&mut self.relay_1, r1_high)?;
        set_pin(&mut self.relay_2, r2_high)?;
        self.direction = direction;
        Ok(())
    }

    fn set_assist(&mut self, on: bool) -> Result<(), ActuatorError> {
        let result = if on {
            self.fans.set_high()
        } else {
            self.fans.set_low()
        };
        result.map_err(|_| ActuatorError::Assist)?;
        self.fans_on = on;
        Ok(())
    }
}

fn set_pin<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), ActuatorError> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|_| ActuatorError::Relay)
}
