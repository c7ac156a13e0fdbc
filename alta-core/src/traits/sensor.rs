//! Temperature and optical sensor traits

/// Errors that can occur while reading a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Sensor disconnected (open circuit)
    OpenCircuit,
    /// Sensor shorted to ground
    ShortCircuit,
    /// Reading out of expected range
    OutOfRange,
    /// Conversion or bus error
    ConversionError,
    /// Sensor did not answer in time
    Timeout,
    /// No sensor fitted on this channel
    NotFitted,
}

/// Trait for temperature sensors
///
/// Implementations handle the specific sensor type (PT100 behind a
/// MAX31865, thermocouple behind a MAX31855, ...). Register decoding and
/// linearisation live in the implementation; the core only sees °C.
///
/// A read must never block indefinitely. Return an error instead and the
/// core will hold the last good value for one tick.
pub trait TemperatureSensor {
    /// Read the current temperature in degrees Celsius
    fn read_celsius(&mut self) -> Result<f32, SensorError>;
}

/// Trait for the optical (light dependent resistor) channel
///
/// The reading is in arbitrary units; it drops when the sample turns
/// opaque on freezing.
pub trait OpticalSensor {
    /// Read the current transmitted light intensity
    fn read_intensity(&mut self) -> Result<f32, SensorError>;
}

/// Placeholder for an unfitted secondary sensor
///
/// Lets callers write `None::<NoSensor>` for the optional calibration
/// probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSensor;

impl TemperatureSensor for NoSensor {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        Err(SensorError::NotFitted)
    }
}
