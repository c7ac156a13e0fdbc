//! Light dependent resistor optical sensor
//!
//! The LDR sits under the sample well with an LED above it. A clear
//! sample lets the light through; ice scatters it and the reading drops.
//! The reading is reported in raw ADC counts, averaged over a few
//! conversions.

use alta_core::traits::{OpticalSensor, SensorError};

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read ADC value (12-bit, 0-4095)
    #[allow(clippy::result_unit_err)]
    fn read(&mut self) -> Result<u16, ()>;
}

/// Full scale of a 12-bit converter
pub const ADC_MAX: u16 = 4096;

/// LDR behind an ADC channel
pub struct LdrSensor<ADC> {
    adc: ADC,
    /// Conversions averaged per reading
    oversample: u8,
    /// Counts from either rail treated as a wiring fault (0 disables)
    rail_margin: u16,
}

impl<ADC: AdcReader> LdrSensor<ADC> {
    /// Create a sensor with 4x oversampling and a 10-count rail margin
    pub fn new(adc: ADC) -> Self {
        Self {
            adc,
            oversample: 4,
            rail_margin: 10,
        }
    }

    /// Set the number of conversions per reading (at least 1)
    pub fn with_oversample(mut self, oversample: u8) -> Self {
        self.oversample = oversample.max(1);
        self
    }

    /// Set the rail margin; 0 reports every count as valid
    pub fn with_rail_margin(mut self, rail_margin: u16) -> Self {
        self.rail_margin = rail_margin;
        self
    }

    /// Check one raw conversion against the rails
    pub fn check_raw(&self, raw: u16) -> Result<u16, SensorError> {
        if self.rail_margin == 0 {
            return Ok(raw);
        }
        if raw >= ADC_MAX.saturating_sub(self.rail_margin) {
            return Err(SensorError::OpenCircuit);
        }
        if raw < self.rail_margin {
            return Err(SensorError::ShortCircuit);
        }
        Ok(raw)
    }
}

impl<ADC: AdcReader> OpticalSensor for LdrSensor<ADC> {
    fn read_intensity(&mut self) -> Result<f32, SensorError> {
        let mut sum: u32 = 0;
        for _ in 0..self.oversample {
            let raw = self
                .adc
                .read()
                .map_err(|_| SensorError::ConversionError)?;
            sum += self.check_raw(raw)? as u32;
        }
        Ok(sum as f32 / self.oversample as f32)
    }
}
