//! Sensor hold policy
//!
//! A failed read is replaced by the last good value for at most
//! [`MAX_HELD_TICKS`] consecutive ticks.

use crate::traits::SensorError;

/// Consecutive failed reads that may be bridged with the last good value
pub const MAX_HELD_TICKS: u8 = 1;

/// Sensor channels watched by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorChannel {
    /// Stage temperature, drives control
    Primary,
    /// Optional in-sample calibration probe
    Secondary,
    /// Light dependent resistor
    Optical,
}

/// A sensor that stayed unreadable past the hold budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorFault {
    pub channel: SensorChannel,
    pub error: SensorError,
}

/// Last good value of one channel
#[derive(Debug, Clone, Default)]
pub struct HeldReading {
    last: Option<f32>,
    misses: u8,
}

impl HeldReading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a read result, substituting the last good value if allowed
    pub fn accept(&mut self, result: Result<f32, SensorError>) -> Result<f32, SensorError> {
        match result {
            Ok(value) => {
                self.last = Some(value);
                self.misses = 0;
                Ok(value)
            }
            Err(e) => {
                self.misses = self.misses.saturating_add(1);
                match self.last {
                    Some(value) if self.misses <= MAX_HELD_TICKS => Ok(value),
                    _ => Err(e),
                }
            }
        }
    }

    /// Consecutive failed reads so far
    pub fn misses(&self) -> u8 {
        self.misses
    }

    pub fn last(&self) -> Option<f32> {
        self.last
    }
}

/// Hold policy for all sensor channels of one trial
#[derive(Debug, Clone, Default)]
pub struct SafetyMonitor {
    primary: HeldReading,
    secondary: HeldReading,
    optical: HeldReading,
    /// Total substituted reads
    substitutions: u32,
}

impl SafetyMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary temperature; fatal once the hold budget is spent
    pub fn primary(&mut self, result: Result<f32, SensorError>) -> Result<f32, SensorFault> {
        Self::guard(&mut self.primary, &mut self.substitutions, SensorChannel::Primary, result)
    }

    /// Optical intensity; fatal once the hold budget is spent
    pub fn optical(&mut self, result: Result<f32, SensorError>) -> Result<f32, SensorFault> {
        Self::guard(&mut self.optical, &mut self.substitutions, SensorChannel::Optical, result)
    }

    /// Secondary temperature; reported missing instead of failing
    ///
    /// `None` means no probe is fitted.
    pub fn secondary(&mut self, result: Option<Result<f32, SensorError>>) -> Option<f32> {
        let result = result?;
        Self::guard(
            &mut self.secondary,
            &mut self.substitutions,
            SensorChannel::Secondary,
            result,
        )
        .ok()
    }

    /// Number of reads replaced by a held value
    pub fn substitutions(&self) -> u32 {
        self.substitutions
    }

    fn guard(
        held: &mut HeldReading,
        substitutions: &mut u32,
        channel: SensorChannel,
        result: Result<f32, SensorError>,
    ) -> Result<f32, SensorFault> {
        let failed = result.is_err();
        match held.accept(result) {
            Ok(value) => {
                if failed {
                    *substitutions += 1;
                    warn!("safety: {:?} read failed, holding {}", channel, value);
                }
                Ok(value)
            }
            Err(error) => {
                error!("safety: {:?} unreadable: {:?}", channel, error);
                Err(SensorFault { channel, error })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_miss_is_held() {
        let mut held = HeldReading::new();
        assert_eq!(held.accept(Ok(-5.0)), Ok(-5.0));
        assert_eq!(held.accept(Err(SensorError::Timeout)), Ok(-5.0));
        assert_eq!(held.misses(), 1);
    }

    #[test]
    fn test_second_miss_escalates() {
        let mut held = HeldReading::new();
        held.accept(Ok(-5.0)).unwrap();
        held.accept(Err(SensorError::Timeout)).unwrap();
        assert_eq!(
            held.accept(Err(SensorError::OpenCircuit)),
            Err(SensorError::OpenCircuit)
        );
    }

    #[test]
    fn test_good_read_resets_budget() {
        let mut held = HeldReading::new();
        held.accept(Ok(-5.0)).unwrap();
        held.accept(Err(SensorError::Timeout)).unwrap();
        held.accept(Ok(-6.0)).unwrap();
        assert_eq!(held.accept(Err(SensorError::Timeout)), Ok(-6.0));
    }

    #[test]
    fn test_nothing_to_hold_on_first_read() {
        let mut held = HeldReading::new();
        assert_eq!(
            held.accept(Err(SensorError::Timeout)),
            Err(SensorError::Timeout)
        );
    }

    #[test]
    fn test_primary_fault_names_channel() {
        let mut monitor = SafetyMonitor::new();
        monitor.primary(Ok(1.0)).unwrap();
        monitor.primary(Err(SensorError::Timeout)).unwrap();
        let fault = monitor.primary(Err(SensorError::Timeout)).unwrap_err();
        assert_eq!(fault.channel, SensorChannel::Primary);
        assert_eq!(monitor.substitutions(), 1);
    }

    #[test]
    fn test_secondary_goes_missing() {
        let mut monitor = SafetyMonitor::new();
        assert_eq!(monitor.secondary(None), None);
        assert_eq!(monitor.secondary(Some(Ok(2.0))), Some(2.0));
        assert_eq!(monitor.secondary(Some(Err(SensorError::Timeout))), Some(2.0));
        assert_eq!(monitor.secondary(Some(Err(SensorError::Timeout))), None);
        assert_eq!(monitor.secondary(Some(Ok(3.0))), Some(3.0));
    }
}
