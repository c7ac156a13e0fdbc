//! Safety monitoring
//!
//! Sensor read failures are bridged for a single tick; anything longer is
//! a fault. Implausibly warm readings after cooling abort the trial.

pub mod monitor;
pub mod warm;

pub use monitor::{HeldReading, SafetyMonitor, SensorChannel, SensorFault, MAX_HELD_TICKS};
pub use warm::WarmFaultGuard;
