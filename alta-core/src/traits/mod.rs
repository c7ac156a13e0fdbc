//! Collaborator traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific (or simulated) implementations.

pub mod actuator;
pub mod clock;
pub mod display;
pub mod sensor;
pub mod store;

pub use actuator::{ActuatorError, CurrentDirection, ThermalActuator};
pub use clock::{NeverStop, StopAfter, StopSignal, Ticker};
pub use display::{DisplayError, NullDisplay, StatusDisplay, DISPLAY_COLUMNS};
pub use sensor::{NoSensor, OpticalSensor, SensorError, TemperatureSensor};
pub use store::{ArtifactStore, StoreError};
