//! Per-tick experiment logic
//!
//! [`PhaseMachine`] turns one tick of sensor readings into an actuator
//! command. It owns the control law, the freeze detector and the phase
//! context of a single trial, and reports the trial's [`Conclusion`] on the
//! tick the cooling part ends.

pub mod classify;
pub mod context;
pub mod machine;

pub use classify::{classify, Conclusion, Outcome, TerminalMetric};
pub use context::{PhaseContext, Sample};
pub use machine::{PhaseMachine, Step};
