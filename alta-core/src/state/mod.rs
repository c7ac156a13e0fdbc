//! Experiment phase state machine
//!
//! The phase table is explicit, finite and deterministic. Deciding *when*
//! an event fires is the job of [`crate::experiment::PhaseMachine`].

pub mod events;
pub mod machine;

pub use events::PhaseEvent;
pub use machine::Phase;
