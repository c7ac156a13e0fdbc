//! Closed-loop temperature control
//!
//! - [`law`]: the PI(D) control law
//! - [`feed_forward`]: setpoint-dependent duty bias and overshoot margin
//! - [`tuning`]: IMC gains from a step-response model

pub mod feed_forward;
pub mod law;
pub mod tuning;

pub use feed_forward::{FeedForward, OvershootConfig, MAX_COEFFICIENTS};
pub use law::{clamp_duty, ControlLaw, ControlOutput, ControllerConfig, DutyRounding};
pub use tuning::{Aggressiveness, FopdtModel, ImcTuning, TuningError};
