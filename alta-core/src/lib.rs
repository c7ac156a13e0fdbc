//! Board-agnostic core logic for the ALTA freezing apparatus
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (sensors, Peltier actuator, display, log store, ticker)
//! - PI(D) control law, feed-forward and IMC tuning
//! - Stage abstraction enforcing hot-switch avoidance
//! - Freeze detectors (optical threshold, latent-heat window)
//! - Phase state machine for isothermal and linear-ramp experiments
//! - Trial runner, outcome classification and artifact naming
//! - Sensor hold policy and warm-fault checks
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod config;
pub mod control;
pub mod detect;
pub mod experiment;
pub mod profile;
pub mod safety;
pub mod stage;
pub mod state;
pub mod traits;
pub mod trial;

pub use config::ExperimentConfig;
pub use profile::Profile;
pub use trial::{TrialRecord, TrialRunner};
