//! Peltier stage drivers

pub mod bridge;

pub use bridge::PeltierBridge;
