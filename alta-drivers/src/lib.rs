//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in alta-core over `embedded-hal` 1.0:
//!
//! - Peltier H-bridge (direction relays, PWM, forced-air fans)
//! - Light dependent resistor behind an ADC

#![no_std]
#![deny(unsafe_code)]

pub mod peltier;
pub mod sensor;
