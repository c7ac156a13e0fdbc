//! Configuration types
//!
//! Board-agnostic experiment configuration. Hosts load it from TOML with
//! the `serde` feature; firmware can build it in code from the defaults.

pub mod types;

pub use types::*;
