//! Status display trait
//!
//! The apparatus carries a 16x2 character LCD. It is purely observational:
//! nothing shown there feeds back into control.

/// Errors that can occur with display communication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Bus error while writing
    Bus,
    /// Display did not acknowledge
    NotResponding,
}

/// Width of one display row in characters
pub const DISPLAY_COLUMNS: usize = 16;

/// Trait for the status display
pub trait StatusDisplay {
    /// Show the banner line (experiment kind and repeat number)
    fn show_banner(&mut self, text: &str) -> Result<(), DisplayError>;

    /// Show the per-tick status line (phase, temperature, elapsed seconds)
    fn show_status(&mut self, text: &str) -> Result<(), DisplayError>;
}

/// Display that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl StatusDisplay for NullDisplay {
    fn show_banner(&mut self, _text: &str) -> Result<(), DisplayError> {
        Ok(())
    }

    fn show_status(&mut self, _text: &str) -> Result<(), DisplayError> {
        Ok(())
    }
}
