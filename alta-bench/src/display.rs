//! Status display rendered through `tracing`
//!
//! Mirrors the 16x2 character display of the apparatus: the banner line
//! is logged at info level when it changes, the status line at debug.

use alta_core::traits::{DisplayError, StatusDisplay, DISPLAY_COLUMNS};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct TracingDisplay {
    banner: String,
    status: String,
}

impl TracingDisplay {
    pub fn banner(&self) -> &str {
        &self.banner
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

fn line(text: &str) -> String {
    format!("{:^width$}", text, width = DISPLAY_COLUMNS)
        .chars()
        .take(DISPLAY_COLUMNS)
        .collect()
}

impl StatusDisplay for TracingDisplay {
    fn show_banner(&mut self, text: &str) -> Result<(), DisplayError> {
        let text = line(text);
        if text != self.banner {
            info!(target: "alta::display", "[{}]", text);
            self.banner = text;
        }
        Ok(())
    }

    fn show_status(&mut self, text: &str) -> Result<(), DisplayError> {
        self.status = line(text);
        debug!(target: "alta::display", "[{}]", self.status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_centred_and_truncated() {
        let mut display = TracingDisplay::default();
        display.show_banner("Isothermal 3").unwrap();
        assert_eq!(display.banner(), "  Isothermal 3  ");
        display.show_status("Hold -15.0    60 and more").unwrap();
        assert_eq!(display.status().chars().count(), DISPLAY_COLUMNS);
        assert!(display.status().starts_with("Hold -15.0"));
    }
}
