//! Latent-heat (exotherm) freeze detection

use super::window::DetectionWindow;

/// Fires when the temperature rises by more than `rise` across the window
#[derive(Debug, Clone)]
pub struct LatentHeatDetector {
    window: DetectionWindow,
    rise: f32,
}

impl LatentHeatDetector {
    pub fn new(window: usize, rise: f32) -> Self {
        Self {
            window: DetectionWindow::new(window),
            rise,
        }
    }

    pub fn window(&self) -> &DetectionWindow {
        &self.window
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    /// Compare the sample against the oldest in a full window, then insert it
    pub fn observe(&mut self, temperature: f32) -> bool {
        let fired = match self.window.oldest() {
            Some(oldest) if self.window.is_full() => temperature - oldest > self.rise,
            _ => false,
        };
        self.window.push(temperature);
        if fired {
            debug!("latent: exotherm at {}", temperature);
        }
        fired
    }
}
