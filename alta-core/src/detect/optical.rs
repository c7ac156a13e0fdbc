//! Optical freeze detection against a clear baseline

/// Intensity-drop detector
#[derive(Debug, Clone)]
pub struct OpticalDetector {
    threshold: f32,
    baseline: Option<f32>,
}

impl OpticalDetector {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            baseline: None,
        }
    }

    /// Capture the clear-sample intensity for this trial
    pub fn begin(&mut self, baseline: f32) {
        self.baseline = Some(baseline);
    }

    pub fn baseline(&self) -> Option<f32> {
        self.baseline
    }

    /// Check a reading against `baseline - threshold` (strict)
    ///
    /// Never fires before a baseline has been captured.
    pub fn is_frozen(&self, reading: f32) -> bool {
        match self.baseline {
            Some(baseline) => reading < baseline - self.threshold,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_is_strict() {
        let mut det = OpticalDetector::new(150.0);
        det.begin(3000.0);
        assert!(!det.is_frozen(2850.0));
        assert!(!det.is_frozen(2900.0));
        assert!(det.is_frozen(2849.9));
        assert!(det.is_frozen(2840.0));
    }

    #[test]
    fn test_no_baseline_never_fires() {
        let det = OpticalDetector::new(150.0);
        assert!(!det.is_frozen(0.0));
    }
}
