//! Warm-fault check
//!
//! When the optical path fades, false freezes are reported while the stage
//! is still warm. A primary reading above the limit after cooling marks the
//! trial as untrustworthy.

use crate::config::{ThresholdConfig, WarmFaultCheck};
use crate::state::Phase;

#[derive(Debug, Clone, Copy)]
pub struct WarmFaultGuard {
    limit: f32,
    check: WarmFaultCheck,
}

impl WarmFaultGuard {
    pub fn new(thresholds: &ThresholdConfig) -> Self {
        Self {
            limit: thresholds.warm_fault_limit,
            check: thresholds.warm_fault_check,
        }
    }

    /// Per-tick check, active only under `DuringControl` in controlled phases
    pub fn during_control(&self, phase: Phase, primary: f32) -> bool {
        self.check == WarmFaultCheck::DuringControl
            && phase.is_controlled()
            && primary > self.limit
    }

    /// Check applied when the trial is classified
    pub fn at_terminal(&self, primary: f32) -> bool {
        primary > self.limit
    }
}
