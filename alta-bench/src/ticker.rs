//! Sample clocks for the simulated stage

use std::thread;
use std::time::{Duration, Instant};

use alta_core::traits::Ticker;

use crate::sim::SimulatedStage;

/// Advances the simulated plant one sample period per tick
///
/// By default ticks run back to back; [`SimTicker::realtime`] paces them
/// against the wall clock instead.
pub struct SimTicker {
    stage: SimulatedStage,
    period_ms: u32,
    pacing: Option<Pacing>,
}

struct Pacing {
    period: Duration,
    deadline: Option<Instant>,
}

impl SimTicker {
    pub fn new(stage: SimulatedStage, period_ms: u32) -> Self {
        Self {
            stage,
            period_ms,
            pacing: None,
        }
    }

    /// Sleep so that ticks are one sample period apart in wall time
    pub fn realtime(mut self, enabled: bool) -> Self {
        self.pacing = enabled.then(|| Pacing {
            period: Duration::from_millis(u64::from(self.period_ms)),
            deadline: None,
        });
        self
    }
}

impl Pacing {
    fn wait(&mut self) {
        let now = Instant::now();
        let deadline = self.deadline.map_or(now + self.period, |d| d.max(now));
        if let Some(remaining) = deadline.checked_duration_since(now) {
            thread::sleep(remaining);
        }
        self.deadline = Some(deadline + self.period);
    }
}

impl Ticker for SimTicker {
    fn now_ms(&mut self) -> u32 {
        self.stage.now_ms()
    }

    fn wait(&mut self) {
        if let Some(pacing) = self.pacing.as_mut() {
            pacing.wait();
        }
        self.stage.advance(self.period_ms);
    }
}
