//! Trial outcome classification

use core::fmt;

use super::context::PhaseContext;
use crate::profile::ProfileKind;
use crate::safety::WarmFaultGuard;
use crate::state::PhaseEvent;

/// Trial outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Froze under control
    Frozen,
    /// Did not freeze in time
    Liquid,
    /// Froze before the hold was reached
    Early,
    /// Sensor fault; the log is discarded
    Aborted,
}

impl Outcome {
    /// Name used in artifact identifiers
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Frozen => "frozen",
            Outcome::Liquid => "liquid",
            Outcome::Early => "early",
            Outcome::Aborted => "aborted",
        }
    }

    /// Check if the trial log is kept
    pub fn keeps_log(&self) -> bool {
        !matches!(self, Outcome::Aborted)
    }
}

/// Number recorded with the outcome
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TerminalMetric {
    /// Milliseconds (lag time or time spent cooling)
    ElapsedMs(u32),
    /// Temperature (°C)
    Temperature(f32),
}

impl fmt::Display for TerminalMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalMetric::ElapsedMs(ms) => write!(f, "{}", ms),
            TerminalMetric::Temperature(t) => write!(f, "{:.2}", t),
        }
    }
}

/// Classified end of the cooling part of a trial
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Conclusion {
    pub outcome: Outcome,
    pub metric: TerminalMetric,
    /// Primary temperature on the terminal tick
    pub final_temperature: f32,
}

/// Classify a trial from the event that ended its cooling part
///
/// The warm-fault check runs first and overrides everything else.
pub fn classify(
    kind: ProfileKind,
    event: PhaseEvent,
    context: &PhaseContext,
    final_temperature: f32,
    warm: &WarmFaultGuard,
) -> Conclusion {
    let (outcome, metric) = if event == PhaseEvent::WarmFault || warm.at_terminal(final_temperature)
    {
        (Outcome::Aborted, TerminalMetric::Temperature(final_temperature))
    } else {
        match (kind, event) {
            (ProfileKind::Isothermal, PhaseEvent::FreezeDetected) => match context.hold_start_ms {
                Some(_) => (Outcome::Frozen, TerminalMetric::ElapsedMs(context.elapsed_ms)),
                None => (Outcome::Early, TerminalMetric::Temperature(final_temperature)),
            },
            (ProfileKind::Isothermal, _) => {
                (Outcome::Liquid, TerminalMetric::ElapsedMs(context.elapsed_ms))
            }
            (ProfileKind::Linear, PhaseEvent::FreezeDetected) => {
                (Outcome::Frozen, TerminalMetric::Temperature(final_temperature))
            }
            (ProfileKind::Linear, _) => {
                (Outcome::Liquid, TerminalMetric::ElapsedMs(context.elapsed_ms))
            }
        }
    };

    Conclusion {
        outcome,
        metric,
        final_temperature,
    }
}
