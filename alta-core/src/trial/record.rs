//! Log rows and trial records

use core::fmt;

use super::artifact::{artifact_id, ArtifactId};
use crate::experiment::{Conclusion, Outcome, TerminalMetric};
use crate::profile::{Profile, ProfileKind};

/// One logged tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogRow {
    pub elapsed_ms: u32,
    pub primary: f32,
    pub secondary: Option<f32>,
    pub optical: f32,
    pub label: &'static str,
}

/// CSV rendering without the trailing newline
///
/// `elapsed_ms,primary,secondary,optical,label`, secondary empty when absent.
impl fmt::Display for LogRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{:.2},", self.elapsed_ms, self.primary)?;
        if let Some(secondary) = self.secondary {
            write!(f, "{:.2}", secondary)?;
        }
        write!(f, ",{:.1},{}", self.optical, self.label)
    }
}

/// Summary record of one trial
///
/// Rows are streamed to the store as they are produced; the record only
/// keeps the count and the latest row.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    repeat: u32,
    kind: ProfileKind,
    parameter: f32,
    rows: u32,
    last_row: Option<LogRow>,
    conclusion: Option<Conclusion>,
}

impl TrialRecord {
    pub fn new(repeat: u32, profile: &Profile) -> Self {
        Self {
            repeat,
            kind: profile.kind(),
            parameter: profile.parameter(),
            rows: 0,
            last_row: None,
            conclusion: None,
        }
    }

    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    pub fn parameter(&self) -> f32 {
        self.parameter
    }

    /// Count a row; ignored once the record is finalized
    pub fn push(&mut self, row: LogRow) {
        if self.conclusion.is_none() {
            self.rows += 1;
            self.last_row = Some(row);
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn last_row(&self) -> Option<&LogRow> {
        self.last_row.as_ref()
    }

    /// Record the conclusion; fails if one was already recorded
    pub fn finalize(&mut self, conclusion: Conclusion) -> Result<(), Conclusion> {
        match self.conclusion {
            Some(existing) => Err(existing),
            None => {
                self.conclusion = Some(conclusion);
                Ok(())
            }
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.conclusion.is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.conclusion.map(|c| c.outcome)
    }

    pub fn metric(&self) -> Option<TerminalMetric> {
        self.conclusion.map(|c| c.metric)
    }

    /// Permanent artifact identifier, once finalized
    pub fn identifier(&self) -> Option<ArtifactId> {
        let c = self.conclusion?;
        artifact_id(self.repeat, self.kind, self.parameter, c.outcome, c.metric).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    fn row(elapsed_ms: u32) -> LogRow {
        LogRow {
            elapsed_ms,
            primary: -15.0,
            secondary: None,
            optical: 3000.0,
            label: "Hold",
        }
    }

    fn frozen() -> Conclusion {
        Conclusion {
            outcome: Outcome::Frozen,
            metric: TerminalMetric::ElapsedMs(34_200),
            final_temperature: -15.1,
        }
    }

    #[test]
    fn test_row_csv() {
        assert_eq!(row(200).to_string(), "200,-15.00,,3000.0,Hold");
        let with_probe = LogRow {
            secondary: Some(-14.25),
            ..row(400)
        };
        assert_eq!(with_probe.to_string(), "400,-15.00,-14.25,3000.0,Hold");
    }

    #[test]
    fn test_finalize_once() {
        let mut record = TrialRecord::new(23, &Profile::Isothermal { setpoint: -15.0 });
        record.push(row(200));
        record.push(row(400));
        assert_eq!(record.identifier(), None);

        assert!(record.finalize(frozen()).is_ok());
        assert!(record.finalize(frozen()).is_err());
        assert_eq!(record.outcome(), Some(Outcome::Frozen));

        record.push(row(600));
        assert_eq!(record.rows(), 2);
        assert_eq!(record.last_row().map(|r| r.elapsed_ms), Some(400));
    }

    #[test]
    fn test_identifier() {
        let mut record = TrialRecord::new(23, &Profile::Isothermal { setpoint: -15.0 });
        record.finalize(frozen()).unwrap();
        assert_eq!(
            record.identifier().as_deref(),
            Some("23_isothermal-15.0_frozen_34200")
        );
    }
}
