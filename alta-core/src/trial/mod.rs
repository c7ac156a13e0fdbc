//! Trial execution and bookkeeping
//!
//! - [`record`]: log rows and the per-trial record
//! - [`artifact`]: artifact identifiers and repeat numbering
//! - [`runner`]: the trial loop driving sensors, stage, display and store

pub mod artifact;
pub mod record;
pub mod runner;

pub use artifact::{artifact_id, next_repeat, parse_repeat, ArtifactId, PLACEHOLDER};
pub use record::{LogRow, TrialRecord};
pub use runner::{Apparatus, RunError, RunSummary, TrialRunner};
