//! Artifact identifiers and repeat numbering
//!
//! Identifiers look like `23_isothermal-15.0_frozen_34200`: repeat number,
//! profile kind and parameter, outcome, terminal metric.

use core::fmt::Write;

use heapless::String;

use crate::experiment::{Outcome, TerminalMetric};
use crate::profile::ProfileKind;
use crate::traits::StoreError;

/// Identifier of the in-progress trial log
pub const PLACEHOLDER: &str = "running";

/// Longest identifier produced
pub const MAX_ID_LEN: usize = 64;

pub type ArtifactId = String<MAX_ID_LEN>;

/// Build the permanent identifier of a trial log
pub fn artifact_id(
    repeat: u32,
    kind: ProfileKind,
    parameter: f32,
    outcome: Outcome,
    metric: TerminalMetric,
) -> Result<ArtifactId, StoreError> {
    let mut id = ArtifactId::new();
    write!(
        id,
        "{}_{}{:.1}_{}_{}",
        repeat,
        kind.as_str(),
        parameter,
        outcome.as_str(),
        metric
    )
    .map_err(|_| StoreError::InvalidIdentifier)?;
    Ok(id)
}

/// Repeat number of an existing artifact
///
/// `None` for the placeholder and for names without a numeric prefix.
pub fn parse_repeat(name: &str) -> Option<u32> {
    if name == PLACEHOLDER {
        return None;
    }
    name.split('_').next()?.parse().ok()
}

/// Next repeat number: one past the highest existing, 1 on an empty store
pub fn next_repeat<'a, I>(names: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter_map(parse_repeat)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_after_gap() {
        let names = [
            "1_isothermal-15.0_frozen_34200",
            "2_isothermal-15.0_liquid_150000",
            "4_isothermal-15.0_early_-8.40",
        ];
        assert_eq!(next_repeat(names), 5);
    }

    #[test]
    fn test_empty_store_starts_at_one() {
        let names: [&str; 0] = [];
        assert_eq!(next_repeat(names), 1);
    }

    #[test]
    fn test_placeholder_and_junk_ignored() {
        let names = ["running", "notes", "7_linear-1.0_frozen_-12.30", "_x"];
        assert_eq!(next_repeat(names), 8);
        assert_eq!(parse_repeat("running"), None);
    }

    #[test]
    fn test_ids() {
        let id = artifact_id(
            3,
            ProfileKind::Linear,
            -0.5,
            Outcome::Frozen,
            TerminalMetric::Temperature(-12.3),
        )
        .unwrap();
        assert_eq!(id.as_str(), "3_linear-0.5_frozen_-12.30");
        assert_eq!(parse_repeat(&id), Some(3));
    }
}
