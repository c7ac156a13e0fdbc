//! Trial log storage trait
//!
//! Each trial streams its rows into a placeholder artifact. When the trial
//! is classified the placeholder is either renamed to its permanent
//! identifier or discarded.

use crate::trial::LogRow;

/// Errors from log storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Underlying I/O failed
    Io,
    /// Storage is full
    Full,
    /// No placeholder is open
    NotOpen,
    /// A placeholder is already open
    AlreadyOpen,
    /// Identifier rejected by the backend
    InvalidIdentifier,
    /// Target identifier already exists
    Exists,
}

/// Persistent store for trial logs
///
/// Identifiers carry no extension; the backend adds whatever it needs.
pub trait ArtifactStore {
    /// Call `visit` with the identifier of every finalized artifact
    ///
    /// The in-progress placeholder may be reported too; callers filter it.
    fn visit_artifacts(&mut self, visit: &mut dyn FnMut(&str)) -> Result<(), StoreError>;

    /// Create (or truncate) the placeholder artifact for a new trial
    fn begin(&mut self) -> Result<(), StoreError>;

    /// Append one row to the placeholder
    fn append(&mut self, row: &LogRow) -> Result<(), StoreError>;

    /// Atomically rename the placeholder to its permanent identifier
    fn finalize(&mut self, identifier: &str) -> Result<(), StoreError>;

    /// Delete the placeholder without keeping it
    fn discard(&mut self) -> Result<(), StoreError>;
}
