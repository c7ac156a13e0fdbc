//! Filesystem artifact store
//!
//! Each trial is streamed to `running.csv` in the log directory and
//! renamed to `<identifier>.csv` once classified. Existing `*.csv` files
//! are what repeat numbering continues from.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use alta_core::traits::{ArtifactStore, StoreError};
use alta_core::trial::{LogRow, PLACEHOLDER};
use tracing::{debug, error, info};

use crate::error::BenchError;

const EXTENSION: &str = "csv";

/// Trial logs in a directory
pub struct FsArtifactStore {
    dir: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FsArtifactStore {
    /// Open (creating if needed) the log directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, BenchError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| BenchError::LogDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir, writer: None })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the in-progress trial log
    pub fn placeholder_path(&self) -> PathBuf {
        self.path_for(PLACEHOLDER)
    }

    fn path_for(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{identifier}.{EXTENSION}"))
    }

    /// Whether a trial log is currently open
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn close(&mut self) -> Result<(), StoreError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(io_error)?;
        }
        Ok(())
    }
}

fn io_error(e: io::Error) -> StoreError {
    error!(error = %e, "log store i/o failed");
    StoreError::Io
}

fn valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier != PLACEHOLDER
        && !identifier.contains(['/', '\\'])
        && !identifier.starts_with('.')
}

impl ArtifactStore for FsArtifactStore {
    fn visit_artifacts(&mut self, visit: &mut dyn FnMut(&str)) -> Result<(), StoreError> {
        for entry in fs::read_dir(&self.dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                visit(stem);
            }
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.writer.is_some() {
            return Err(StoreError::AlreadyOpen);
        }
        let path = self.placeholder_path();
        debug!(path = %path.display(), "opening trial log");
        let file = File::create(&path).map_err(io_error)?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }

    fn append(&mut self, row: &LogRow) -> Result<(), StoreError> {
        let writer = self.writer.as_mut().ok_or(StoreError::NotOpen)?;
        writeln!(writer, "{row}").map_err(io_error)
    }

    fn finalize(&mut self, identifier: &str) -> Result<(), StoreError> {
        if self.writer.is_none() {
            return Err(StoreError::NotOpen);
        }
        if !valid_identifier(identifier) {
            return Err(StoreError::InvalidIdentifier);
        }
        let target = self.path_for(identifier);
        if target.exists() {
            return Err(StoreError::Exists);
        }
        self.close()?;
        fs::rename(self.placeholder_path(), &target).map_err(io_error)?;
        info!(path = %target.display(), "trial log saved");
        Ok(())
    }

    fn discard(&mut self) -> Result<(), StoreError> {
        if self.writer.is_none() {
            return Err(StoreError::NotOpen);
        }
        self.close()?;
        fs::remove_file(self.placeholder_path()).map_err(io_error)?;
        debug!("trial log discarded");
        Ok(())
    }
}
