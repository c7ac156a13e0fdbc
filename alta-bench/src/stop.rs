//! Stop conditions for a bench run

use std::path::PathBuf;

use alta_core::traits::StopSignal;
use tracing::info;

/// Stops after a trial count or once a stop file appears
///
/// Polled by the runner after each trial, so the trial in progress and
/// its melt recovery always complete.
#[derive(Debug, Clone)]
pub struct BenchStop {
    limit: Option<u32>,
    completed: u32,
    stop_file: Option<PathBuf>,
}

impl BenchStop {
    pub fn new(limit: Option<u32>, stop_file: Option<PathBuf>) -> Self {
        Self {
            limit,
            completed: 0,
            stop_file,
        }
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }
}

impl StopSignal for BenchStop {
    fn stop_requested(&mut self) -> bool {
        self.completed = self.completed.saturating_add(1);
        if self.limit.is_some_and(|limit| self.completed >= limit) {
            info!(trials = self.completed, "trial limit reached");
            return true;
        }
        if let Some(path) = &self.stop_file {
            if path.exists() {
                info!(path = %path.display(), "stop file found");
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_limit() {
        let mut stop = BenchStop::new(Some(2), None);
        assert!(!stop.stop_requested());
        assert!(stop.stop_requested());
        assert_eq!(stop.completed(), 2);
    }

    #[test]
    fn test_unlimited_without_file() {
        let mut stop = BenchStop::new(None, None);
        assert!((0..100).all(|_| !stop.stop_requested()));
    }

    #[test]
    fn test_stop_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("STOP");
        let mut stop = BenchStop::new(None, Some(path.clone()));
        assert!(!stop.stop_requested());
        std::fs::write(&path, "").unwrap();
        assert!(stop.stop_requested());
    }
}
