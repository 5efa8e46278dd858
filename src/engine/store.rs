//! Bounded in-memory run store.
//!
//! Holds the optimization history and the error log behind explicit
//! size bounds (ring-buffer behavior: oldest entries fall off first).
//! The engine wraps the store in a mutex; the store itself is plain
//! data so the bounds are directly testable.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::OptimizationResult;

/// Maximum retained optimization results.
const HISTORY_CAPACITY: usize = 256;

/// Maximum retained error entries.
const ERROR_LOG_CAPACITY: usize = 100;

/// One logged failure with its surrounding context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// When the error occurred.
    pub timestamp: DateTime<Utc>,
    /// Pipeline stage or tier ("main", "fallback:simple", ...).
    pub context: String,
    /// Error description.
    pub message: String,
    /// Jobs in the run that failed.
    pub job_count: usize,
    /// Teams in the run that failed.
    pub team_count: usize,
}

/// Bounded history + error log for one engine instance.
#[derive(Debug, Default)]
pub struct RunStore {
    history: VecDeque<OptimizationResult>,
    errors: VecDeque<ErrorEntry>,
    weather_service_ok: bool,
}

impl RunStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            history: VecDeque::new(),
            errors: VecDeque::new(),
            weather_service_ok: true,
        }
    }

    /// Appends a result, evicting the oldest past capacity.
    pub fn record_result(&mut self, result: OptimizationResult) {
        if self.history.len() >= HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(result);
    }

    /// Appends an error entry, evicting the oldest past capacity.
    pub fn record_error(
        &mut self,
        context: impl Into<String>,
        message: impl Into<String>,
        job_count: usize,
        team_count: usize,
    ) {
        if self.errors.len() >= ERROR_LOG_CAPACITY {
            self.errors.pop_front();
        }
        self.errors.push_back(ErrorEntry {
            timestamp: Utc::now(),
            context: context.into(),
            message: message.into(),
            job_count,
            team_count,
        });
    }

    /// Retained results, oldest first.
    pub fn history(&self) -> Vec<OptimizationResult> {
        self.history.iter().cloned().collect()
    }

    /// Retained error entries, oldest first.
    pub fn error_log(&self) -> Vec<ErrorEntry> {
        self.errors.iter().cloned().collect()
    }

    /// Number of retained results.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Errors logged within the last 24 hours.
    pub fn errors_last_24h(&self) -> usize {
        let cutoff = Utc::now() - Duration::hours(24);
        self.errors.iter().filter(|e| e.timestamp >= cutoff).count()
    }

    /// Records the outcome of the latest weather fetch.
    pub fn set_weather_service_ok(&mut self, ok: bool) {
        self.weather_service_ok = ok;
    }

    /// Whether the latest weather fetch succeeded.
    pub fn weather_service_ok(&self) -> bool {
        self.weather_service_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Algorithm;

    fn result(run_id: &str) -> OptimizationResult {
        OptimizationResult::new(Algorithm::DbscanVrpMl, run_id)
    }

    #[test]
    fn test_history_bounded() {
        let mut store = RunStore::new();
        for i in 0..(HISTORY_CAPACITY + 10) {
            store.record_result(result(&format!("run-{i}")));
        }
        assert_eq!(store.history_len(), HISTORY_CAPACITY);
        // Oldest entries were evicted.
        assert_eq!(store.history()[0].run_id, "run-10");
    }

    #[test]
    fn test_error_log_bounded() {
        let mut store = RunStore::new();
        for i in 0..150 {
            store.record_error("main", format!("boom {i}"), 3, 2);
        }
        let log = store.error_log();
        assert_eq!(log.len(), ERROR_LOG_CAPACITY);
        assert_eq!(log[0].message, "boom 50");
        assert_eq!(log[0].job_count, 3);
    }

    #[test]
    fn test_errors_last_24h_counts_recent() {
        let mut store = RunStore::new();
        store.record_error("main", "fresh", 1, 1);
        assert_eq!(store.errors_last_24h(), 1);

        // Backdate an entry beyond the window.
        store.errors[0].timestamp = Utc::now() - Duration::hours(30);
        assert_eq!(store.errors_last_24h(), 0);
    }

    #[test]
    fn test_weather_flag() {
        let mut store = RunStore::new();
        assert!(store.weather_service_ok());
        store.set_weather_service_ok(false);
        assert!(!store.weather_service_ok());
    }
}
