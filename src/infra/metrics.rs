//! Scan summary - counters for one check, reported as a single log event

use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// What one run read, kept and matched
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub files_read: usize,
    pub entries_parsed: usize,
    pub place_visits: usize,
    pub visits_in_window: usize,
    /// None until matching has produced a determined result
    pub contacts: Option<usize>,
    pub elapsed_ms: u64,
    #[serde(skip)]
    started_at: Instant,
}

impl ScanSummary {
    pub fn new() -> Self {
        Self {
            files_read: 0,
            entries_parsed: 0,
            place_visits: 0,
            visits_in_window: 0,
            contacts: None,
            elapsed_ms: 0,
            started_at: Instant::now(),
        }
    }

    /// Stamp elapsed time since creation
    pub fn finish(&mut self) {
        self.elapsed_ms = self.started_at.elapsed().as_millis() as u64;
    }

    /// Activity segments seen while parsing
    pub fn activity_segments(&self) -> usize {
        self.entries_parsed.saturating_sub(self.place_visits)
    }

    pub fn log(&self) {
        info!(
            files = %self.files_read,
            entries = %self.entries_parsed,
            place_visits = %self.place_visits,
            activity_segments = %self.activity_segments(),
            visits_in_window = %self.visits_in_window,
            contacts = ?self.contacts,
            elapsed_ms = %self.elapsed_ms,
            "scan_summary"
        );
    }
}

impl Default for ScanSummary {
    fn default() -> Self {
        Self::new()
    }
}
