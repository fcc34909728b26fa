//! Known exposures - place id to the time windows a contagious person was there
//!
//! `ExposureSource` is the only thing the matcher depends on, so the
//! built-in table can be replaced by any other store.

use crate::domain::window::TimeWindow;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::OnceLock;
use tracing::debug;

/// Built-in exposures: (place id, start ms, end ms)
const BUILTIN_EXPOSURES: &[(&str, i64, i64)] =
    &[("ChIJtxrD5mPq9EcRvotPVFs0CJc", 1583225265000, 1583233357000)];

/// Lookup of exposure windows by place id
pub trait ExposureSource: Send + Sync {
    /// Exposure windows recorded for `place_id`; empty when the place is unknown
    fn exposure_windows(&self, place_id: &str) -> &[TimeWindow];
}

/// In-memory exposure table
#[derive(Debug, Clone, Default)]
pub struct ExposureTable {
    windows: FxHashMap<String, SmallVec<[TimeWindow; 2]>>,
}

impl ExposureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shipped with the binary
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_EXPOSURES
                .iter()
                .map(|&(place_id, start, end)| (place_id, TimeWindow::from_millis(start, end))),
        )
    }

    /// Built-in table, built once per process
    pub fn shared_builtin() -> &'static ExposureTable {
        static BUILTIN: OnceLock<ExposureTable> = OnceLock::new();
        BUILTIN.get_or_init(ExposureTable::builtin)
    }

    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, TimeWindow)>,
    {
        let mut table = Self::new();
        for (place_id, window) in entries {
            table.insert(place_id, window);
        }
        table
    }

    /// Append a window for a place, keeping insertion order
    pub fn insert(&mut self, place_id: &str, window: TimeWindow) {
        debug!(
            place_id = %place_id,
            start_ms = %window.start,
            end_ms = %window.end,
            "exposure_window_added"
        );
        self.windows.entry(place_id.to_string()).or_default().push(window);
    }

    /// Number of places with at least one window
    pub fn place_count(&self) -> usize {
        self.windows.len()
    }

    pub fn window_count(&self) -> usize {
        self.windows.values().map(|w| w.len()).sum()
    }
}

impl ExposureSource for ExposureTable {
    fn exposure_windows(&self, place_id: &str) -> &[TimeWindow] {
        self.windows.get(place_id).map(|w| w.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = ExposureTable::builtin();
        assert_eq!(table.place_count(), 1);
        assert_eq!(
            table.exposure_windows("ChIJtxrD5mPq9EcRvotPVFs0CJc"),
            &[TimeWindow::from_millis(1583225265000, 1583233357000)]
        );
    }

    #[test]
    fn test_shared_builtin_is_same_instance() {
        let a = ExposureTable::shared_builtin();
        let b = ExposureTable::shared_builtin();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.window_count(), 1);
    }

    #[test]
    fn test_unknown_place_is_empty() {
        let table = ExposureTable::builtin();
        assert!(table.exposure_windows("unknown").is_empty());
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut table = ExposureTable::new();
        table.insert("P1", TimeWindow::from_millis(300, 400));
        table.insert("P1", TimeWindow::from_millis(100, 200));
        table.insert("P1", TimeWindow::from_millis(500, 600));

        assert_eq!(
            table.exposure_windows("P1"),
            &[
                TimeWindow::from_millis(300, 400),
                TimeWindow::from_millis(100, 200),
                TimeWindow::from_millis(500, 600),
            ]
        );
        assert_eq!(table.place_count(), 1);
        assert_eq!(table.window_count(), 3);
    }

    #[test]
    fn test_shared_builtin_copy_is_independent() {
        let mut table = ExposureTable::shared_builtin().clone();
        table.insert("P2", TimeWindow::from_millis(1, 2));

        assert_eq!(table.place_count(), 2);
        assert_eq!(ExposureTable::shared_builtin().place_count(), 1);
    }
}
