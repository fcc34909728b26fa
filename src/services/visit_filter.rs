//! Visit filter - keeps the place visits that overlap the lookback window

use crate::domain::timeline::{PlaceVisit, TimelineEntry};
use crate::domain::window::TimeWindow;
use tracing::debug;

/// Keep place visits overlapping `window`, in input order.
///
/// Activity segments are dropped. A visit is dropped only when it ends
/// strictly before the window starts or starts strictly after it ends.
pub fn filter_recent_visits<I>(entries: I, window: &TimeWindow) -> Vec<PlaceVisit>
where
    I: IntoIterator<Item = TimelineEntry>,
{
    let mut entries_seen = 0usize;
    let mut place_visits = 0usize;

    let visits: Vec<PlaceVisit> = entries
        .into_iter()
        .inspect(|_| entries_seen += 1)
        .filter_map(TimelineEntry::into_place_visit)
        .inspect(|_| place_visits += 1)
        .filter(|visit| visit.interval().overlaps(window))
        .collect();

    debug!(
        entries = %entries_seen,
        place_visits = %place_visits,
        kept = %visits.len(),
        window_start_ms = %window.start,
        window_end_ms = %window.end,
        "visits_filtered"
    );

    visits
}
