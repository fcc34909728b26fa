//! Contact matcher - finds visits that overlap a known exposure at the same place

use crate::domain::timeline::PlaceVisit;
use crate::services::exposure_table::ExposureSource;
use serde::Serialize;
use tracing::debug;

/// Result of matching a set of visits against the exposure source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactReport {
    /// Visits that were checked
    pub visits_checked: usize,
    /// Visits overlapping at least one exposure window, in input order
    pub matches: Vec<PlaceVisit>,
}

impl ContactReport {
    /// Number of visits that overlap at least one exposure window
    pub fn contacts(&self) -> usize {
        self.matches.len()
    }
}

/// True when the visit overlaps any exposure window recorded for its place
#[inline]
pub fn is_contact<S: ExposureSource + ?Sized>(visit: &PlaceVisit, source: &S) -> bool {
    let interval = visit.interval();
    source
        .exposure_windows(visit.place_id())
        .iter()
        .any(|exposure| interval.meets_exposure(exposure))
}

/// Visits that overlap at least one exposure window; each visit appears once
/// however many windows it overlaps
pub fn find_contacts<'a, S: ExposureSource + ?Sized>(
    visits: &'a [PlaceVisit],
    source: &S,
) -> Vec<&'a PlaceVisit> {
    visits.iter().filter(|visit| is_contact(*visit, source)).collect()
}

/// Number of visits that overlap at least one exposure window
pub fn count_contacts<S: ExposureSource + ?Sized>(visits: &[PlaceVisit], source: &S) -> usize {
    visits.iter().filter(|visit| is_contact(*visit, source)).count()
}

/// Full report over owned visits
pub fn match_contacts<S: ExposureSource + ?Sized>(visits: &[PlaceVisit], source: &S) -> ContactReport {
    let matches: Vec<PlaceVisit> = find_contacts(visits, source).into_iter().cloned().collect();
    debug!(visits = %visits.len(), contacts = %matches.len(), "contacts_matched");
    ContactReport { visits_checked: visits.len(), matches }
}
