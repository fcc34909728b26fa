//! Location-history document model (Google Takeout semantic history)
//!
//! Field names follow the export's JSON exactly; unknown fields are ignored
//! so richer exports (addresses, confidence, waypoints) still parse.

use crate::domain::window::{TimeWindow, TimestampMs};
use serde::{Deserialize, Serialize};

/// One month file of the export
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationHistory {
    pub timeline_objects: Vec<TimelineEntry>,
}

/// A timeline object is either a stay at a place or a movement between two
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TimelineEntry {
    PlaceVisit(PlaceVisit),
    ActivitySegment(ActivitySegment),
}

impl TimelineEntry {
    pub fn as_place_visit(&self) -> Option<&PlaceVisit> {
        match self {
            TimelineEntry::PlaceVisit(visit) => Some(visit),
            TimelineEntry::ActivitySegment(_) => None,
        }
    }

    pub fn into_place_visit(self) -> Option<PlaceVisit> {
        match self {
            TimelineEntry::PlaceVisit(visit) => Some(visit),
            TimelineEntry::ActivitySegment(_) => None,
        }
    }
}

/// Coordinates in degrees * 1e7, with an optional provider place id
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "latitudeE7", default, skip_serializing_if = "Option::is_none")]
    pub latitude_e7: Option<i64>,
    #[serde(rename = "longitudeE7", default, skip_serializing_if = "Option::is_none")]
    pub longitude_e7: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

/// Location of a place visit; the place id is mandatory here
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitLocation {
    #[serde(rename = "latitudeE7", default, skip_serializing_if = "Option::is_none")]
    pub latitude_e7: Option<i64>,
    #[serde(rename = "longitudeE7", default, skip_serializing_if = "Option::is_none")]
    pub longitude_e7: Option<i64>,
    pub place_id: String,
}

/// Start/end of a timeline object.
///
/// Older exports use `startTimestampMs` (decimal string), newer ones
/// `startTimestamp` (RFC 3339); both land in the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct VisitDuration {
    #[serde(rename = "startTimestampMs", alias = "startTimestamp")]
    pub start: TimestampMs,
    #[serde(rename = "endTimestampMs", alias = "endTimestamp")]
    pub end: TimestampMs,
}

/// A recorded stay at a place
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlaceVisit {
    pub location: VisitLocation,
    pub duration: VisitDuration,
}

impl PlaceVisit {
    pub fn new(place_id: &str, start_ms: i64, end_ms: i64) -> Self {
        Self {
            location: VisitLocation {
                latitude_e7: None,
                longitude_e7: None,
                place_id: place_id.to_string(),
            },
            duration: VisitDuration { start: TimestampMs(start_ms), end: TimestampMs(end_ms) },
        }
    }

    #[inline]
    pub fn place_id(&self) -> &str {
        &self.location.place_id
    }

    #[inline]
    pub fn interval(&self) -> TimeWindow {
        TimeWindow::new(self.duration.start, self.duration.end)
    }
}

/// Movement between two locations; carries nothing usable for matching
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_location: Option<Location>,
}
