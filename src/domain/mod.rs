//! Domain models - location history and time windows
//!
//! This module contains the canonical data types used throughout the crate:
//! - `LocationHistory` / `TimelineEntry` - one parsed month file of the export
//! - `PlaceVisit` - a stay at a place, the unit that gets matched
//! - `TimestampMs` / `TimeWindow` - numeric epoch-ms instants and closed intervals
//! - `LookbackWindow` - the window ending at the reference date
//! - `ParseError` / `WindowError` - why an export or window is unusable

pub mod error;
pub mod timeline;
pub mod window;

pub use error::{ParseError, WindowError};
pub use timeline::{LocationHistory, PlaceVisit, TimelineEntry};
pub use window::{LookbackWindow, TimeWindow, TimestampMs};
