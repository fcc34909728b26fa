//! Exposure check library
//!
//! Reads a Google location-history export, keeps the place visits in the
//! lookback window before a reference date, and counts those that overlap a
//! known exposure at the same place.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
