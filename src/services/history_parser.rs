//! History parser - turns export files into one flat timeline
//!
//! Fail-fast: one unreadable file fails the whole parse, since it almost
//! always means the wrong export was supplied.

use crate::domain::error::ParseError;
use crate::domain::timeline::{LocationHistory, TimelineEntry};
use crate::io::export_reader::ExportFile;
use tracing::{debug, warn};

/// Parse a single month file
pub fn parse_history(file: &str, text: &str) -> Result<LocationHistory, ParseError> {
    serde_json::from_str(text).map_err(|source| {
        warn!(file = %file, error = %source, "history_parse_failed");
        ParseError::InvalidDocument { file: file.to_string(), source }
    })
}

/// Parse every file and concatenate their timeline entries in file order
pub fn parse_histories(files: &[ExportFile]) -> Result<Vec<TimelineEntry>, ParseError> {
    let mut entries = Vec::new();
    for file in files {
        let history = parse_history(&file.name, &file.text)?;
        debug!(file = %file.name, entries = %history.timeline_objects.len(), "history_parsed");
        entries.extend(history.timeline_objects);
    }
    Ok(entries)
}
