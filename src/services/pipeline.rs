//! Export to recent visits: read, parse, filter

use crate::domain::error::ParseError;
use crate::domain::timeline::{PlaceVisit, TimelineEntry};
use crate::domain::window::LookbackWindow;
use crate::infra::metrics::ScanSummary;
use crate::io::export_reader::{ExportError, ExportReader, FileSelection};
use crate::services::history_parser::parse_histories;
use crate::services::visit_filter::filter_recent_visits;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Files to read for this window
pub fn file_selection(window: &LookbackWindow, all_files: bool) -> FileSelection {
    if all_files {
        FileSelection::AllJson
    } else {
        FileSelection::Named(window.relevant_month_files())
    }
}

/// Read the export and return the place visits overlapping the window.
///
/// No matching files is not an error: the result is simply empty.
pub fn collect_recent_visits(
    reader: &dyn ExportReader,
    window: &LookbackWindow,
    all_files: bool,
    summary: &mut ScanSummary,
) -> Result<Vec<PlaceVisit>, CheckError> {
    let selection = file_selection(window, all_files);
    let files = reader.read_files(&selection)?;
    summary.files_read = files.len();

    let entries = parse_histories(&files)?;
    summary.entries_parsed = entries.len();
    summary.place_visits =
        entries.iter().filter(|e| matches!(e, TimelineEntry::PlaceVisit(_))).count();

    let visits = filter_recent_visits(entries, &window.window());
    summary.visits_in_window = visits.len();

    info!(
        files = %summary.files_read,
        entries = %summary.entries_parsed,
        visits_in_window = %summary.visits_in_window,
        "recent_visits_collected"
    );

    Ok(visits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::export_reader::{ExportFile, MemoryExport};
    use chrono::{TimeZone, Utc};

    fn march_window() -> LookbackWindow {
        // 2020-03-10 12:00 UTC, 15 days back to 2020-02-24 12:00 UTC
        LookbackWindow::days(Utc.with_ymd_and_hms(2020, 3, 10, 12, 0, 0).unwrap(), 15).unwrap()
    }

    fn history(objects: &str) -> String {
        format!(r#"{{"timelineObjects": [{}]}}"#, objects)
    }

    fn visit(place_id: &str, start: i64, end: i64) -> String {
        format!(
            r#"{{"placeVisit": {{"location": {{"placeId": "{}"}},
                "duration": {{"startTimestampMs": "{}", "endTimestampMs": "{}"}}}}}}"#,
            place_id, start, end
        )
    }

    #[test]
    fn test_selection_by_month() {
        assert_eq!(
            file_selection(&march_window(), false),
            FileSelection::Named(vec![
                "2020_FEBRUARY.json".to_string(),
                "2020_MARCH.json".to_string()
            ])
        );
        assert_eq!(file_selection(&march_window(), true), FileSelection::AllJson);
    }

    #[test]
    fn test_collects_only_selected_months_and_window() {
        // 2020-03-03 and 2020-01-15 visits; January file is not selected
        let export = MemoryExport::new(vec![
            ExportFile::new(
                "Takeout/2020/2020_MARCH.json",
                &history(&visit("IN", 1583225000000, 1583230000000)),
            ),
            ExportFile::new(
                "Takeout/2020/2020_FEBRUARY.json",
                &history(&visit("TOO_OLD", 1581000000000, 1581001000000)),
            ),
            ExportFile::new(
                "Takeout/2020/2020_JANUARY.json",
                &history(&visit("SKIPPED", 1579000000000, 1579001000000)),
            ),
        ]);

        let mut summary = ScanSummary::new();
        let visits = collect_recent_visits(&export, &march_window(), false, &mut summary).unwrap();

        let ids: Vec<&str> = visits.iter().map(|v| v.place_id()).collect();
        assert_eq!(ids, vec!["IN"]);
        assert_eq!(summary.files_read, 2);
        assert_eq!(summary.place_visits, 2);
        assert_eq!(summary.visits_in_window, 1);
    }

    #[test]
    fn test_no_matching_files_is_empty() {
        let export = MemoryExport::new(vec![ExportFile::new("2019_MAY.json", "not even json")]);
        let mut summary = ScanSummary::new();
        let visits = collect_recent_visits(&export, &march_window(), false, &mut summary).unwrap();
        assert!(visits.is_empty());
        assert_eq!(summary.files_read, 0);
    }

    #[test]
    fn test_parse_failure_surfaces() {
        let export = MemoryExport::new(vec![ExportFile::new("2020_MARCH.json", "{")]);
        let mut summary = ScanSummary::new();
        let err = collect_recent_visits(&export, &march_window(), false, &mut summary).unwrap_err();
        assert!(matches!(err, CheckError::Parse(ParseError::InvalidDocument { .. })));
    }
}
