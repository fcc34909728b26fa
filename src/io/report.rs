//! Check report - what the user sees at the end of a run
//!
//! Human-readable verdict on stdout by default, or one JSON object with
//! `--json`.

use crate::domain::timeline::PlaceVisit;
use crate::domain::window::LookbackWindow;
use crate::infra::metrics::ScanSummary;
use crate::services::check_session::CheckStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Process exit code for a status
pub fn exit_code(status: &CheckStatus) -> u8 {
    match status {
        CheckStatus::Undetermined { .. } => 2,
        _ => 0,
    }
}

/// Message shown to the user for a settled status
pub fn verdict_text(status: &CheckStatus, window: &LookbackWindow) -> String {
    let since = window.start().format("%Y-%m-%d");
    let until = window.reference().format("%Y-%m-%d");
    match status {
        CheckStatus::Determined(report) if report.contacts() > 0 => format!(
            "You were at least {} time(s) at the same place as a person infected with \
             SARS-CoV-2 between {} and {}.\nIf you have symptoms, call your doctor.",
            report.contacts(),
            since,
            until
        ),
        CheckStatus::Determined(report) => format!(
            "No SARS-CoV-2 contact found in your history between {} and {} ({} visits checked).",
            since, until, report.visits_checked
        ),
        CheckStatus::Idle | CheckStatus::Computing => format!(
            "No place visits found between {} and {}; nothing to check.",
            since, until
        ),
        CheckStatus::Undetermined { reason } => format!(
            "An error occurred, make sure you supplied the right location history export.\n({})",
            reason
        ),
    }
}

/// JSON form of a finished run
#[derive(Debug, Serialize)]
pub struct CheckOutput<'a> {
    pub run_id: Uuid,
    pub reference: DateTime<Utc>,
    pub window_start_ms: i64,
    pub window_end_ms: i64,
    pub status: &'static str,
    pub contacts: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
    pub matches: &'a [PlaceVisit],
    pub summary: &'a ScanSummary,
}

impl<'a> CheckOutput<'a> {
    pub fn new(
        run_id: Uuid,
        window: &LookbackWindow,
        status: &'a CheckStatus,
        summary: &'a ScanSummary,
    ) -> Self {
        let bounds = window.window();
        let no_matches: &'a [PlaceVisit] = &[];
        let (label, reason, matches) = match status {
            CheckStatus::Idle => ("idle", None, no_matches),
            CheckStatus::Computing => ("computing", None, no_matches),
            CheckStatus::Determined(report) => ("determined", None, report.matches.as_slice()),
            CheckStatus::Undetermined { reason } => {
                ("undetermined", Some(reason.as_str()), no_matches)
            }
        };

        Self {
            run_id,
            reference: window.reference(),
            window_start_ms: bounds.start.as_millis(),
            window_end_ms: bounds.end.as_millis(),
            status: label,
            contacts: status.contacts(),
            reason,
            matches,
            summary,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| error_json(&e.to_string()))
    }
}

/// `{"error": message}`, escaped
fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::contact_matcher::ContactReport;
    use chrono::TimeZone;

    fn window() -> LookbackWindow {
        LookbackWindow::days(Utc.with_ymd_and_hms(2020, 3, 16, 12, 0, 0).unwrap(), 15).unwrap()
    }

    fn determined(contacts: usize) -> CheckStatus {
        CheckStatus::Determined(ContactReport {
            visits_checked: 5,
            matches: (0..contacts).map(|i| PlaceVisit::new("P1", i as i64, i as i64 + 10)).collect(),
        })
    }

    #[test]
    fn test_verdict_with_contacts() {
        let text = verdict_text(&determined(2), &window());
        assert!(text.contains("at least 2 time(s)"));
        assert!(text.contains("2020-03-01"));
        assert!(text.contains("2020-03-16"));
    }

    #[test]
    fn test_verdict_without_contacts() {
        let text = verdict_text(&determined(0), &window());
        assert!(text.starts_with("No SARS-CoV-2 contact found"));
        assert!(text.contains("5 visits checked"));
    }

    #[test]
    fn test_verdict_undetermined() {
        let status = CheckStatus::Undetermined { reason: "bad file".to_string() };
        let text = verdict_text(&status, &window());
        assert!(text.contains("right location history export"));
        assert!(text.contains("bad file"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&determined(3)), 0);
        assert_eq!(exit_code(&CheckStatus::Idle), 0);
        assert_eq!(exit_code(&CheckStatus::Undetermined { reason: String::new() }), 2);
    }

    #[test]
    fn test_json_output() {
        let status = determined(1);
        let summary = ScanSummary::new();
        let output = CheckOutput::new(Uuid::now_v7(), &window(), &status, &summary);

        let parsed: serde_json::Value = serde_json::from_str(&output.to_json()).unwrap();
        assert_eq!(parsed["status"], "determined");
        assert_eq!(parsed["contacts"], 1);
        assert_eq!(parsed["matches"][0]["location"]["placeId"], "P1");
        assert_eq!(parsed["window_end_ms"].as_i64().unwrap() - parsed["window_start_ms"].as_i64().unwrap(), 15 * 86_400_000);
        assert!(parsed.get("reason").is_none());
    }

    #[test]
    fn test_json_output_undetermined() {
        let status = CheckStatus::Undetermined { reason: "bad file".to_string() };
        let summary = ScanSummary::new();
        let output = CheckOutput::new(Uuid::now_v7(), &window(), &status, &summary);

        let parsed: serde_json::Value = serde_json::from_str(&output.to_json()).unwrap();
        assert_eq!(parsed["status"], "undetermined");
        assert!(parsed["contacts"].is_null());
        assert_eq!(parsed["reason"], "bad file");
        assert_eq!(parsed["matches"], serde_json::json!([]));
    }

    #[test]
    fn test_error_json_escapes_message() {
        let text = error_json("key must be a string: \"a\\b\"\n");
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["error"], "key must be a string: \"a\\b\"\n");
    }
}
