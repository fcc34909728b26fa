//! Check session - keeps only the most recent contact computation live
//!
//! Each submission bumps a generation counter and cancels the previous
//! in-flight computation. A computation publishes its result only if its
//! generation is still current, checked under the watch channel's lock, so a
//! superseded result can never overwrite the observable status.

use crate::domain::timeline::PlaceVisit;
use crate::services::cancelable::{CancelableTask, Canceler};
use crate::services::contact_matcher::{match_contacts, ContactReport};
use crate::services::exposure_table::ExposureSource;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Observable outcome of the latest submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Nothing to check yet (no upload, or no visits in the window)
    Idle,
    /// A computation is running
    Computing,
    /// Matching finished
    Determined(ContactReport),
    /// The export could not be parsed; a new upload is needed
    Undetermined { reason: String },
}

impl CheckStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, CheckStatus::Computing)
    }

    /// Contact count, when determined
    pub fn contacts(&self) -> Option<usize> {
        match self {
            CheckStatus::Determined(report) => Some(report.contacts()),
            _ => None,
        }
    }
}

/// Status tagged with the submission that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub status: CheckStatus,
}

/// Runs contact matching for one user, latest submission wins
pub struct CheckSession {
    source: Arc<dyn ExposureSource>,
    state_tx: Arc<watch::Sender<SessionSnapshot>>,
    in_flight: Mutex<Option<Canceler>>,
}

impl CheckSession {
    pub fn new(source: Arc<dyn ExposureSource>) -> Self {
        let (state_tx, _) =
            watch::channel(SessionSnapshot { generation: 0, status: CheckStatus::Idle });
        Self { source, state_tx: Arc::new(state_tx), in_flight: Mutex::new(None) }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state_tx.borrow().clone()
    }

    pub fn status(&self) -> CheckStatus {
        self.state_tx.borrow().status.clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_tx.subscribe()
    }

    /// Start matching `visits`, superseding any in-flight computation.
    /// Returns the submission's generation. Must be called inside a runtime.
    pub fn submit(&self, visits: Vec<PlaceVisit>) -> u64 {
        let mut in_flight = self.in_flight.lock();
        let status =
            if visits.is_empty() { CheckStatus::Idle } else { CheckStatus::Computing };
        let generation = self.advance(&mut in_flight, status);

        if visits.is_empty() {
            debug!(generation = %generation, "check_skipped_no_visits");
            return generation;
        }

        info!(generation = %generation, visits = %visits.len(), "check_started");

        let source = Arc::clone(&self.source);
        let task = CancelableTask::spawn(move || match_contacts(&visits, source.as_ref()));
        *in_flight = Some(task.canceler());

        let state_tx = Arc::clone(&self.state_tx);
        tokio::spawn(async move {
            let Some(report) = task.join().await else {
                debug!(generation = %generation, "check_result_dropped");
                return;
            };
            let contacts = report.contacts();
            let published = state_tx.send_if_modified(|state| {
                if state.generation != generation {
                    return false;
                }
                state.status = CheckStatus::Determined(report);
                true
            });
            if published {
                info!(generation = %generation, contacts = %contacts, "check_completed");
            } else {
                debug!(generation = %generation, "check_result_stale");
            }
        });

        generation
    }

    /// Record that the latest upload could not be parsed
    pub fn report_undetermined(&self, reason: &str) -> u64 {
        let mut in_flight = self.in_flight.lock();
        let generation = self.advance(
            &mut in_flight,
            CheckStatus::Undetermined { reason: reason.to_string() },
        );
        info!(generation = %generation, reason = %reason, "check_undetermined");
        generation
    }

    /// Cancel whatever is running without starting anything new
    pub fn cancel(&self) {
        let mut in_flight = self.in_flight.lock();
        self.advance(&mut in_flight, CheckStatus::Idle);
    }

    /// Wait until the latest submission has settled
    pub async fn wait_settled(&self) -> CheckStatus {
        let mut rx = self.subscribe();
        let status = match rx.wait_for(|state| state.status.is_settled()).await {
            Ok(state) => state.status.clone(),
            // sender lives as long as self; unreachable in practice
            Err(_) => self.status(),
        };
        status
    }

    fn advance(&self, in_flight: &mut Option<Canceler>, status: CheckStatus) -> u64 {
        if let Some(previous) = in_flight.take() {
            previous.cancel();
            debug!("check_superseded");
        }
        let mut generation = 0;
        self.state_tx.send_modify(|state| {
            state.generation += 1;
            state.status = status;
            generation = state.generation;
        });
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::window::TimeWindow;
    use crate::services::exposure_table::ExposureTable;
    use std::sync::mpsc;

    fn source() -> Arc<dyn ExposureSource> {
        Arc::new(ExposureTable::from_entries([("P1", TimeWindow::from_millis(150, 250))]))
    }

    /// Exposure source that blocks lookups until released
    struct GatedSource {
        inner: ExposureTable,
        gate: std::sync::Mutex<mpsc::Receiver<()>>,
    }

    impl ExposureSource for GatedSource {
        fn exposure_windows(&self, place_id: &str) -> &[TimeWindow] {
            if let Ok(rx) = self.gate.lock() {
                rx.recv().ok();
            }
            self.inner.exposure_windows(place_id)
        }
    }

    #[tokio::test]
    async fn test_initial_status_idle() {
        let session = CheckSession::new(source());
        assert_eq!(session.status(), CheckStatus::Idle);
        assert_eq!(session.snapshot().generation, 0);
    }

    #[tokio::test]
    async fn test_submit_determines_count() {
        let session = CheckSession::new(source());
        session.submit(vec![PlaceVisit::new("P1", 100, 200), PlaceVisit::new("P2", 100, 200)]);

        let status = session.wait_settled().await;
        assert_eq!(status.contacts(), Some(1));
    }

    #[tokio::test]
    async fn test_empty_submission_stays_idle() {
        let session = CheckSession::new(source());
        let generation = session.submit(Vec::new());

        assert_eq!(generation, 1);
        assert_eq!(session.wait_settled().await, CheckStatus::Idle);
    }

    #[tokio::test]
    async fn test_newer_submission_supersedes_in_flight() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let gated = Arc::new(GatedSource {
            inner: ExposureTable::from_entries([("P1", TimeWindow::from_millis(150, 250))]),
            gate: std::sync::Mutex::new(release_rx),
        });
        let session = CheckSession::new(gated);

        // First computation blocks on the gate
        let first = session.submit(vec![PlaceVisit::new("P1", 100, 200)]);
        // Second one supersedes it; it also needs the gate
        let second = session.submit(vec![
            PlaceVisit::new("P1", 100, 200),
            PlaceVisit::new("P1", 120, 220),
        ]);
        assert!(second > first);
        assert_eq!(session.status(), CheckStatus::Computing);

        // Release every pending lookup
        for _ in 0..3 {
            release_tx.send(()).ok();
        }

        let status = session.wait_settled().await;
        assert_eq!(status.contacts(), Some(2));
        assert_eq!(session.snapshot().generation, second);

        // Give the superseded task time to finish; it must not overwrite
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(session.status().contacts(), Some(2));
    }

    #[tokio::test]
    async fn test_undetermined_supersedes_in_flight() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let gated = Arc::new(GatedSource {
            inner: ExposureTable::builtin(),
            gate: std::sync::Mutex::new(release_rx),
        });
        let session = CheckSession::new(gated);

        session.submit(vec![PlaceVisit::new("P1", 100, 200)]);
        session.report_undetermined("not a location history export");
        release_tx.send(()).ok();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(
            session.status(),
            CheckStatus::Undetermined { reason: "not a location history export".to_string() }
        );
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let gated = Arc::new(GatedSource {
            inner: ExposureTable::builtin(),
            gate: std::sync::Mutex::new(release_rx),
        });
        let session = CheckSession::new(gated);

        session.submit(vec![PlaceVisit::new("P1", 100, 200)]);
        session.cancel();
        release_tx.send(()).ok();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(session.status(), CheckStatus::Idle);
    }
}
