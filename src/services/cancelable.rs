//! Cancelable task - runs a blocking computation off the caller's task
//!
//! The handle can be awaited or canceled. Once canceled, the computation's
//! result is discarded even if it finishes afterwards: `join` yields `None`.
//! Blocking work cannot be interrupted, so cancellation only guarantees the
//! late result is never delivered.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Cancels the task it was taken from. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Canceler {
    cancel_tx: Arc<watch::Sender<bool>>,
}

impl Canceler {
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_canceled(&self) -> bool {
        *self.cancel_tx.borrow()
    }
}

/// Handle to a computation running on the blocking pool
pub struct CancelableTask<T> {
    canceler: Canceler,
    handle: JoinHandle<Option<T>>,
}

impl<T: Send + 'static> CancelableTask<T> {
    /// Start `work` on tokio's blocking pool. Must be called inside a runtime.
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let canceler = Canceler { cancel_tx: Arc::new(cancel_tx) };

        let handle = tokio::spawn(async move {
            let work = tokio::task::spawn_blocking(work);

            let joined = tokio::select! {
                biased;
                _ = cancel_rx.wait_for(|canceled| *canceled) => None,
                joined = work => Some(joined),
            };

            match joined {
                None => {
                    debug!("task_canceled");
                    None
                }
                Some(Ok(_)) if *cancel_rx.borrow() => {
                    debug!("task_result_discarded");
                    None
                }
                Some(Ok(value)) => Some(value),
                Some(Err(e)) => {
                    warn!(error = %e, "task_failed");
                    None
                }
            }
        });

        Self { canceler, handle }
    }

    /// Request cancellation; any later result is dropped
    pub fn cancel(&self) {
        self.canceler.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.canceler.is_canceled()
    }

    /// A detached canceler for this task
    pub fn canceler(&self) -> Canceler {
        self.canceler.clone()
    }

    /// Wait for the result; `None` if the task was canceled or panicked
    pub async fn join(self) -> Option<T> {
        let result = self.handle.await.ok().flatten();
        if self.canceler.is_canceled() {
            return None;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_join_returns_result() {
        let task = CancelableTask::spawn(|| 40 + 2);
        assert_eq!(task.join().await, Some(42));
    }

    #[tokio::test]
    async fn test_cancel_before_completion_discards_result() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let task = CancelableTask::spawn(move || {
            release_rx.recv().ok();
            7
        });

        task.cancel();
        release_tx.send(()).ok();

        assert!(task.is_canceled());
        assert_eq!(task.join().await, None);
    }

    #[tokio::test]
    async fn test_cancel_after_completion_discards_result() {
        let task = CancelableTask::spawn(|| "done");
        tokio::time::sleep(Duration::from_millis(20)).await;

        task.cancel();
        assert_eq!(task.join().await, None);
    }

    #[tokio::test]
    async fn test_rejection_is_discarded_too() {
        let task = CancelableTask::spawn(|| Err::<u32, String>("bad export".to_string()));
        task.canceler().cancel();
        assert_eq!(task.join().await, None);
    }

    #[tokio::test]
    async fn test_rejection_delivered_when_not_canceled() {
        let task = CancelableTask::spawn(|| Err::<u32, String>("bad export".to_string()));
        assert_eq!(task.join().await, Some(Err("bad export".to_string())));
    }

    #[tokio::test]
    async fn test_panicking_work_yields_none() {
        let task: CancelableTask<u32> = CancelableTask::spawn(|| panic!("boom"));
        assert_eq!(task.join().await, None);
    }

    #[tokio::test]
    async fn test_detached_canceler() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let task = CancelableTask::spawn(move || {
            release_rx.recv().ok();
            1
        });
        let canceler = task.canceler();

        canceler.cancel();
        assert!(canceler.is_canceled());
        release_tx.send(()).ok();
        assert_eq!(task.join().await, None);
    }
}
