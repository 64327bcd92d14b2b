use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::quiz::Question;
use crate::source::remote::GenerateError;

/// Extra time past the HTTP timeout before the app gives up on a job.
pub const DEADLINE_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a background generation, tagged with the job that produced it.
#[derive(Debug)]
pub struct GenerationDone {
    pub job_id: u64,
    pub outcome: Result<Vec<Question>, GenerateError>,
}

/// One in-flight generation on a worker thread.
pub struct GenerationJob {
    id: u64,
    token: CancelToken,
    started_at: Instant,
    deadline: Duration,
}

impl GenerationJob {
    /// Run `work` on a worker thread and hand its outcome to `notify`.
    /// A job cancelled before `work` returns reports `Cancelled` instead.
    pub fn spawn<W, N>(id: u64, deadline: Duration, now: Instant, work: W, notify: N) -> Self
    where
        W: FnOnce() -> Result<Vec<Question>, GenerateError> + Send + 'static,
        N: FnOnce(GenerationDone) + Send + 'static,
    {
        let token = CancelToken::new();
        let worker_token = token.clone();
        thread::spawn(move || {
            let outcome = work();
            let outcome = if worker_token.is_cancelled() {
                debug!(job_id = id, "generation finished after cancellation");
                Err(GenerateError::Cancelled)
            } else {
                outcome
            };
            notify(GenerationDone {
                job_id: id,
                outcome,
            });
        });
        Self {
            id,
            token,
            started_at: now,
            deadline,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_overdue(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) > self.deadline
    }
}
