//! Job identity, lifecycle states and the events the queue broadcasts.

use futures::future::BoxFuture;

/// Job identifier, unique within one queue.
pub type JobId = u64;

/// Boxed job body; runs once on its own task.
pub type JobFuture = BoxFuture<'static, anyhow::Result<()>>;

pub(super) type JobBody = Box<dyn FnOnce() -> JobFuture + Send + 'static>;

/// Lifecycle of a queued job. No state leads back to `Queued`: a failed job is
/// never retried, a fresh user action creates a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// State transition of one job, as seen by queue observers.
#[derive(Debug, Clone)]
pub struct JobEvent {
    pub id: JobId,
    pub label: String,
    pub state: JobState,
    /// Failure message for `Failed`.
    pub error: Option<String>,
}

pub(super) struct Job {
    pub(super) id: JobId,
    pub(super) label: String,
    pub(super) body: JobBody,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
