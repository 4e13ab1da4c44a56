//! Single-flight download job queue.
//!
//! Any number of producers append jobs; one drain task runs them strictly in
//! arrival order, one at a time. The drain task exists only while there is
//! work: `enqueue` starts it when none is running, and it exits when it finds
//! the queue empty after finishing a job. Both decisions are taken under the
//! same lock, so a job enqueued while the drain task is exiting either gets
//! popped by it or starts a new drain task; it is never stranded.

mod drain;
mod job;

pub use job::{JobEvent, JobFuture, JobId, JobState};

use futures::FutureExt;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, Notify};
use tokio::task::AbortHandle;

use crate::error::DownloadError;
use job::Job;

const EVENT_CAPACITY: usize = 64;

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Job>,
    draining: bool,
    closed: bool,
    running: Option<(JobId, AbortHandle)>,
}

struct Inner {
    state: Mutex<QueueState>,
    next_id: AtomicU64,
    idle: Notify,
    events: broadcast::Sender<JobEvent>,
    runtime: Handle,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, id: JobId, label: &str, state: JobState, error: Option<String>) {
        // No subscribers is fine.
        let _ = self.events.send(JobEvent {
            id,
            label: label.to_string(),
            state,
            error,
        });
    }
}

/// Cheap to clone; all clones share one queue.
#[derive(Clone)]
pub struct DownloadQueue {
    inner: Arc<Inner>,
}

impl DownloadQueue {
    /// Queue whose jobs and drain task run on `runtime`. Producers may call
    /// `enqueue` from any thread, including ones outside the runtime.
    pub fn new(runtime: Handle) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                next_id: AtomicU64::new(1),
                idle: Notify::new(),
                events,
                runtime,
            }),
        }
    }

    /// Append a job to the tail and make sure a drain task is running.
    ///
    /// `label` is used in logs and events only.
    pub fn enqueue<F, Fut>(&self, label: impl Into<String>, job: F) -> Result<JobId, DownloadError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let label = label.into();
        let start_drain = {
            let mut st = self.inner.lock();
            if st.closed {
                return Err(DownloadError::QueueClosed);
            }
            // Emitted under the lock so `Queued` always precedes `Running`.
            self.inner.emit(id, &label, JobState::Queued, None);
            st.pending.push_back(Job {
                id,
                label: label.clone(),
                body: Box::new(move || job().boxed()),
            });
            !std::mem::replace(&mut st.draining, true)
        };

        tracing::debug!(job_id = id, label = %label, "job queued");

        if start_drain {
            self.inner.runtime.spawn(drain::drain(Arc::clone(&self.inner)));
        }
        Ok(id)
    }

    /// Number of jobs waiting (not counting the running one).
    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Id of the job currently executing, if any.
    pub fn running(&self) -> Option<JobId> {
        self.inner.lock().running.as_ref().map(|(id, _)| *id)
    }

    pub fn is_idle(&self) -> bool {
        let st = self.inner.lock();
        !st.draining && st.pending.is_empty()
    }

    /// Wait until no job is queued or running.
    pub async fn idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    /// Observe job state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.events.subscribe()
    }

    /// Refuse further jobs, drop queued ones and abandon the running one.
    pub fn shutdown(&self) {
        let (dropped, running) = {
            let mut st = self.inner.lock();
            st.closed = true;
            let dropped = std::mem::take(&mut st.pending);
            (dropped, st.running.as_ref().map(|(_, h)| h.clone()))
        };
        for job in &dropped {
            self.inner
                .emit(job.id, &job.label, JobState::Failed, Some("abandoned at shutdown".into()));
        }
        if let Some(handle) = running {
            handle.abort();
        }
        tracing::info!(abandoned = dropped.len(), "download queue shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}
