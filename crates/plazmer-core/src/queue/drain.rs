//! The drain loop: pop, run to completion, repeat until empty.

use std::sync::Arc;
use std::time::Instant;

use super::job::JobState;
use super::Inner;

pub(super) async fn drain(inner: Arc<Inner>) {
    loop {
        // Pop, or observe empty and stop, as one step under the lock.
        let job = {
            let mut st = inner.lock();
            match st.pending.pop_front() {
                Some(job) => job,
                None => {
                    st.draining = false;
                    st.running = None;
                    drop(st);
                    inner.idle.notify_waiters();
                    return;
                }
            }
        };

        let started = Instant::now();
        // The factory runs on the job task too, so a panicking one is caught like any other.
        let body = job.body;
        let task = inner.runtime.spawn(async move { body().await });
        {
            let mut st = inner.lock();
            st.running = Some((job.id, task.abort_handle()));
        }
        tracing::info!(job_id = job.id, label = %job.label, "job started");
        inner.emit(job.id, &job.label, JobState::Running, None);

        let result = task.await;
        inner.lock().running = None;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(Ok(())) => {
                tracing::info!(job_id = job.id, label = %job.label, elapsed_ms, "job completed");
                inner.emit(job.id, &job.label, JobState::Completed, None);
            }
            Ok(Err(err)) => {
                tracing::warn!(job_id = job.id, label = %job.label, elapsed_ms, "job failed: {:#}", err);
                inner.emit(job.id, &job.label, JobState::Failed, Some(format!("{err:#}")));
            }
            Err(join_err) => {
                let msg = if join_err.is_cancelled() {
                    "abandoned at shutdown".to_string()
                } else {
                    "job panicked".to_string()
                };
                tracing::error!(job_id = job.id, label = %job.label, elapsed_ms, "{}", msg);
                inner.emit(job.id, &job.label, JobState::Failed, Some(msg));
            }
        }
    }
}
