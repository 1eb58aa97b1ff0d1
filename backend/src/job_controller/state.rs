//! Shared state of background dispatch jobs.
//!
//! A dispatch runs outside the request/response cycle. The handler that starts
//! it registers the job as `Pending` and returns its id; the spawned task then
//! reports `InProgress`, `Completed` or `Failed` through an MPSC channel, and a
//! single updater task applies those reports to the shared map that the
//! status endpoint reads.
//!
//! Finished jobs stay readable for [`FINISHED_JOB_TTL`] and are then dropped,
//! on the next update or registration.

use common::jobs::JobStatus;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};

/// Capacity of the update channel. Progress reports beyond it are dropped,
/// terminal reports wait for room.
pub const UPDATE_CHANNEL_CAPACITY: usize = 100;

/// How long a completed or failed job can still be polled.
pub const FINISHED_JOB_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug)]
struct JobEntry {
    status: JobStatus,
    finished_at: Option<Instant>,
}

/// Clonable handle to every job's status, injected as `web::Data`.
#[derive(Clone)]
pub struct JobsState {
    /// Job id to latest status. Written only by [`start_job_updater`] after
    /// registration.
    jobs: Arc<RwLock<HashMap<String, JobEntry>>>,

    retention: Duration,

    /// Where running jobs push their [`JobUpdate`]s.
    pub tx: mpsc::Sender<JobUpdate>,
}

/// One status report from a running job.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobsState {
    /// Creates an empty state and the receiver to hand to [`start_job_updater`].
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        Self::with_retention(FINISHED_JOB_TTL)
    }

    /// Like [`JobsState::new`], keeping finished jobs for `retention`.
    pub fn with_retention(retention: Duration) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            retention,
            tx,
        };
        (state, rx)
    }

    /// Registers a new job as `Pending` and returns its id.
    pub async fn register(&self) -> String {
        let job_id = uuid::Uuid::new_v4().to_string();
        let mut jobs = self.jobs.write().await;
        prune_finished(&mut jobs, self.retention);
        jobs.insert(
            job_id.clone(),
            JobEntry {
                status: JobStatus::Pending,
                finished_at: None,
            },
        );
        job_id
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).map(|e| e.status.clone())
    }

    #[cfg(test)]
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }
}

fn prune_finished(jobs: &mut HashMap<String, JobEntry>, retention: Duration) {
    jobs.retain(|_, entry| entry.finished_at.map_or(true, |at| at.elapsed() < retention));
}

/// Applies every [`JobUpdate`] to the shared map until all senders are gone.
///
/// A late `InProgress` report never overwrites a terminal status.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        prune_finished(&mut jobs, state.retention);
        let finished = jobs.get(&update.job_id).is_some_and(|e| e.finished_at.is_some());
        if !finished {
            let finished_at = update.status.is_terminal().then(Instant::now);
            jobs.insert(
                update.job_id,
                JobEntry {
                    status: update.status,
                    finished_at,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::batch::BatchResult;

    #[tokio::test]
    async fn updater_applies_reports_and_keeps_terminal_status() {
        let (state, rx) = JobsState::new();
        let job_id = state.register().await;
        assert_eq!(state.status(&job_id).await, Some(JobStatus::Pending));

        let tx = state.tx.clone();
        let updater = tokio::spawn(start_job_updater(state.clone(), rx));

        for status in [
            JobStatus::InProgress { sent: 1, total: 2 },
            JobStatus::Completed(BatchResult::default()),
            JobStatus::InProgress { sent: 2, total: 2 },
        ] {
            tx.send(JobUpdate {
                job_id: job_id.clone(),
                status,
            })
            .await
            .unwrap();
        }
        drop(tx);
        // the state itself still holds a sender, so stop the loop by hand
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        updater.abort();

        assert_eq!(
            state.status(&job_id).await,
            Some(JobStatus::Completed(BatchResult::default()))
        );
        assert_eq!(state.status("missing").await, None);
    }

    #[tokio::test]
    async fn finished_jobs_are_dropped_after_retention() {
        let (state, rx) = JobsState::with_retention(Duration::ZERO);
        let done = state.register().await;
        let running = state.register().await;

        let tx = state.tx.clone();
        let updater = tokio::spawn(start_job_updater(state.clone(), rx));
        tx.send(JobUpdate {
            job_id: done.clone(),
            status: JobStatus::Failed("mail service down".into()),
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        updater.abort();

        let next = state.register().await;
        assert_eq!(state.status(&done).await, None);
        assert_eq!(state.status(&running).await, Some(JobStatus::Pending));
        assert_eq!(state.status(&next).await, Some(JobStatus::Pending));
        assert_eq!(state.job_count().await, 2);
    }
}
