//! In-memory job store.
//!
//! Job state lives for the lifetime of the process and is lost on restart;
//! clients that poll an id from a previous run get `NotFound`. All handler
//! and pipeline tasks share one store through `Arc`.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::models::job::{DubResult, DubbingJob, JobStatus, JobUpdate};

/// Thread-safe map of job id to job record.
///
/// Lock sections are short and never held across await points; reads hand
/// out cloned snapshots.
pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, DubbingJob>>,
    /// When set, terminal jobs older than this are evicted lazily on create.
    completed_job_ttl: Option<Duration>,
}

impl JobStore {
    pub fn new(completed_job_ttl: Option<Duration>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            completed_job_ttl,
        }
    }

    /// Insert a fresh queued job and return its id.
    ///
    /// Panics on a duplicate id: with v4 generation that means id generation
    /// is broken, and overwriting an existing record silently would corrupt
    /// a live job.
    pub fn create(&self) -> Uuid {
        if let Some(ttl) = self.completed_job_ttl {
            self.evict_completed(ttl);
        }

        let job = DubbingJob::queued(Uuid::new_v4());
        let id = job.id;

        let mut jobs = self.jobs.write().expect("job store lock poisoned");
        if jobs.insert(id, job).is_some() {
            panic!("duplicate job id generated: {id}");
        }
        metrics::gauge!("dubbing_jobs_in_store").set(jobs.len() as f64);

        id
    }

    /// Snapshot of a job's current state.
    pub fn get(&self, id: Uuid) -> Result<DubbingJob, StoreError> {
        let jobs = self.jobs.read().expect("job store lock poisoned");
        jobs.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    /// Apply a partial update to a job.
    ///
    /// Terminal records reject all updates, progress is clamped so it never
    /// decreases, and `completed_at` is stamped when the update lands the
    /// job in a terminal state.
    pub fn update(&self, id: Uuid, update: JobUpdate) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().expect("job store lock poisoned");
        let job = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if job.status.is_terminal() {
            return Err(StoreError::TerminalState(id));
        }

        if let Some(status) = update.status {
            job.status = status;
        }
        if let Some(progress) = update.progress {
            job.progress = job.progress.max(progress.min(100));
        }
        if let Some(message) = update.message {
            job.message = message;
        }
        if let Some(result) = update.result {
            job.result = Some(result);
        }
        if let Some(error) = update.error {
            job.error = Some(error);
        }

        if job.status.is_terminal() {
            job.completed_at = Some(Utc::now());
        }

        Ok(())
    }

    pub fn mark_processing(
        &self,
        id: Uuid,
        progress: u8,
        message: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.update(
            id,
            JobUpdate {
                status: Some(JobStatus::Processing),
                ..JobUpdate::progress(progress, message)
            },
        )
    }

    pub fn mark_completed(
        &self,
        id: Uuid,
        result: DubResult,
        message: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.update(id, JobUpdate::completed(result, message))
    }

    pub fn mark_failed(&self, id: Uuid, error: impl Into<String>) -> Result<(), StoreError> {
        self.update(id, JobUpdate::failed(error))
    }

    pub fn len(&self) -> usize {
        self.jobs.read().expect("job store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop terminal jobs whose `completed_at` is older than `ttl`.
    /// Running and queued jobs are never touched. Returns the number evicted.
    pub fn evict_completed(&self, ttl: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());

        let mut jobs = self.jobs.write().expect("job store lock poisoned");
        let before = jobs.len();
        jobs.retain(|_, job| match job.completed_at {
            Some(completed_at) => completed_at > cutoff,
            None => true,
        });
        let evicted = before - jobs.len();

        if evicted > 0 {
            metrics::gauge!("dubbing_jobs_in_store").set(jobs.len() as f64);
            tracing::debug!(evicted, "Evicted expired completed jobs");
        }

        evicted
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Job {0} is already in a terminal state")]
    TerminalState(Uuid),
}
