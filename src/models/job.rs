use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Lifecycle state of a dubbing job.
///
/// `Completed` and `Failed` are terminal: once a job reaches either, the
/// store refuses further transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A dubbing job as tracked by the in-memory store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DubbingJob {
    pub id: Uuid,
    pub status: JobStatus,
    /// Coarse pipeline progress, 0-100. Never decreases.
    pub progress: u8,
    /// Human-readable description of the current stage.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DubResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl DubbingJob {
    /// A freshly submitted job, before the pipeline has touched it.
    pub fn queued(id: Uuid) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            progress: 0,
            message: "Starting dubbing process...".to_string(),
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Payload attached to a job that finished successfully.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DubResult {
    /// Streamable URL of the dubbed video (or the original in demo mode).
    pub video_url: String,
    pub target_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    /// True when synthesis/composition were skipped for lack of a
    /// configured voice provider.
    pub demo_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub processing_time_secs: f64,
}

/// Partial update applied to a stored job. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub message: Option<String>,
    pub result: Option<DubResult>,
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn progress(progress: u8, message: impl Into<String>) -> Self {
        Self {
            progress: Some(progress),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn completed(result: DubResult, message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(100),
            message: Some(message.into()),
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            status: Some(JobStatus::Failed),
            message: Some(error.clone()),
            error: Some(error),
            ..Default::default()
        }
    }
}
