//! Scan job records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::JobStatus;

/// Number of hex characters kept from a v4 UUID for a job id
pub const JOB_ID_LEN: usize = 16;

/// Generate an opaque job id
pub fn generate_job_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(JOB_ID_LEN);
    id
}

/// One execution of the scan pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanJob {
    pub job_id: String,
    /// Source connection string with credentials masked
    pub source_descriptor: String,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    /// Set once the job reaches a terminal state
    pub finished_at: Option<DateTime<Utc>>,
    /// Only set on `FAILED`
    pub error_message: Option<String>,
}

impl ScanJob {
    /// Create a new job in the `RUNNING` state
    pub fn start(source_descriptor: impl Into<String>) -> Self {
        Self {
            job_id: generate_job_id(),
            source_descriptor: source_descriptor.into(),
            status: JobStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            error_message: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Job listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub status: JobStatus,
    pub source_descriptor: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl From<ScanJob> for JobSummary {
    fn from(job: ScanJob) -> Self {
        Self {
            job_id: job.job_id,
            status: job.status,
            source_descriptor: job.source_descriptor,
            started_at: job.started_at,
            finished_at: job.finished_at,
            error_message: job.error_message,
        }
    }
}
