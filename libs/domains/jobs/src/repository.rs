use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::JobResult;
use crate::models::{CreateJob, JobResults, JobStatus, WorkflowJob};

/// Repository trait for workflow job persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a queued job
    async fn create(&self, input: CreateJob) -> JobResult<WorkflowJob>;

    /// Load a job by ID
    async fn get_by_id(&self, id: Uuid) -> JobResult<Option<WorkflowJob>>;

    /// Cheap status read for control polling
    async fn status(&self, id: Uuid) -> JobResult<Option<JobStatus>>;

    /// Transition to processing with the start timestamp
    async fn transition_processing(&self, id: Uuid, at: DateTime<Utc>) -> JobResult<()>;

    /// Record the lead count once eligibility is known
    async fn set_total_leads(&self, id: Uuid, total: i32) -> JobResult<()>;

    /// Whole-lead progress write (throttled by the caller)
    async fn update_progress(&self, id: Uuid, processed: i32, progress: i32) -> JobResult<()>;

    /// Control-plane status write (pause/cancel target state)
    async fn set_status(&self, id: Uuid, status: JobStatus) -> JobResult<()>;

    /// Terminal write: status, results, error, completion timestamp
    async fn finish(
        &self,
        id: Uuid,
        status: JobStatus,
        results: Option<JobResults>,
        error_message: Option<String>,
        at: DateTime<Utc>,
    ) -> JobResult<()>;
}
