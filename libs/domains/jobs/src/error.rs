use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Workflow job not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type JobResult<T> = Result<T, JobError>;

impl From<sea_orm::DbErr> for JobError {
    fn from(err: sea_orm::DbErr) -> Self {
        JobError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for JobError {
    fn from(err: redis::RedisError) -> Self {
        JobError::Bus(err.to_string())
    }
}

impl From<serde_json::Error> for JobError {
    fn from(err: serde_json::Error) -> Self {
        JobError::Serialization(err.to_string())
    }
}
