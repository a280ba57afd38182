use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LeadError {
    #[error("Lead not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type LeadResult<T> = Result<T, LeadError>;

impl From<sea_orm::DbErr> for LeadError {
    fn from(err: sea_orm::DbErr) -> Self {
        LeadError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for LeadError {
    fn from(err: redis::RedisError) -> Self {
        LeadError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for LeadError {
    fn from(err: serde_json::Error) -> Self {
        LeadError::Serialization(err.to_string())
    }
}
