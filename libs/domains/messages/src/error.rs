use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Message not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),
}

pub type MessageResult<T> = Result<T, MessageError>;

impl From<sea_orm::DbErr> for MessageError {
    fn from(err: sea_orm::DbErr) -> Self {
        MessageError::Database(err.to_string())
    }
}
