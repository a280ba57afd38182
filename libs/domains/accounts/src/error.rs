use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("LinkedIn account not found: {0}")]
    NotFound(Uuid),

    #[error("No active LinkedIn account for user {0}")]
    NoActiveAccount(Uuid),

    #[error("Session bundle error: {0}")]
    Session(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type AccountResult<T> = Result<T, AccountError>;

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        AccountError::Database(err.to_string())
    }
}
