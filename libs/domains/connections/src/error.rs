use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionCheckError {
    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    #[error("Account error: {0}")]
    Account(#[from] domain_accounts::AccountError),

    #[error("Lead error: {0}")]
    Lead(#[from] domain_leads::LeadError),

    #[error("Message error: {0}")]
    Message(#[from] domain_messages::MessageError),

    #[error("Automation error: {0}")]
    Automation(#[from] automation::AutomationError),
}

pub type ConnectionCheckResult<T> = Result<T, ConnectionCheckError>;
