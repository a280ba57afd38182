use thiserror::Error;

/// A pause/cancel signal observed mid-run
///
/// Raised out of the invite loop by the progress observer; the worker
/// maps it back to its control handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Paused,
    Cancelled,
}

impl std::fmt::Display for Interrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interrupt::Paused => write!(f, "workflow paused"),
            Interrupt::Cancelled => write!(f, "workflow cancelled"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("{0}")]
    ElementNotFound(String),

    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    #[error("{0}")]
    Interrupted(Interrupt),
}

pub type AutomationResult<T> = Result<T, AutomationError>;

impl From<chromiumoxide::error::CdpError> for AutomationError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AutomationError::Browser(err.to_string())
    }
}

impl AutomationError {
    /// The interrupt carried by this error, if it is one
    pub fn interrupt(&self) -> Option<Interrupt> {
        match self {
            AutomationError::Interrupted(interrupt) => Some(*interrupt),
            _ => None,
        }
    }
}
