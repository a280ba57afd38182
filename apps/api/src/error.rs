//! Standardized JSON error responses

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    InternalServerError(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::BadRequest(m)
            | AppError::Unauthorized(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m)
            | AppError::Conflict(m)
            | AppError::InternalServerError(m) => m,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.message() }));
        (status, body).into_response()
    }
}

impl From<domain_jobs::JobError> for AppError {
    fn from(err: domain_jobs::JobError) -> Self {
        match err {
            domain_jobs::JobError::NotFound(id) => {
                AppError::NotFound(format!("Job {} not found", id))
            }
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl From<domain_accounts::AccountError> for AppError {
    fn from(err: domain_accounts::AccountError) -> Self {
        match err {
            domain_accounts::AccountError::NotFound(id) => {
                AppError::NotFound(format!("LinkedIn account {} not found", id))
            }
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl From<domain_leads::LeadError> for AppError {
    fn from(err: domain_leads::LeadError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<domain_connections::ConnectionCheckError> for AppError {
    fn from(err: domain_connections::ConnectionCheckError) -> Self {
        match err {
            domain_connections::ConnectionCheckError::SessionInvalid(reason) => {
                AppError::Conflict(format!("Session invalid: {}", reason))
            }
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::BadRequest("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InternalServerError("x".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
