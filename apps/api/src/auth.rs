//! Caller identity extraction
//!
//! Authentication and session issuance live outside this core; the
//! upstream proxy forwards the authenticated user as `x-user-id`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;

pub struct CallerId(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for CallerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing x-user-id header".to_string()))?;

        let user_id = Uuid::parse_str(header)
            .map_err(|_| AppError::Unauthorized("Invalid x-user-id header".to_string()))?;

        Ok(CallerId(user_id))
    }
}
