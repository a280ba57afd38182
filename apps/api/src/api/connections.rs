//! On-demand connection-acceptance check

use axum::Json;
use axum::extract::{Path, State};
use domain_accounts::{AccountRepository, LimitKind, PgAccountRepository, RateLimitManager};
use domain_connections::{CheckReport, ConnectionChecker};
use domain_leads::{LeadStateManager, PgLeadRepository, RedisLeadCache};
use domain_messages::PgMessageRepository;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::CallerId;
use crate::error::AppError;
use crate::state::AppState;

pub async fn check_connections(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(account_id): Path<Uuid>,
) -> Result<Json<CheckReport>, AppError> {
    let accounts = Arc::new(PgAccountRepository::new(state.db.clone()));

    let account = accounts
        .get_by_id(account_id)
        .await?
        .filter(|account| account.user_id == user_id)
        .ok_or_else(|| AppError::NotFound("LinkedIn account not found".to_string()))?;

    let limits = RateLimitManager::with_arc(accounts);
    let status = limits
        .check_limit(account.id, LimitKind::ConnectionCheck)
        .await?;
    if !status.can_proceed {
        return Err(AppError::Conflict(format!(
            "Daily connection-check limit reached ({} of {})",
            status.used, status.limit
        )));
    }

    let leads = LeadStateManager::new(
        PgLeadRepository::new(state.db.clone()),
        RedisLeadCache::new(state.redis.clone()),
    );
    let messages = Arc::new(PgMessageRepository::new(state.db.clone()));

    let checker = ConnectionChecker::new(
        leads,
        limits,
        messages,
        state.browser.profile_root.clone(),
    );

    let report = checker.check_acceptances(&account, user_id).await?;

    info!(
        account_id = %account_id,
        matched = report.matched,
        messages_sent = report.messages_sent,
        "Connection check finished"
    );
    Ok(Json(report))
}
