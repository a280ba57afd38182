//! Workflow start: insert a queued job and spawn its worker process

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tracing::{error, info};
use uuid::Uuid;

use domain_accounts::{AccountRepository, PgAccountRepository};
use domain_jobs::{CreateJob, JobRepository, PgJobRepository};
use domain_leads::{LeadRepository, PgLeadRepository};

use crate::auth::CallerId;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWorkflowRequest {
    pub campaign_id: Uuid,
    /// Defaults to the caller's active account
    pub linkedin_account_id: Option<Uuid>,
    pub custom_message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartWorkflowResponse {
    pub job_id: Uuid,
}

pub async fn start_workflow(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Json(request): Json<StartWorkflowRequest>,
) -> Result<(StatusCode, Json<StartWorkflowResponse>), AppError> {
    let leads = PgLeadRepository::new(state.db.clone());
    if !leads
        .campaign_owned_by(request.campaign_id, user_id)
        .await?
    {
        return Err(AppError::NotFound("Campaign not found".to_string()));
    }

    let accounts = PgAccountRepository::new(state.db.clone());
    let account = match request.linkedin_account_id {
        Some(account_id) => accounts
            .get_by_id(account_id)
            .await?
            .filter(|account| account.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("LinkedIn account not found".to_string()))?,
        None => accounts
            .active_for_user(user_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("No active LinkedIn account".to_string()))?,
    };

    let jobs = PgJobRepository::new(state.db.clone());
    let job = jobs
        .create(CreateJob {
            user_id,
            campaign_id: request.campaign_id,
            linkedin_account_id: account.id,
            custom_message: request.custom_message,
        })
        .await?;

    spawn_worker(&state.worker.binary, job.id)?;

    info!(job_id = %job.id, campaign_id = %request.campaign_id, "Workflow started");
    Ok((
        StatusCode::ACCEPTED,
        Json(StartWorkflowResponse { job_id: job.id }),
    ))
}

/// Spawn the detached per-job worker process
fn spawn_worker(binary: &str, job_id: Uuid) -> Result<(), AppError> {
    let mut child = tokio::process::Command::new(binary)
        .arg(job_id.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(false)
        .spawn()
        .map_err(|e| {
            error!(binary = %binary, error = %e, "Failed to spawn worker");
            AppError::InternalServerError(format!("Failed to spawn worker: {}", e))
        })?;

    // Reap the child so finished workers do not linger as zombies
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => info!(job_id = %job_id, code = ?status.code(), "Worker exited"),
            Err(e) => error!(job_id = %job_id, error = %e, "Worker wait failed"),
        }
    });

    Ok(())
}
