//! Job control (pause/cancel) and the live status stream
//!
//! Control writes the target status to the store first, then publishes, so
//! a worker that misses the pub/sub message still observes the row.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use domain_jobs::{
    ControlAction, ControlMessage, JobRepository, JobStatus, PgJobRepository, StatusPublisher,
    WorkflowJob, control_channel, subscribe_status,
};
use database::redis::AsyncCommands;
use futures::Stream;
use serde_json::json;
use std::convert::Infallible;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::CallerId;
use crate::error::AppError;
use crate::state::AppState;

pub async fn pause_job(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(job_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    control_job(&state, user_id, job_id, ControlAction::Pause).await
}

pub async fn cancel_job(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(job_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    control_job(&state, user_id, job_id, ControlAction::Cancel).await
}

async fn control_job(
    state: &AppState,
    user_id: Uuid,
    job_id: Uuid,
    action: ControlAction,
) -> Result<Json<serde_json::Value>, AppError> {
    let jobs = PgJobRepository::new(state.db.clone());
    let job = load_owned_job(&jobs, job_id, user_id).await?;

    if job.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Job is already {}",
            job.status
        )));
    }

    let target = match action {
        ControlAction::Pause => JobStatus::Paused,
        ControlAction::Cancel => JobStatus::Cancelled,
    };

    // Store first; the publish is best-effort on top
    jobs.set_status(job_id, target).await?;

    let message = ControlMessage::new(action, user_id);
    let payload = serde_json::to_string(&message)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let mut conn = state.redis.clone();
    if let Err(e) = conn
        .publish::<_, _, ()>(control_channel(job_id), payload)
        .await
    {
        warn!(job_id = %job_id, error = %e, "Control publish failed, worker will poll the row");
    }

    info!(job_id = %job_id, action = %action, "Control signal issued");
    Ok(Json(json!({ "jobId": job_id, "status": target })))
}

/// SSE stream: the last snapshot first, then every live event
pub async fn stream_status(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    Path(job_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let jobs = PgJobRepository::new(state.db.clone());
    load_owned_job(&jobs, job_id, user_id).await?;

    let publisher = StatusPublisher::new(state.redis.clone());
    let snapshot = publisher.last_snapshot(job_id).await.unwrap_or_else(|e| {
        warn!(job_id = %job_id, error = %e, "Snapshot read failed");
        None
    });

    let redis_url = state.redis_config.url.clone();

    let stream = async_stream::stream! {
        if let Some(snapshot) = snapshot {
            if let Ok(data) = serde_json::to_string(&snapshot) {
                yield Ok(Event::default().event("status").data(data));
            }
        }

        let mut subscription = match subscribe_status(&redis_url, job_id).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Status subscription failed");
                return;
            }
        };

        while let Some(event) = subscription.next_event().await {
            let terminal = event.status.is_terminal();

            if let Ok(data) = serde_json::to_string(&event) {
                yield Ok(Event::default().event("status").data(data));
            }

            if terminal {
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn load_owned_job(
    jobs: &PgJobRepository,
    job_id: Uuid,
    user_id: Uuid,
) -> Result<WorkflowJob, AppError> {
    let job = jobs
        .get_by_id(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?;

    if job.user_id != user_id {
        return Err(AppError::Forbidden("Not your job".to_string()));
    }

    Ok(job)
}
