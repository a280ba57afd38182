//! Workflow worker
//!
//! One process per workflow job. Loads the job, checks the invite quota,
//! fetches eligible leads, and drives them through the browser in
//! batches of ten with a five-minute gap between batches. Pause/cancel
//! signals arrive over the job's control channel (with a database poll
//! fallback) and produce a clean exit; the control plane owns the job
//! row on that path.
//!
//! Exit codes: 0 for completion, skip, or a clean control exit; 1 for
//! fatal errors (job/account missing, quota zero at start, store
//! unavailable).

pub mod control;
pub mod progress;

use automation::{InviteLead, InviteRunner, SessionValidator, SessionVerdict};
use chrono::Utc;
use core_config::{
    Environment, FromEnv, browser::BrowserConfig, database::DatabaseConfig, redis::RedisConfig,
};
use domain_accounts::{AccountRepository, LimitKind, PgAccountRepository, RateLimitManager};
use domain_connections::to_session_data;
use domain_jobs::{
    BatchLock, JobRepository, JobResults, JobStatus, PgJobRepository, StatusEvent,
    StatusPublisher, WorkflowJob, models::progress_percent, subscribe_control,
};
use domain_leads::{CachedLead, LeadStateManager, PgLeadRepository, RedisLeadCache};
use eyre::WrapErr;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::progress::{LeadWriter, ProgressState, WorkerObserver};

pub const BATCH_SIZE: usize = 10;
pub const INTER_BATCH_DELAY: Duration = Duration::from_secs(300);

/// Entry point behind main: argument parsing plus tracing setup
pub async fn main_with_args(args: Vec<String>) -> i32 {
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let Some(raw_id) = args.first() else {
        error!("Usage: linkout-worker <job-id>");
        return 1;
    };

    let Ok(job_id) = Uuid::parse_str(raw_id) else {
        error!(argument = %raw_id, "Job id is not a UUID");
        return 1;
    };

    match run(job_id).await {
        Ok(code) => code,
        Err(e) => {
            error!(job_id = %job_id, error = ?e, "Worker failed");
            1
        }
    }
}

/// Truncate the eligible set to the remaining daily quota
pub fn truncate_to_quota(mut eligible: Vec<CachedLead>, remaining: i32) -> Vec<CachedLead> {
    let cap = remaining.max(0) as usize;
    eligible.truncate(cap.min(eligible.len()));
    eligible
}

fn to_invite_leads(campaign_id: Uuid, leads: &[CachedLead]) -> Vec<InviteLead> {
    leads
        .iter()
        .map(|lead| InviteLead {
            id: lead.id,
            campaign_id,
            url: lead.url.clone(),
            name: lead.name.clone(),
        })
        .collect()
}

/// Run one job to a terminal state
pub async fn run(job_id: Uuid) -> eyre::Result<i32> {
    let db_config = DatabaseConfig::from_env().wrap_err("Failed to load database configuration")?;
    let redis_config = RedisConfig::from_env().wrap_err("Failed to load Redis configuration")?;
    let browser_config =
        BrowserConfig::from_env().wrap_err("Failed to load browser configuration")?;

    let db = database::postgres::connect_with_retry(&db_config.url, None)
        .await
        .wrap_err("Failed to connect to PostgreSQL")?;
    let redis = database::redis::connect_with_retry(&redis_config.url, None)
        .await
        .wrap_err("Failed to connect to Redis")?;

    let jobs = Arc::new(PgJobRepository::new(db.clone()));
    let accounts = Arc::new(PgAccountRepository::new(db.clone()));
    let limits = RateLimitManager::with_arc(accounts.clone());
    let leads = LeadStateManager::new(
        PgLeadRepository::new(db.clone()),
        RedisLeadCache::new(redis.clone()),
    );
    let publisher = StatusPublisher::new(redis.clone());
    let lock = BatchLock::new(redis.clone());

    // Stage 1: load the job and move it to processing
    let Some(mut job) = jobs.get_by_id(job_id).await? else {
        error!(job_id = %job_id, "Workflow job not found");
        return Ok(1);
    };

    let started_at = Utc::now();
    jobs.transition_processing(job_id, started_at).await?;
    job.status = JobStatus::Processing;
    job.started_at = Some(started_at);

    // Stage 2: control subscription; bus failure falls back to polling
    let (control_tx, control_rx) = tokio::sync::watch::channel(None);
    let bus_subscribed = match subscribe_control(&redis_config.url, job_id).await {
        Ok(stream) => {
            control::spawn_control_listener(stream, control_tx);
            true
        }
        Err(e) => {
            warn!(error = %e, "Control subscription failed, falling back to status polling");
            false
        }
    };

    publisher.publish(&StatusEvent::from_job(&job)).await;

    // Stage 3: the LinkedIn account
    let Some(account) = accounts.get_by_id(job.linkedin_account_id).await? else {
        fail_job(&*jobs, &publisher, &job, "LinkedIn account not found").await;
        return Ok(1);
    };

    // Stage 4: pre-flight quota
    let quota = limits.check_limit(account.id, LimitKind::Invite).await?;
    if !quota.can_proceed {
        let message = format!(
            "daily invite limit reached, resets in {} hours",
            quota.hours_until_reset(Utc::now())
        );
        fail_job(&*jobs, &publisher, &job, &message).await;
        return Ok(1);
    }

    // Stage 5: eligibility
    let eligible = leads.fetch_eligible_leads(job.campaign_id).await?;
    if eligible.eligible_leads.is_empty() {
        info!(job_id = %job_id, "No eligible leads, completing as skipped");
        let results = JobResults::skipped("all_leads_already_processed");
        finish_job(&*jobs, &publisher, &job, JobStatus::Completed, results, None).await?;
        return Ok(0);
    }

    // Stage 6: truncate to the remaining quota
    let selected = truncate_to_quota(eligible.eligible_leads, quota.remaining);
    let total = selected.len() as i32;
    jobs.set_total_leads(job_id, total).await?;
    job.total_leads = total;

    info!(
        job_id = %job_id,
        eligible = eligible.all_leads.len(),
        selected = total,
        quota_remaining = quota.remaining,
        "Scheduling invite batches"
    );

    // Stage 7/8: batches of ten
    let validator = SessionValidator::default();
    let runner = InviteRunner::default();
    let writer = LeadWriter::new(leads.clone());
    let state = Arc::new(ProgressState::new());
    let observer = WorkerObserver::new(
        job.clone(),
        total,
        jobs.clone(),
        limits.clone(),
        publisher.clone(),
        state.clone(),
        control_rx.clone(),
        bus_subscribed,
    );

    let mut aggregate = JobResults {
        total: total as u32,
        ..Default::default()
    };
    let mut control_rx = control_rx;

    let batches: Vec<&[CachedLead]> = selected.chunks(BATCH_SIZE).collect();
    let batch_count = batches.len();

    for (batch_index, batch) in batches.into_iter().enumerate() {
        if let Some(interrupt) = control::latched(&control_rx) {
            info!(job_id = %job_id, interrupt = %interrupt, "Exiting before batch on control signal");
            return Ok(0);
        }

        state
            .batch_offset
            .store(state.processed.load(Ordering::SeqCst), Ordering::SeqCst);

        let locked = match lock.acquire(account.id, job_id).await {
            Ok(locked) => {
                if !locked {
                    warn!(account_id = %account.id, "Batch lock held elsewhere, proceeding anyway");
                }
                locked
            }
            Err(e) => {
                warn!(error = %e, "Batch lock unavailable");
                false
            }
        };

        // Stage 8a: one browser context per batch
        let bundle = account.session_bundle()?;
        let data = to_session_data(&bundle);
        let profile_dir = browser_config.profile_dir(&account.id.to_string());

        let session = match validator.validate(&profile_dir, &data, true).await {
            SessionVerdict::Valid {
                session: Some(session),
                ..
            } => session,
            SessionVerdict::Valid { session: None, .. } | SessionVerdict::Invalid { .. } => {
                warn!(
                    job_id = %job_id,
                    batch = batch_index + 1,
                    "Session invalid, counting batch as failed"
                );
                aggregate.failed += batch.len() as u32;
                let processed = state
                    .processed
                    .fetch_add(batch.len() as i32, Ordering::SeqCst)
                    + batch.len() as i32;
                jobs.update_progress(job_id, processed, progress_percent(processed, total))
                    .await?;
                if locked {
                    let _ = lock.release(account.id, job_id).await;
                }
                continue;
            }
        };

        // Stage 8b: the invite flow; 8c: guaranteed browser release
        let invite_leads = to_invite_leads(job.campaign_id, batch);
        let batch_result = runner
            .process_invites(
                session.page(),
                &invite_leads,
                job.custom_message.as_deref(),
                &writer,
                &observer,
            )
            .await;
        session.close().await;

        if locked {
            let _ = lock.release(account.id, job_id).await;
        }

        match batch_result {
            Ok(results) => {
                aggregate.sent += results.sent;
                aggregate.already_connected += results.already_connected;
                aggregate.already_pending += results.already_pending;
                aggregate.failed += results.failed;
            }
            // Stage 8d: control interrupt; the control plane already
            // wrote the terminal row
            Err(e) if e.interrupt().is_some() => {
                info!(job_id = %job_id, interrupt = %e, "Exiting on control signal");
                return Ok(0);
            }
            Err(e) => {
                warn!(job_id = %job_id, batch = batch_index + 1, error = %e, "Batch failed");
                aggregate.failed += batch.len() as u32;
            }
        }

        // Stage 8e: post-batch quota check
        let quota = limits.check_limit(account.id, LimitKind::Invite).await?;
        if !quota.can_proceed {
            info!(job_id = %job_id, "Invite quota exhausted, stopping further batches");
            break;
        }

        // Stage 8f: inter-batch delay, cut short by a control signal
        if batch_index + 1 < batch_count {
            tokio::select! {
                _ = tokio::time::sleep(INTER_BATCH_DELAY) => {}
                interrupt = control::wait_for_interrupt(&mut control_rx) => {
                    info!(job_id = %job_id, interrupt = %interrupt, "Exiting during inter-batch delay");
                    return Ok(0);
                }
            }
        }
    }

    // Stage 9: terminal completion
    job.processed_leads = state.processed.load(Ordering::SeqCst);
    job.progress = 100;
    finish_job(
        &*jobs,
        &publisher,
        &job,
        JobStatus::Completed,
        aggregate,
        None,
    )
    .await?;

    info!(job_id = %job_id, "Workflow job completed");
    Ok(0)
}

/// Terminal failure: best-effort row write plus final status event
async fn fail_job<JR: JobRepository>(
    jobs: &JR,
    publisher: &StatusPublisher,
    job: &WorkflowJob,
    message: &str,
) {
    error!(job_id = %job.id, message = %message, "Failing workflow job");

    if let Err(e) = jobs
        .finish(
            job.id,
            JobStatus::Failed,
            None,
            Some(message.to_string()),
            Utc::now(),
        )
        .await
    {
        error!(job_id = %job.id, error = %e, "Failed to write terminal failed status");
    }

    let mut event = StatusEvent::from_job(job);
    event.status = JobStatus::Failed;
    event.error_message = Some(message.to_string());
    event.completed_at = Some(Utc::now());
    publisher.publish(&event).await;
}

async fn finish_job<JR: JobRepository>(
    jobs: &JR,
    publisher: &StatusPublisher,
    job: &WorkflowJob,
    status: JobStatus,
    results: JobResults,
    error_message: Option<String>,
) -> eyre::Result<()> {
    let completed_at = Utc::now();

    jobs.finish(
        job.id,
        status,
        Some(results.clone()),
        error_message.clone(),
        completed_at,
    )
    .await?;

    let mut event = StatusEvent::from_job(job);
    event.status = status;
    event.progress = 100;
    event.results = Some(results);
    event.error_message = error_message;
    event.completed_at = Some(completed_at);
    publisher.publish(&event).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_leads::InviteStatus;

    fn cached(url: &str) -> CachedLead {
        CachedLead {
            id: Uuid::now_v7(),
            url: url.to_string(),
            name: None,
            invite_sent: false,
            invite_status: InviteStatus::Pending,
            invite_sent_at: None,
            invite_accepted_at: None,
            message_sent: false,
            message_sent_at: None,
            message_error: None,
        }
    }

    #[test]
    fn test_truncate_to_quota_caps_at_remaining() {
        let eligible: Vec<CachedLead> = (0..5)
            .map(|i| cached(&format!("https://www.linkedin.com/in/lead-{}/", i)))
            .collect();

        assert_eq!(truncate_to_quota(eligible.clone(), 2).len(), 2);
        assert_eq!(truncate_to_quota(eligible.clone(), 5).len(), 5);
        assert_eq!(truncate_to_quota(eligible.clone(), 30).len(), 5);
        assert_eq!(truncate_to_quota(eligible, 0).len(), 0);
    }

    #[test]
    fn test_truncate_preserves_order() {
        let eligible: Vec<CachedLead> = (0..4)
            .map(|i| cached(&format!("https://www.linkedin.com/in/lead-{}/", i)))
            .collect();
        let first_url = eligible[0].url.clone();

        let selected = truncate_to_quota(eligible, 2);
        assert_eq!(selected[0].url, first_url);
    }

    #[test]
    fn test_to_invite_leads_carries_campaign() {
        let campaign_id = Uuid::new_v4();
        let leads = vec![cached("https://www.linkedin.com/in/a/")];

        let invite_leads = to_invite_leads(campaign_id, &leads);
        assert_eq!(invite_leads.len(), 1);
        assert_eq!(invite_leads[0].campaign_id, campaign_id);
        assert_eq!(invite_leads[0].url, "https://www.linkedin.com/in/a/");
    }

    #[test]
    fn test_batching_shape() {
        let leads: Vec<CachedLead> = (0..23)
            .map(|i| cached(&format!("https://www.linkedin.com/in/lead-{}/", i)))
            .collect();

        let batches: Vec<&[CachedLead]> = leads.chunks(BATCH_SIZE).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 10);
        assert_eq!(batches[2].len(), 3);
    }
}
