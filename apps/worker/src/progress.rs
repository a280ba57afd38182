//! Progress propagation and per-lead bookkeeping
//!
//! The observer publishes fractional progress to the status channel,
//! writes whole-lead progress to the job row (throttled to lead
//! boundaries), advances the invite counter on each confirmed send, and
//! raises the control interrupt at its observation points.

use async_trait::async_trait;
use automation::{Interrupt, InviteLead, InviteObserver, InviteOutcome, InviteProgress,
    LeadStatusWriter};
use domain_accounts::{AccountRepository, LimitKind, RateLimitManager};
use domain_jobs::{JobRepository, JobStatus, StatusEvent, StatusPublisher, WorkflowJob,
    models::progress_percent};
use domain_leads::{InviteStatus, LeadCache, LeadRepository, LeadStateManager};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use tracing::warn;

/// Shared counters for one job run
pub struct ProgressState {
    pub processed: AtomicI32,
    /// Completed leads before the current batch, for fractional math
    pub batch_offset: AtomicI32,
}

impl ProgressState {
    pub fn new() -> Self {
        Self {
            processed: AtomicI32::new(0),
            batch_offset: AtomicI32::new(0),
        }
    }
}

pub struct WorkerObserver<JR: JobRepository, AR: AccountRepository> {
    job: WorkflowJob,
    total: i32,
    jobs: Arc<JR>,
    limits: RateLimitManager<AR>,
    publisher: StatusPublisher,
    state: Arc<ProgressState>,
    control: crate::control::ControlReceiver,
    /// When false, the bus subscription failed and the job row is polled
    /// for control at each whole-lead boundary
    bus_subscribed: bool,
}

impl<JR: JobRepository, AR: AccountRepository> WorkerObserver<JR, AR> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job: WorkflowJob,
        total: i32,
        jobs: Arc<JR>,
        limits: RateLimitManager<AR>,
        publisher: StatusPublisher,
        state: Arc<ProgressState>,
        control: crate::control::ControlReceiver,
        bus_subscribed: bool,
    ) -> Self {
        Self {
            job,
            total,
            jobs,
            limits,
            publisher,
            state,
            control,
            bus_subscribed,
        }
    }

    fn event(&self, processed: i32) -> StatusEvent {
        let mut event = StatusEvent::from_job(&self.job);
        event.status = JobStatus::Processing;
        event.total_leads = self.total;
        event.processed_leads = Some(processed);
        event.progress = progress_percent(processed, self.total);
        event
    }

    fn control_interrupt(&self) -> Option<Interrupt> {
        *self.control.borrow()
    }
}

#[async_trait]
impl<JR: JobRepository, AR: AccountRepository> InviteObserver for WorkerObserver<JR, AR> {
    async fn on_progress(&self, progress: InviteProgress) -> Result<(), Interrupt> {
        if let Some(interrupt) = self.control_interrupt() {
            return Err(interrupt);
        }

        let offset = self.state.batch_offset.load(Ordering::SeqCst);
        let processed = self.state.processed.load(Ordering::SeqCst);

        let event = self.event(processed).with_stage(
            progress.lead_name.clone(),
            offset as f64 + progress.current,
            &progress.stage.to_string(),
        );
        self.publisher.publish(&event).await;

        Ok(())
    }

    async fn on_lead_processed(
        &self,
        _lead: &InviteLead,
        outcome: &InviteOutcome,
    ) -> Result<(), Interrupt> {
        let processed = self.state.processed.fetch_add(1, Ordering::SeqCst) + 1;

        // The counter advances here so the quota moves even when the
        // batch is interrupted before its results are aggregated
        if outcome.is_sent() {
            if let Err(e) = self
                .limits
                .increment(self.job.linkedin_account_id, LimitKind::Invite, 1)
                .await
            {
                warn!(error = %e, "Failed to advance invite counter");
            }
        }

        // Row writes are throttled to whole leads to limit write volume
        let percent = progress_percent(processed, self.total);
        if let Err(e) = self.jobs.update_progress(self.job.id, processed, percent).await {
            warn!(error = %e, "Failed to write job progress");
        }

        self.publisher.publish(&self.event(processed)).await;

        if !self.bus_subscribed {
            match self.jobs.status(self.job.id).await {
                Ok(Some(JobStatus::Paused)) => return Err(Interrupt::Paused),
                Ok(Some(JobStatus::Cancelled)) => return Err(Interrupt::Cancelled),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Control fallback poll failed"),
            }
        }

        if let Some(interrupt) = self.control_interrupt() {
            return Err(interrupt);
        }

        Ok(())
    }
}

/// Adapter from invite outcomes to the per-campaign lead state write
pub struct LeadWriter<LR: LeadRepository, LC: LeadCache> {
    leads: LeadStateManager<LR, LC>,
}

impl<LR: LeadRepository, LC: LeadCache> LeadWriter<LR, LC> {
    pub fn new(leads: LeadStateManager<LR, LC>) -> Self {
        Self { leads }
    }
}

/// Invite outcome to stored invite state. Already-pending profiles count
/// as sent; URL-scoped promotion to accepted stays the connection
/// checker's job.
pub fn outcome_state(outcome: &InviteOutcome) -> (InviteStatus, bool) {
    match outcome {
        InviteOutcome::Sent | InviteOutcome::AlreadyPending => (InviteStatus::Sent, true),
        InviteOutcome::AlreadyConnected => (InviteStatus::Accepted, true),
        InviteOutcome::Failed(_) => (InviteStatus::Failed, false),
    }
}

#[async_trait]
impl<LR: LeadRepository, LC: LeadCache> LeadStatusWriter for LeadWriter<LR, LC> {
    async fn write_outcome(
        &self,
        lead: &InviteLead,
        outcome: &InviteOutcome,
    ) -> Result<(), String> {
        let (status, sent) = outcome_state(outcome);

        self.leads
            .update_lead_status(lead.campaign_id, lead.id, status, sent)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_state_mapping() {
        assert_eq!(
            outcome_state(&InviteOutcome::Sent),
            (InviteStatus::Sent, true)
        );
        assert_eq!(
            outcome_state(&InviteOutcome::AlreadyPending),
            (InviteStatus::Sent, true)
        );
        assert_eq!(
            outcome_state(&InviteOutcome::AlreadyConnected),
            (InviteStatus::Accepted, true)
        );
        assert_eq!(
            outcome_state(&InviteOutcome::Failed("x".to_string())),
            (InviteStatus::Failed, false)
        );
    }

    #[test]
    fn test_progress_state_starts_at_zero() {
        let state = ProgressState::new();
        assert_eq!(state.processed.load(Ordering::SeqCst), 0);
        assert_eq!(state.batch_offset.load(Ordering::SeqCst), 0);
    }
}
