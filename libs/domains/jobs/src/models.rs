use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Workflow job lifecycle
///
/// Terminal states are completed, failed, cancelled. A paused job may be
/// restarted by the control plane; a cancelled job must not be.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "job_status")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    #[default]
    #[sea_orm(string_value = "queued")]
    Queued,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "paused")]
    Paused,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Aggregate invite counts for one job run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResults {
    pub total: u32,
    pub sent: u32,
    pub already_connected: u32,
    pub already_pending: u32,
    pub failed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl JobResults {
    /// A completed-without-work marker for jobs with nothing eligible
    pub fn skipped(reason: &str) -> Self {
        Self {
            skipped: Some(true),
            skip_reason: Some(reason.to_string()),
            ..Default::default()
        }
    }

    /// Fold one batch's counts into the job aggregate
    pub fn absorb(&mut self, other: &JobResults) {
        self.total += other.total;
        self.sent += other.sent;
        self.already_connected += other.already_connected;
        self.already_pending += other.already_pending;
        self.failed += other.failed;
    }
}

/// A workflow job row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowJob {
    pub id: Uuid,
    pub user_id: Uuid,
    pub campaign_id: Uuid,
    pub linkedin_account_id: Uuid,
    pub custom_message: Option<String>,
    pub status: JobStatus,
    pub total_leads: i32,
    pub processed_leads: i32,
    /// 0–100
    pub progress: i32,
    pub results: Option<JobResults>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for inserting a queued job
#[derive(Debug, Clone)]
pub struct CreateJob {
    pub user_id: Uuid,
    pub campaign_id: Uuid,
    pub linkedin_account_id: Uuid,
    pub custom_message: Option<String>,
}

/// Whole-percentage progress for `processed` of `total` leads
pub fn progress_percent(processed: i32, total: i32) -> i32 {
    if total <= 0 {
        return 100;
    }
    ((processed as f64 / total as f64) * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Paused.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
    }

    #[test]
    fn test_results_absorb() {
        let mut total = JobResults::default();
        total.absorb(&JobResults {
            total: 10,
            sent: 7,
            already_connected: 1,
            already_pending: 1,
            failed: 1,
            ..Default::default()
        });
        total.absorb(&JobResults {
            total: 5,
            sent: 5,
            ..Default::default()
        });

        assert_eq!(total.total, 15);
        assert_eq!(total.sent, 12);
        assert_eq!(total.failed, 1);
    }

    #[test]
    fn test_results_serde_camel_case() {
        let json = serde_json::to_value(JobResults {
            total: 3,
            sent: 2,
            already_connected: 1,
            already_pending: 0,
            failed: 0,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(json["alreadyConnected"], 1);
        assert_eq!(json["alreadyPending"], 0);
        assert!(json.get("skipped").is_none());
    }

    #[test]
    fn test_skipped_results() {
        let results = JobResults::skipped("all_leads_already_processed");
        assert_eq!(results.skipped, Some(true));
        assert_eq!(
            results.skip_reason.as_deref(),
            Some("all_leads_already_processed")
        );
        assert_eq!(results.sent, 0);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 20), 0);
        assert_eq!(progress_percent(5, 20), 25);
        assert_eq!(progress_percent(20, 20), 100);
        assert_eq!(progress_percent(1, 3), 33);
        // Zero-lead jobs complete at 100
        assert_eq!(progress_percent(0, 0), 100);
    }
}
