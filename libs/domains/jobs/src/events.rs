use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;
use uuid::Uuid;

use crate::models::{JobResults, JobStatus, WorkflowJob};

/// Control verbs a worker honors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ControlAction {
    Pause,
    Cancel,
}

/// Payload on `job:{id}:control`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlMessage {
    pub action: ControlAction,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ControlMessage {
    pub fn new(action: ControlAction, user_id: Uuid) -> Self {
        Self {
            action,
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Parse a channel payload; any unknown action value is ignored
    pub fn parse(payload: &str) -> Option<Self> {
        match serde_json::from_str(payload) {
            Ok(message) => Some(message),
            Err(e) => {
                debug!(error = %e, "Ignoring unrecognized control payload");
                None
            }
        }
    }

    /// Delivery latency relative to the publisher's stamp
    pub fn latency(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.timestamp
    }
}

/// Payload on `job:{id}:status` and in the `job:{id}:status:last` snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub job_id: Uuid,
    pub campaign_id: Uuid,
    pub status: JobStatus,
    pub progress: i32,
    pub total_leads: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_leads: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_lead: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fractional_progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<JobResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StatusEvent {
    /// Snapshot the job row into an event
    pub fn from_job(job: &WorkflowJob) -> Self {
        Self {
            kind: "status".to_string(),
            job_id: job.id,
            campaign_id: job.campaign_id,
            status: job.status,
            progress: job.progress,
            total_leads: job.total_leads,
            processed_leads: Some(job.processed_leads),
            current_lead: None,
            fractional_progress: None,
            stage: None,
            results: job.results.clone(),
            started_at: job.started_at,
            completed_at: job.completed_at,
            error_message: job.error_message.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Mid-lead progress with a fractional position and stage label
    pub fn with_stage(mut self, current_lead: Option<String>, fraction: f64, stage: &str) -> Self {
        self.current_lead = current_lead;
        self.fractional_progress = Some(fraction);
        self.stage = Some(stage.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> WorkflowJob {
        WorkflowJob {
            id: Uuid::now_v7(),
            user_id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            linkedin_account_id: Uuid::new_v4(),
            custom_message: None,
            status: JobStatus::Processing,
            total_leads: 20,
            processed_leads: 5,
            progress: 25,
            results: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    #[test]
    fn test_control_message_round_trip() {
        let message = ControlMessage::new(ControlAction::Pause, Uuid::new_v4());
        let payload = serde_json::to_string(&message).unwrap();

        let parsed = ControlMessage::parse(&payload).unwrap();
        assert_eq!(parsed.action, ControlAction::Pause);
        assert_eq!(parsed.user_id, message.user_id);
    }

    #[test]
    fn test_control_message_wire_shape() {
        let json = serde_json::to_value(ControlMessage::new(ControlAction::Cancel, Uuid::nil()))
            .unwrap();
        assert_eq!(json["action"], "cancel");
        assert!(json["userId"].is_string());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_control_message_ignores_unknown_action() {
        let payload = r#"{"action":"resume","userId":"u1","timestamp":"2026-06-01T00:00:00Z"}"#;
        assert!(ControlMessage::parse(payload).is_none());

        let garbage = "not json at all";
        assert!(ControlMessage::parse(garbage).is_none());
    }

    #[test]
    fn test_status_event_from_job() {
        let job = job();
        let event = StatusEvent::from_job(&job);

        assert_eq!(event.kind, "status");
        assert_eq!(event.job_id, job.id);
        assert_eq!(event.processed_leads, Some(5));
        assert_eq!(event.progress, 25);
    }

    #[test]
    fn test_status_event_wire_shape() {
        let event = StatusEvent::from_job(&job()).with_stage(
            Some("Jane Doe".to_string()),
            5.4,
            "navigating",
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "status");
        assert_eq!(json["status"], "processing");
        assert_eq!(json["totalLeads"], 20);
        assert_eq!(json["processedLeads"], 5);
        assert_eq!(json["currentLead"], "Jane Doe");
        assert_eq!(json["fractionalProgress"], 5.4);
        assert_eq!(json["stage"], "navigating");
        // Unset optionals stay off the wire
        assert!(json.get("errorMessage").is_none());
        assert!(json.get("completedAt").is_none());
    }

    #[test]
    fn test_latency_measures_publisher_stamp() {
        let mut message = ControlMessage::new(ControlAction::Pause, Uuid::new_v4());
        message.timestamp = Utc::now() - chrono::Duration::milliseconds(250);

        let latency = message.latency(Utc::now());
        assert!(latency.num_milliseconds() >= 250);
    }
}
