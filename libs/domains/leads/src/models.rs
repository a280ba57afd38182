use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use uuid::Uuid;

/// Campaign lifecycle
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "campaign_status")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "active")]
    Active,
}

/// Profile scraping status, owned by the external scraper/UI.
/// The invite path never consults it.
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "lead_status")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScrapeStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "error")]
    Error,
}

/// Invitation state of a lead
///
/// Legal transitions: pending → sent → accepted, pending → failed → sent
/// (retry). Never accepted → sent or accepted → pending.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invite_status")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InviteStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// A campaign lead: one LinkedIn profile URL plus its invite and message
/// state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub user_id: Uuid,
    pub campaign_id: Uuid,
    pub url: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
    pub status: ScrapeStatus,
    pub invite_sent: bool,
    pub invite_status: InviteStatus,
    pub invite_sent_at: Option<DateTime<Utc>>,
    pub invite_accepted_at: Option<DateTime<Utc>>,
    pub invite_retry_count: i32,
    pub last_connection_check_at: Option<DateTime<Utc>>,
    pub message_sent: bool,
    pub message_sent_at: Option<DateTime<Utc>>,
    pub message_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The cache shape stored per entry in `campaign:{id}:leads`
///
/// Display attributes beyond the name are not cached; the store row is
/// authoritative for those.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CachedLead {
    pub id: Uuid,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub invite_sent: bool,
    #[serde(default)]
    pub invite_status: InviteStatus,
    #[serde(default)]
    pub invite_sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invite_accepted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_sent: bool,
    #[serde(default)]
    pub message_sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message_error: Option<String>,
}

impl CachedLead {
    /// Invite eligibility: a URL is required, a name is not
    pub fn is_eligible(&self) -> bool {
        !self.url.trim().is_empty()
            && !self.invite_sent
            && matches!(
                self.invite_status,
                InviteStatus::Pending | InviteStatus::Failed
            )
    }
}

impl From<&Lead> for CachedLead {
    fn from(lead: &Lead) -> Self {
        Self {
            id: lead.id,
            url: lead.url.clone(),
            name: lead.name.clone(),
            invite_sent: lead.invite_sent,
            invite_status: lead.invite_status,
            invite_sent_at: lead.invite_sent_at,
            invite_accepted_at: lead.invite_accepted_at,
            message_sent: lead.message_sent,
            message_sent_at: lead.message_sent_at,
            message_error: lead.message_error.clone(),
        }
    }
}

/// Which tier answered a lead query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    Redis,
    Postgresql,
}

/// Result of the eligibility query
#[derive(Debug, Clone)]
pub struct EligibleLeads {
    pub all_leads: Vec<CachedLead>,
    pub eligible_leads: Vec<CachedLead>,
    pub source: LeadSource,
}

/// Aggregate invite statistics over a set of leads
#[derive(Debug, Clone, Serialize)]
pub struct LeadAnalytics {
    pub total: usize,
    pub invite_stats: HashMap<String, usize>,
    pub leads_with_invites: usize,
}

/// Pure aggregation, no I/O
pub fn lead_analytics(leads: &[CachedLead]) -> LeadAnalytics {
    let mut invite_stats: HashMap<String, usize> = HashMap::new();
    for lead in leads {
        *invite_stats.entry(lead.invite_status.to_string()).or_insert(0) += 1;
    }

    LeadAnalytics {
        total: leads.len(),
        leads_with_invites: leads.iter().filter(|l| l.invite_sent).count(),
        invite_stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(url: &str, sent: bool, status: InviteStatus) -> CachedLead {
        CachedLead {
            id: Uuid::now_v7(),
            url: url.to_string(),
            name: None,
            invite_sent: sent,
            invite_status: status,
            invite_sent_at: None,
            invite_accepted_at: None,
            message_sent: false,
            message_sent_at: None,
            message_error: None,
        }
    }

    #[test]
    fn test_eligibility_requires_url() {
        assert!(!cached("", false, InviteStatus::Pending).is_eligible());
        assert!(!cached("   ", false, InviteStatus::Pending).is_eligible());
        assert!(cached("https://www.linkedin.com/in/a/", false, InviteStatus::Pending).is_eligible());
    }

    #[test]
    fn test_eligibility_allows_failed_retry() {
        assert!(cached("https://www.linkedin.com/in/a/", false, InviteStatus::Failed).is_eligible());
    }

    #[test]
    fn test_eligibility_excludes_sent_and_accepted() {
        assert!(!cached("https://www.linkedin.com/in/a/", true, InviteStatus::Sent).is_eligible());
        assert!(!cached("https://www.linkedin.com/in/a/", false, InviteStatus::Sent).is_eligible());
        assert!(
            !cached("https://www.linkedin.com/in/a/", true, InviteStatus::Accepted).is_eligible()
        );
    }

    #[test]
    fn test_eligibility_does_not_require_name() {
        let lead = cached("https://www.linkedin.com/in/a/", false, InviteStatus::Pending);
        assert!(lead.name.is_none());
        assert!(lead.is_eligible());
    }

    #[test]
    fn test_cached_lead_defaults_absent_status_to_pending() {
        // Entries written by older paths may omit inviteStatus entirely
        let parsed: CachedLead = serde_json::from_str(
            r#"{"id":"0191d5a2-2d3b-7e30-a7c2-111111111111","url":"https://www.linkedin.com/in/a/"}"#,
        )
        .unwrap();
        assert_eq!(parsed.invite_status, InviteStatus::Pending);
        assert!(parsed.is_eligible());
    }

    #[test]
    fn test_lead_analytics_counts_by_status() {
        let leads = vec![
            cached("https://www.linkedin.com/in/a/", true, InviteStatus::Sent),
            cached("https://www.linkedin.com/in/b/", true, InviteStatus::Sent),
            cached("https://www.linkedin.com/in/c/", true, InviteStatus::Accepted),
            cached("https://www.linkedin.com/in/d/", false, InviteStatus::Pending),
        ];

        let analytics = lead_analytics(&leads);
        assert_eq!(analytics.total, 4);
        assert_eq!(analytics.leads_with_invites, 3);
        assert_eq!(analytics.invite_stats.get("sent"), Some(&2));
        assert_eq!(analytics.invite_stats.get("accepted"), Some(&1));
        assert_eq!(analytics.invite_stats.get("pending"), Some(&1));
    }

    #[test]
    fn test_invite_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&InviteStatus::Accepted).unwrap(),
            "\"accepted\""
        );
        assert_eq!(InviteStatus::Failed.to_string(), "failed");
    }
}
