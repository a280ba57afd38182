use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::LeadResult;
use crate::models::{InviteStatus, Lead};

/// Repository trait for lead persistence
///
/// The `*_by_url` operations are the cross-campaign fan-out writes: they
/// touch every row sharing the profile URL, in one statement each.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// All leads of a campaign, in insertion order
    async fn leads_for_campaign(&self, campaign_id: Uuid) -> LeadResult<Vec<Lead>>;

    /// Whether the campaign exists and belongs to the user
    async fn campaign_owned_by(&self, campaign_id: Uuid, user_id: Uuid) -> LeadResult<bool>;

    /// Per-campaign invite status write; stamps invite_sent_at
    async fn update_invite_status(
        &self,
        campaign_id: Uuid,
        lead_id: Uuid,
        status: InviteStatus,
        invite_sent: bool,
        sent_at: DateTime<Utc>,
    ) -> LeadResult<()>;

    /// Fan-out invite status write; returns the number of rows updated
    async fn update_invite_status_by_url(
        &self,
        url: &str,
        status: InviteStatus,
        invite_sent: bool,
    ) -> LeadResult<u64>;

    /// Fan-out promotion to accepted with the acceptance timestamp
    async fn mark_accepted_by_url(&self, url: &str, accepted_at: DateTime<Utc>) -> LeadResult<u64>;

    /// Fan-out message-sent write; clears any prior message error
    async fn mark_message_sent_by_url(&self, url: &str, sent_at: DateTime<Utc>) -> LeadResult<u64>;

    /// Fan-out message-error write
    async fn mark_message_error_by_url(&self, url: &str, error: &str) -> LeadResult<u64>;

    /// All of a user's leads with a sent (not yet accepted) invite
    async fn sent_leads_for_user(&self, user_id: Uuid) -> LeadResult<Vec<Lead>>;

    /// Stamp last_connection_check_at on a set of leads
    async fn touch_connection_check(
        &self,
        lead_ids: Vec<Uuid>,
        at: DateTime<Utc>,
    ) -> LeadResult<()>;
}
