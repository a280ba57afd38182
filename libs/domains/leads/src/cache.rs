use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::LeadResult;
use crate::models::{CachedLead, InviteStatus};
use crate::url::same_profile;

/// Key of the per-campaign lead hash
pub fn campaign_leads_key(campaign_id: Uuid) -> String {
    format!("campaign:{}:leads", campaign_id)
}

const CAMPAIGN_LEADS_PATTERN: &str = "campaign:*:leads";

/// A partial update applied to cached lead entries
///
/// `message_error` is tri-state: absent leaves the field alone, `Some(None)`
/// clears it, `Some(Some(_))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedLeadUpdate {
    pub invite_sent: Option<bool>,
    pub invite_status: Option<InviteStatus>,
    pub invite_sent_at: Option<DateTime<Utc>>,
    pub invite_accepted_at: Option<DateTime<Utc>>,
    pub message_sent: Option<bool>,
    pub message_sent_at: Option<DateTime<Utc>>,
    pub message_error: Option<Option<String>>,
}

impl CachedLeadUpdate {
    /// Invite state write for the per-campaign path
    pub fn invite(status: InviteStatus, invite_sent: bool, sent_at: DateTime<Utc>) -> Self {
        Self {
            invite_sent: Some(invite_sent),
            invite_status: Some(status),
            invite_sent_at: Some(sent_at),
            ..Default::default()
        }
    }

    /// Invite state write for the global fan-out (no sent_at stamp)
    pub fn invite_global(status: InviteStatus, invite_sent: bool) -> Self {
        Self {
            invite_sent: Some(invite_sent),
            invite_status: Some(status),
            ..Default::default()
        }
    }

    /// Promotion to accepted
    pub fn accepted(accepted_at: DateTime<Utc>) -> Self {
        Self {
            invite_sent: Some(true),
            invite_status: Some(InviteStatus::Accepted),
            invite_accepted_at: Some(accepted_at),
            ..Default::default()
        }
    }

    /// Successful message delivery
    pub fn message_sent(sent_at: DateTime<Utc>) -> Self {
        Self {
            message_sent: Some(true),
            message_sent_at: Some(sent_at),
            message_error: Some(None),
            ..Default::default()
        }
    }

    /// Failed message delivery
    pub fn message_error(error: String) -> Self {
        Self {
            message_sent: Some(false),
            message_error: Some(Some(error)),
            ..Default::default()
        }
    }

    pub fn apply(&self, lead: &mut CachedLead) {
        if let Some(sent) = self.invite_sent {
            lead.invite_sent = sent;
        }
        if let Some(status) = self.invite_status {
            lead.invite_status = status;
        }
        if let Some(at) = self.invite_sent_at {
            lead.invite_sent_at = Some(at);
        }
        if let Some(at) = self.invite_accepted_at {
            lead.invite_accepted_at = Some(at);
        }
        if let Some(sent) = self.message_sent {
            lead.message_sent = sent;
        }
        if let Some(at) = self.message_sent_at {
            lead.message_sent_at = Some(at);
        }
        if let Some(ref error) = self.message_error {
            lead.message_error = error.clone();
        }
    }
}

/// Cache tier of the dual-tier lead store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadCache: Send + Sync {
    /// All cached entries of a campaign (empty when the key is absent)
    async fn campaign_leads(&self, campaign_id: Uuid) -> LeadResult<Vec<CachedLead>>;

    /// Write a full campaign snapshot, keyed per lead id
    async fn populate_campaign(&self, campaign_id: Uuid, leads: Vec<CachedLead>) -> LeadResult<()>;

    /// Update one cached entry; false when the entry is not cached
    async fn update_entry(
        &self,
        campaign_id: Uuid,
        lead_id: Uuid,
        update: CachedLeadUpdate,
    ) -> LeadResult<bool>;

    /// Update every cached entry matching the profile URL across all
    /// campaign hashes; returns the number of entries rewritten
    async fn update_by_url(&self, url: &str, update: CachedLeadUpdate) -> LeadResult<u64>;
}

/// Redis-backed implementation over the shared ConnectionManager
#[derive(Clone)]
pub struct RedisLeadCache {
    redis: ConnectionManager,
}

impl RedisLeadCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    /// Cursor SCAN over every campaign hash key
    ///
    /// Cost is O(total cached leads); acceptable at current fan-out sizes.
    async fn scan_campaign_keys(&self) -> LeadResult<Vec<String>> {
        let mut conn = self.redis.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(CAMPAIGN_LEADS_PATTERN)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            keys.extend(batch);

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }

    fn parse_entry(field: &str, raw: &str) -> Option<CachedLead> {
        match serde_json::from_str::<CachedLead>(raw) {
            Ok(lead) => Some(lead),
            Err(e) => {
                warn!(field = %field, error = %e, "Skipping malformed cached lead entry");
                None
            }
        }
    }
}

#[async_trait]
impl LeadCache for RedisLeadCache {
    async fn campaign_leads(&self, campaign_id: Uuid) -> LeadResult<Vec<CachedLead>> {
        let mut conn = self.redis.clone();
        let key = campaign_leads_key(campaign_id);

        let entries: std::collections::HashMap<String, String> = conn.hgetall(&key).await?;

        let mut leads: Vec<CachedLead> = entries
            .iter()
            .filter_map(|(field, raw)| Self::parse_entry(field, raw))
            .collect();

        // Hash iteration order is arbitrary; v7 lead ids are time-ordered,
        // so this restores insertion order
        leads.sort_by_key(|l| l.id);

        Ok(leads)
    }

    async fn populate_campaign(&self, campaign_id: Uuid, leads: Vec<CachedLead>) -> LeadResult<()> {
        if leads.is_empty() {
            return Ok(());
        }

        let mut conn = self.redis.clone();
        let key = campaign_leads_key(campaign_id);

        let mut items = Vec::with_capacity(leads.len());
        for lead in &leads {
            items.push((lead.id.to_string(), serde_json::to_string(lead)?));
        }

        conn.hset_multiple::<_, _, _, ()>(&key, &items).await?;

        debug!(campaign_id = %campaign_id, count = items.len(), "Populated campaign lead cache");
        Ok(())
    }

    async fn update_entry(
        &self,
        campaign_id: Uuid,
        lead_id: Uuid,
        update: CachedLeadUpdate,
    ) -> LeadResult<bool> {
        let mut conn = self.redis.clone();
        let key = campaign_leads_key(campaign_id);
        let field = lead_id.to_string();

        let raw: Option<String> = conn.hget(&key, &field).await?;
        let Some(raw) = raw else {
            return Ok(false);
        };

        let Some(mut lead) = Self::parse_entry(&field, &raw) else {
            return Ok(false);
        };

        update.apply(&mut lead);
        conn.hset::<_, _, _, ()>(&key, &field, serde_json::to_string(&lead)?)
            .await?;

        Ok(true)
    }

    async fn update_by_url(&self, url: &str, update: CachedLeadUpdate) -> LeadResult<u64> {
        let mut conn = self.redis.clone();
        let mut updated = 0u64;

        for key in self.scan_campaign_keys().await? {
            let entries: std::collections::HashMap<String, String> = conn.hgetall(&key).await?;

            for (field, raw) in entries {
                let Some(mut lead) = Self::parse_entry(&field, &raw) else {
                    continue;
                };

                if !same_profile(&lead.url, url) {
                    continue;
                }

                update.apply(&mut lead);
                conn.hset::<_, _, _, ()>(&key, &field, serde_json::to_string(&lead)?)
                    .await?;
                updated += 1;
            }
        }

        debug!(url = %url, updated = updated, "Fanned out cached lead update by URL");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead() -> CachedLead {
        CachedLead {
            id: Uuid::now_v7(),
            url: "https://www.linkedin.com/in/jane-doe/".to_string(),
            name: Some("Jane Doe".to_string()),
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
    fn test_update_invite_applies_all_fields() {
        let now = Utc::now();
        let mut target = lead();

        CachedLeadUpdate::invite(InviteStatus::Sent, true, now).apply(&mut target);

        assert!(target.invite_sent);
        assert_eq!(target.invite_status, InviteStatus::Sent);
        assert_eq!(target.invite_sent_at, Some(now));
    }

    #[test]
    fn test_update_accepted_forces_sent_flag() {
        let now = Utc::now();
        let mut target = lead();

        CachedLeadUpdate::accepted(now).apply(&mut target);

        assert!(target.invite_sent);
        assert_eq!(target.invite_status, InviteStatus::Accepted);
        assert_eq!(target.invite_accepted_at, Some(now));
    }

    #[test]
    fn test_update_message_sent_clears_error() {
        let now = Utc::now();
        let mut target = lead();
        target.message_error = Some("previous failure".to_string());

        CachedLeadUpdate::message_sent(now).apply(&mut target);

        assert!(target.message_sent);
        assert_eq!(target.message_sent_at, Some(now));
        assert_eq!(target.message_error, None);
    }

    #[test]
    fn test_update_message_error_resets_sent_flag() {
        let mut target = lead();
        target.message_sent = true;

        CachedLeadUpdate::message_error("dialog not found".to_string()).apply(&mut target);

        assert!(!target.message_sent);
        assert_eq!(target.message_error.as_deref(), Some("dialog not found"));
    }

    #[test]
    fn test_empty_update_is_identity() {
        let mut target = lead();
        let before = target.clone();

        CachedLeadUpdate::default().apply(&mut target);

        assert_eq!(target, before);
    }

    #[test]
    fn test_parse_entry_skips_malformed() {
        assert!(RedisLeadCache::parse_entry("f", "{not json").is_none());
        let ok = serde_json::to_string(&lead()).unwrap();
        assert!(RedisLeadCache::parse_entry("f", &ok).is_some());
    }

    #[test]
    fn test_campaign_leads_key_shape() {
        let id = Uuid::now_v7();
        assert_eq!(campaign_leads_key(id), format!("campaign:{}:leads", id));
    }
}
