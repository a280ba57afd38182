use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cache::{CachedLeadUpdate, LeadCache};
use crate::error::LeadResult;
use crate::models::{CachedLead, EligibleLeads, InviteStatus, LeadSource};
use crate::repository::LeadRepository;

/// Dual-tier lead state authority
///
/// Per-campaign writes go cache first, store second; the store write is
/// authoritative and its errors re-raise, while cache misses and cache
/// errors are logged and absorbed. Global writes fan out by profile URL
/// across campaigns: store rows first, then every cached copy.
pub struct LeadStateManager<R: LeadRepository, C: LeadCache> {
    repository: Arc<R>,
    cache: Arc<C>,
}

impl<R: LeadRepository, C: LeadCache> Clone for LeadStateManager<R, C> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<R: LeadRepository, C: LeadCache> LeadStateManager<R, C> {
    pub fn new(repository: R, cache: C) -> Self {
        Self {
            repository: Arc::new(repository),
            cache: Arc::new(cache),
        }
    }

    /// Per-campaign invite status write (no URL fan-out)
    #[instrument(skip(self), fields(campaign_id = %campaign_id, lead_id = %lead_id))]
    pub async fn update_lead_status(
        &self,
        campaign_id: Uuid,
        lead_id: Uuid,
        status: InviteStatus,
        invite_sent: bool,
    ) -> LeadResult<()> {
        let now = Utc::now();
        let update = CachedLeadUpdate::invite(status, invite_sent, now);

        match self.cache.update_entry(campaign_id, lead_id, update).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(lead_id = %lead_id, "Lead not present in campaign cache, store write only");
            }
            Err(e) => {
                warn!(lead_id = %lead_id, error = %e, "Cache write failed, store remains authoritative");
            }
        }

        self.repository
            .update_invite_status(campaign_id, lead_id, status, invite_sent, now)
            .await
    }

    /// Cross-campaign invite status fan-out, keyed by profile URL.
    /// Returns the number of store rows updated.
    #[instrument(skip(self), fields(url = %url, status = %status))]
    pub async fn update_lead_status_globally(
        &self,
        url: &str,
        status: InviteStatus,
        invite_sent: bool,
    ) -> LeadResult<u64> {
        let rows = self
            .repository
            .update_invite_status_by_url(url, status, invite_sent)
            .await?;

        self.fan_out_cache(url, CachedLeadUpdate::invite_global(status, invite_sent))
            .await;

        Ok(rows)
    }

    /// Fan-out promotion to accepted
    pub async fn update_lead_connection_accepted(
        &self,
        url: &str,
        accepted_at: DateTime<Utc>,
    ) -> LeadResult<u64> {
        let rows = self.repository.mark_accepted_by_url(url, accepted_at).await?;

        info!(url = %url, rows = rows, "Lead connection accepted");
        self.fan_out_cache(url, CachedLeadUpdate::accepted(accepted_at))
            .await;

        Ok(rows)
    }

    /// Fan-out message-sent state
    pub async fn update_lead_message_sent(
        &self,
        url: &str,
        sent_at: DateTime<Utc>,
    ) -> LeadResult<u64> {
        let rows = self.repository.mark_message_sent_by_url(url, sent_at).await?;

        self.fan_out_cache(url, CachedLeadUpdate::message_sent(sent_at))
            .await;

        Ok(rows)
    }

    /// Fan-out message-error state
    pub async fn update_lead_message_error(&self, url: &str, error: &str) -> LeadResult<u64> {
        let rows = self.repository.mark_message_error_by_url(url, error).await?;

        self.fan_out_cache(url, CachedLeadUpdate::message_error(error.to_string()))
            .await;

        Ok(rows)
    }

    /// The eligibility query: cache read-through with best-effort populate
    #[instrument(skip(self), fields(campaign_id = %campaign_id))]
    pub async fn fetch_eligible_leads(&self, campaign_id: Uuid) -> LeadResult<EligibleLeads> {
        let cached = match self.cache.campaign_leads(campaign_id).await {
            Ok(leads) => leads,
            Err(e) => {
                warn!(error = %e, "Campaign cache read failed, falling back to store");
                Vec::new()
            }
        };

        let (all_leads, source) = if cached.is_empty() {
            let rows = self.repository.leads_for_campaign(campaign_id).await?;
            let leads: Vec<CachedLead> = rows.iter().map(CachedLead::from).collect();

            if let Err(e) = self
                .cache
                .populate_campaign(campaign_id, leads.clone())
                .await
            {
                warn!(error = %e, "Failed to populate campaign cache");
            }

            (leads, LeadSource::Postgresql)
        } else {
            (cached, LeadSource::Redis)
        };

        let eligible_leads: Vec<CachedLead> = all_leads
            .iter()
            .filter(|l| l.is_eligible())
            .cloned()
            .collect();

        info!(
            total = all_leads.len(),
            eligible = eligible_leads.len(),
            source = ?source,
            "Fetched eligible leads"
        );

        Ok(EligibleLeads {
            all_leads,
            eligible_leads,
            source,
        })
    }

    /// Sent-invite leads for a user, used by the connection checker
    pub async fn sent_leads(&self, user_id: Uuid) -> LeadResult<Vec<crate::models::Lead>> {
        self.repository.sent_leads_for_user(user_id).await
    }

    /// Stamp the connection-check time on a set of leads
    pub async fn touch_connection_check(
        &self,
        lead_ids: Vec<Uuid>,
        at: DateTime<Utc>,
    ) -> LeadResult<()> {
        self.repository.touch_connection_check(lead_ids, at).await
    }

    async fn fan_out_cache(&self, url: &str, update: CachedLeadUpdate) {
        match self.cache.update_by_url(url, update).await {
            Ok(entries) => {
                debug!(url = %url, entries = entries, "Cache fan-out complete");
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Cache fan-out failed, store remains authoritative");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MockLeadCache;
    use crate::error::LeadError;
    use crate::models::{Lead, ScrapeStatus};
    use crate::repository::MockLeadRepository;
    use mockall::predicate::eq;

    fn lead_row(campaign_id: Uuid, url: &str, status: InviteStatus, sent: bool) -> Lead {
        let now = Utc::now();
        Lead {
            id: Uuid::now_v7(),
            user_id: Uuid::new_v4(),
            campaign_id,
            url: url.to_string(),
            name: Some("Jane Doe".to_string()),
            title: None,
            company: None,
            location: None,
            profile_picture: None,
            status: ScrapeStatus::Completed,
            invite_sent: sent,
            invite_status: status,
            invite_sent_at: None,
            invite_accepted_at: None,
            invite_retry_count: 0,
            last_connection_check_at: None,
            message_sent: false,
            message_sent_at: None,
            message_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn cached(url: &str, status: InviteStatus, sent: bool) -> CachedLead {
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

    #[tokio::test]
    async fn test_fetch_eligible_from_cache() {
        let campaign_id = Uuid::new_v4();
        let entries = vec![
            cached("https://www.linkedin.com/in/a/", InviteStatus::Pending, false),
            cached("https://www.linkedin.com/in/b/", InviteStatus::Sent, true),
            cached("https://www.linkedin.com/in/c/", InviteStatus::Failed, false),
        ];

        let mut cache = MockLeadCache::new();
        cache
            .expect_campaign_leads()
            .with(eq(campaign_id))
            .returning(move |_| Ok(entries.clone()));
        cache.expect_populate_campaign().never();

        let mut repo = MockLeadRepository::new();
        repo.expect_leads_for_campaign().never();

        let manager = LeadStateManager::new(repo, cache);
        let result = manager.fetch_eligible_leads(campaign_id).await.unwrap();

        assert_eq!(result.source, LeadSource::Redis);
        assert_eq!(result.all_leads.len(), 3);
        // Pending and failed are eligible; sent is not
        assert_eq!(result.eligible_leads.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_eligible_falls_back_to_store_and_populates() {
        let campaign_id = Uuid::new_v4();
        let rows = vec![
            lead_row(campaign_id, "https://www.linkedin.com/in/a/", InviteStatus::Pending, false),
            lead_row(campaign_id, "https://www.linkedin.com/in/b/", InviteStatus::Accepted, true),
        ];

        let mut cache = MockLeadCache::new();
        cache.expect_campaign_leads().returning(|_| Ok(Vec::new()));
        cache
            .expect_populate_campaign()
            .withf(move |id, leads| *id == campaign_id && leads.len() == 2)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut repo = MockLeadRepository::new();
        repo.expect_leads_for_campaign()
            .with(eq(campaign_id))
            .returning(move |_| Ok(rows.clone()));

        let manager = LeadStateManager::new(repo, cache);
        let result = manager.fetch_eligible_leads(campaign_id).await.unwrap();

        assert_eq!(result.source, LeadSource::Postgresql);
        assert_eq!(result.all_leads.len(), 2);
        assert_eq!(result.eligible_leads.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_eligible_cache_populate_failure_not_fatal() {
        let campaign_id = Uuid::new_v4();
        let rows = vec![lead_row(
            campaign_id,
            "https://www.linkedin.com/in/a/",
            InviteStatus::Pending,
            false,
        )];

        let mut cache = MockLeadCache::new();
        cache.expect_campaign_leads().returning(|_| Ok(Vec::new()));
        cache
            .expect_populate_campaign()
            .returning(|_, _| Err(LeadError::Cache("connection reset".to_string())));

        let mut repo = MockLeadRepository::new();
        repo.expect_leads_for_campaign()
            .returning(move |_| Ok(rows.clone()));

        let manager = LeadStateManager::new(repo, cache);
        let result = manager.fetch_eligible_leads(campaign_id).await.unwrap();

        assert_eq!(result.eligible_leads.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_eligible_cache_read_failure_not_fatal() {
        let campaign_id = Uuid::new_v4();
        let rows = vec![lead_row(
            campaign_id,
            "https://www.linkedin.com/in/a/",
            InviteStatus::Pending,
            false,
        )];

        let mut cache = MockLeadCache::new();
        cache
            .expect_campaign_leads()
            .returning(|_| Err(LeadError::Cache("timeout".to_string())));
        cache.expect_populate_campaign().returning(|_, _| Ok(()));

        let mut repo = MockLeadRepository::new();
        repo.expect_leads_for_campaign()
            .returning(move |_| Ok(rows.clone()));

        let manager = LeadStateManager::new(repo, cache);
        let result = manager.fetch_eligible_leads(campaign_id).await.unwrap();

        assert_eq!(result.source, LeadSource::Postgresql);
    }

    #[tokio::test]
    async fn test_update_lead_status_writes_store_when_cache_entry_absent() {
        let campaign_id = Uuid::new_v4();
        let lead_id = Uuid::now_v7();

        let mut cache = MockLeadCache::new();
        cache.expect_update_entry().returning(|_, _, _| Ok(false));

        let mut repo = MockLeadRepository::new();
        repo.expect_update_invite_status()
            .withf(move |cid, lid, status, sent, _| {
                *cid == campaign_id
                    && *lid == lead_id
                    && *status == InviteStatus::Sent
                    && *sent
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));

        let manager = LeadStateManager::new(repo, cache);
        manager
            .update_lead_status(campaign_id, lead_id, InviteStatus::Sent, true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_lead_status_reraises_store_errors() {
        let mut cache = MockLeadCache::new();
        cache.expect_update_entry().returning(|_, _, _| Ok(true));

        let mut repo = MockLeadRepository::new();
        repo.expect_update_invite_status()
            .returning(|_, _, _, _, _| Err(LeadError::Database("deadlock".to_string())));

        let manager = LeadStateManager::new(repo, cache);
        let result = manager
            .update_lead_status(Uuid::new_v4(), Uuid::now_v7(), InviteStatus::Failed, false)
            .await;

        assert!(matches!(result, Err(LeadError::Database(_))));
    }

    #[tokio::test]
    async fn test_global_update_returns_store_count() {
        let url = "https://www.linkedin.com/in/jane-doe/";

        let mut repo = MockLeadRepository::new();
        repo.expect_update_invite_status_by_url()
            .withf(move |u, status, sent| {
                u == url && *status == InviteStatus::Accepted && *sent
            })
            .returning(|_, _, _| Ok(2));

        let mut cache = MockLeadCache::new();
        cache.expect_update_by_url().returning(|_, _| Ok(2));

        let manager = LeadStateManager::new(repo, cache);
        let rows = manager
            .update_lead_status_globally(url, InviteStatus::Accepted, true)
            .await
            .unwrap();

        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn test_global_update_cache_failure_not_fatal() {
        let mut repo = MockLeadRepository::new();
        repo.expect_mark_accepted_by_url().returning(|_, _| Ok(2));

        let mut cache = MockLeadCache::new();
        cache
            .expect_update_by_url()
            .returning(|_, _| Err(LeadError::Cache("scan failed".to_string())));

        let manager = LeadStateManager::new(repo, cache);
        let rows = manager
            .update_lead_connection_accepted("https://www.linkedin.com/in/a/", Utc::now())
            .await
            .unwrap();

        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn test_message_error_fan_out() {
        let url = "https://www.linkedin.com/in/jane-doe/";

        let mut repo = MockLeadRepository::new();
        repo.expect_mark_message_error_by_url()
            .withf(move |u, e| u == url && e == "compose dialog not found")
            .returning(|_, _| Ok(1));

        let mut cache = MockLeadCache::new();
        cache
            .expect_update_by_url()
            .withf(|_, update| update.message_sent == Some(false))
            .returning(|_, _| Ok(1));

        let manager = LeadStateManager::new(repo, cache);
        let rows = manager
            .update_lead_message_error(url, "compose dialog not found")
            .await
            .unwrap();

        assert_eq!(rows, 1);
    }
}
