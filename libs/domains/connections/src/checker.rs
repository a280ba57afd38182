use automation::{MessageSender, SessionValidator, SessionVerdict, dom, pacing, selectors};
use chrono::Utc;
use domain_accounts::{AccountRepository, LimitKind, LinkedInAccount, RateLimitManager};
use domain_leads::{Lead, LeadCache, LeadRepository, LeadStateManager, extract_username};
use domain_messages::MessageRepository;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{ConnectionCheckError, ConnectionCheckResult};
use crate::session::to_session_data;

/// Scroll-loop tuning for the connections page
#[derive(Debug, Clone)]
pub struct ScrollSettings {
    pub max_scrolls: usize,
    pub max_zero_delta_scrolls: usize,
    pub min_step_px: i64,
    pub max_step_px: i64,
    pub min_pause_secs: u64,
    pub max_pause_secs: u64,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            max_scrolls: 20,
            max_zero_delta_scrolls: 3,
            min_step_px: 800,
            max_step_px: 1200,
            min_pause_secs: 2,
            max_pause_secs: 5,
        }
    }
}

/// How many profile URLs to collect before stopping the scroll loop
pub fn collection_target(sent_leads: usize) -> usize {
    (sent_leads * 3).max(100)
}

/// Match sent-invite leads against the collected username set
pub fn match_accepted<'a>(sent_leads: &'a [Lead], usernames: &HashSet<String>) -> Vec<&'a Lead> {
    sent_leads
        .iter()
        .filter(|lead| {
            extract_username(&lead.url)
                .map(|username| usernames.contains(&username))
                .unwrap_or(false)
        })
        .collect()
}

/// One accepted connection found this run
#[derive(Debug, Clone, Serialize)]
pub struct MatchedLead {
    pub lead_id: Uuid,
    pub campaign_id: Uuid,
    pub url: String,
    pub name: Option<String>,
}

/// Outcome of one acceptance check
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    /// Leads whose invite was accepted
    pub matched: usize,
    /// Store rows promoted by the fan-out
    pub updated: u64,
    /// Sent-invite leads examined
    pub total: usize,
    /// Follow-up messages delivered
    pub messages_sent: u32,
    pub matched_leads: Vec<MatchedLead>,
}

/// The acceptance checker (invoked on demand, not by workers)
pub struct ConnectionChecker<LR, LC, AR, MR>
where
    LR: LeadRepository,
    LC: LeadCache,
    AR: AccountRepository,
    MR: MessageRepository,
{
    leads: LeadStateManager<LR, LC>,
    limits: RateLimitManager<AR>,
    messages: Arc<MR>,
    validator: SessionValidator,
    sender: MessageSender,
    profile_root: PathBuf,
    scroll: ScrollSettings,
}

impl<LR, LC, AR, MR> ConnectionChecker<LR, LC, AR, MR>
where
    LR: LeadRepository,
    LC: LeadCache,
    AR: AccountRepository,
    MR: MessageRepository,
{
    pub fn new(
        leads: LeadStateManager<LR, LC>,
        limits: RateLimitManager<AR>,
        messages: Arc<MR>,
        profile_root: PathBuf,
    ) -> Self {
        Self {
            leads,
            limits,
            messages,
            validator: SessionValidator::default(),
            sender: MessageSender::default(),
            profile_root,
            scroll: ScrollSettings::default(),
        }
    }

    pub fn with_scroll_settings(mut self, scroll: ScrollSettings) -> Self {
        self.scroll = scroll;
        self
    }

    /// Scrape connections, promote accepted leads, send queued messages
    #[instrument(skip(self, account), fields(account_id = %account.id, user_id = %user_id))]
    pub async fn check_acceptances(
        &self,
        account: &LinkedInAccount,
        user_id: Uuid,
    ) -> ConnectionCheckResult<CheckReport> {
        let bundle = account.session_bundle()?;
        let data = to_session_data(&bundle);
        let profile_dir = self.profile_root.join(account.id.to_string());

        let verdict = self.validator.validate(&profile_dir, &data, true).await;
        let session = match verdict {
            SessionVerdict::Valid {
                session: Some(session),
                ..
            } => session,
            SessionVerdict::Valid { session: None, .. } => {
                return Err(ConnectionCheckError::SessionInvalid(
                    "validator returned no live session".to_string(),
                ));
            }
            SessionVerdict::Invalid { reason } => {
                return Err(ConnectionCheckError::SessionInvalid(reason));
            }
        };

        // The browser must be released on every path below
        let outcome = self.run_check(&session, account, user_id).await;
        session.close().await;

        outcome
    }

    async fn run_check(
        &self,
        session: &automation::BrowserSession,
        account: &LinkedInAccount,
        user_id: Uuid,
    ) -> ConnectionCheckResult<CheckReport> {
        let page = session.page();

        let sent_leads = self.leads.sent_leads(user_id).await?;
        info!(sent = sent_leads.len(), "Loaded leads with sent invites");

        if sent_leads.is_empty() {
            self.limits
                .increment(account.id, LimitKind::ConnectionCheck, 1)
                .await?;
            return Ok(CheckReport::default());
        }

        let usernames = self
            .collect_connection_usernames(page, collection_target(sent_leads.len()))
            .await?;
        info!(collected = usernames.len(), "Collected connection usernames");

        let matched = match_accepted(&sent_leads, &usernames);
        let mut report = CheckReport {
            matched: matched.len(),
            total: sent_leads.len(),
            ..Default::default()
        };

        let now = Utc::now();
        for lead in &matched {
            let rows = self
                .leads
                .update_lead_connection_accepted(&lead.url, now)
                .await?;
            report.updated += rows;
            report.matched_leads.push(MatchedLead {
                lead_id: lead.id,
                campaign_id: lead.campaign_id,
                url: lead.url.clone(),
                name: lead.name.clone(),
            });
        }

        report.messages_sent = self.send_queued_messages(page, account, &matched).await?;

        let all_ids: Vec<Uuid> = sent_leads.iter().map(|l| l.id).collect();
        self.leads.touch_connection_check(all_ids, now).await?;

        self.limits
            .increment(account.id, LimitKind::ConnectionCheck, 1)
            .await?;

        info!(
            matched = report.matched,
            updated = report.updated,
            messages_sent = report.messages_sent,
            "Connection check complete"
        );
        Ok(report)
    }

    /// Scroll loop: random 800–1200 px steps with 2–5 s pauses, stopping
    /// at the collection target, three consecutive empty scrolls, or the
    /// scroll cap
    async fn collect_connection_usernames(
        &self,
        page: &automation::Page,
        target: usize,
    ) -> ConnectionCheckResult<HashSet<String>> {
        automation::browser::goto_with_timeout(
            page,
            selectors::CONNECTIONS_URL,
            Duration::from_secs(45),
        )
        .await?;
        tokio::time::sleep(Duration::from_secs(3)).await;

        let mut usernames: HashSet<String> = HashSet::new();
        let mut zero_delta_streak = 0usize;

        for scroll in 0..self.scroll.max_scrolls {
            let step = rand::rng().random_range(self.scroll.min_step_px..=self.scroll.max_step_px);
            dom::scroll_by(page, step).await?;
            pacing::random_delay(self.scroll.min_pause_secs, self.scroll.max_pause_secs).await;

            let before = usernames.len();
            for href in dom::anchor_hrefs_containing(page, "/in/").await {
                if let Some(username) = extract_username(&href) {
                    usernames.insert(username);
                }
            }

            if usernames.len() == before {
                zero_delta_streak += 1;
                if zero_delta_streak >= self.scroll.max_zero_delta_scrolls {
                    info!(scrolls = scroll + 1, "No new connections after repeated scrolls");
                    break;
                }
            } else {
                zero_delta_streak = 0;
            }

            if usernames.len() >= target {
                info!(scrolls = scroll + 1, "Collection target reached");
                break;
            }
        }

        Ok(usernames)
    }

    /// Deliver generated messages to fresh connections, gated by the
    /// message quota, pacing 30–90 s between sends
    async fn send_queued_messages(
        &self,
        page: &automation::Page,
        account: &LinkedInAccount,
        matched: &[&Lead],
    ) -> ConnectionCheckResult<u32> {
        if matched.is_empty() {
            return Ok(0);
        }

        let status = self
            .limits
            .check_limit(account.id, LimitKind::Message)
            .await?;
        if !status.can_proceed {
            info!("Message quota exhausted, skipping follow-up messages");
            return Ok(0);
        }

        let mut sent = 0u32;
        let mut remaining = status.remaining;

        for lead in matched {
            if remaining <= 0 {
                info!("Message quota reached mid-run, stopping sends");
                break;
            }

            if lead.message_sent {
                continue;
            }

            let Some(message) = self.messages.draft_for_lead(lead.id).await? else {
                continue;
            };

            if sent > 0 {
                pacing::random_delay(
                    pacing::INTER_MESSAGE_MIN_SECS,
                    pacing::INTER_MESSAGE_MAX_SECS,
                )
                .await;
            }

            match self
                .sender
                .send_message(page, &lead.url, &message.content, lead.name.as_deref())
                .await
            {
                Ok(()) => {
                    let now = Utc::now();
                    self.leads.update_lead_message_sent(&lead.url, now).await?;
                    self.messages.mark_sent(message.id, now).await?;
                    self.limits
                        .increment(account.id, LimitKind::Message, 1)
                        .await?;
                    sent += 1;
                    remaining -= 1;
                }
                Err(e) => {
                    warn!(lead_id = %lead.id, error = %e, "Follow-up message failed");
                    self.leads
                        .update_lead_message_error(&lead.url, &e.to_string())
                        .await?;
                }
            }
        }

        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_leads::{InviteStatus, ScrapeStatus};

    fn sent_lead(url: &str) -> Lead {
        let now = Utc::now();
        Lead {
            id: Uuid::now_v7(),
            user_id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            url: url.to_string(),
            name: None,
            title: None,
            company: None,
            location: None,
            profile_picture: None,
            status: ScrapeStatus::Completed,
            invite_sent: true,
            invite_status: InviteStatus::Sent,
            invite_sent_at: Some(now),
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

    #[test]
    fn test_collection_target_floor() {
        assert_eq!(collection_target(0), 100);
        assert_eq!(collection_target(10), 100);
        assert_eq!(collection_target(33), 100);
        assert_eq!(collection_target(34), 102);
        assert_eq!(collection_target(50), 150);
    }

    #[test]
    fn test_match_accepted_by_username() {
        let leads = vec![
            sent_lead("https://www.linkedin.com/in/jane-doe/"),
            sent_lead("https://www.linkedin.com/in/john-smith/"),
        ];

        let usernames: HashSet<String> = ["jane-doe".to_string()].into();
        let matched = match_accepted(&leads, &usernames);

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].url, "https://www.linkedin.com/in/jane-doe/");
    }

    #[test]
    fn test_match_accepted_is_case_insensitive_via_normalization() {
        let leads = vec![sent_lead("https://www.linkedin.com/in/Jane-Doe/")];

        let usernames: HashSet<String> = ["jane-doe".to_string()].into();
        assert_eq!(match_accepted(&leads, &usernames).len(), 1);
    }

    #[test]
    fn test_match_accepted_skips_unparseable_urls() {
        let leads = vec![sent_lead("not-a-profile-url")];

        let usernames: HashSet<String> = ["not-a-profile-url".to_string()].into();
        assert!(match_accepted(&leads, &usernames).is_empty());
    }
}
