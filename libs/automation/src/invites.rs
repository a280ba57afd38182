//! Invite automation: drive the Connect flow for a batch of leads
//!
//! Leads are processed sequentially in input order. Per-lead failures
//! are recorded and the loop continues; only an interrupt raised by the
//! observer aborts the batch.

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use serde::Serialize;
use std::time::Duration;
use strum::Display;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::browser;
use crate::dom;
use crate::error::{AutomationError, AutomationResult, Interrupt};
use crate::pacing;
use crate::selectors::{
    CONNECTED_LABELS, INVITE_MODAL_SELECTORS, MORE_BUTTON_LABELS, OVERFLOW_ITEM_SELECTORS,
    SEND_WITHOUT_NOTE_LABELS, TOP_CARD_SELECTORS, is_connect_text, is_invite_aria_label,
    is_message_text, is_pending_text,
};

/// One lead fed into the invite loop
#[derive(Debug, Clone)]
pub struct InviteLead {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub url: String,
    pub name: Option<String>,
}

/// Sub-lead progress stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InviteStage {
    Navigating,
    Classifying,
    Clicking,
    Sending,
}

impl InviteStage {
    /// Fraction of a lead considered done when this stage begins
    pub fn fraction(&self) -> f64 {
        match self {
            InviteStage::Navigating => 0.1,
            InviteStage::Classifying => 0.35,
            InviteStage::Clicking => 0.55,
            InviteStage::Sending => 0.8,
        }
    }
}

/// A fractional progress report: `current = completed leads + stage fraction`
#[derive(Debug, Clone)]
pub struct InviteProgress {
    pub current: f64,
    pub stage: InviteStage,
    pub lead_id: Uuid,
    pub lead_name: Option<String>,
}

/// Terminal classification of one lead
#[derive(Debug, Clone, PartialEq)]
pub enum InviteOutcome {
    /// Invite sent and confirmed pending
    Sent,
    /// A pending invite already existed
    AlreadyPending,
    /// The profile is already a connection
    AlreadyConnected,
    Failed(String),
}

impl InviteOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, InviteOutcome::Sent)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InviteFailure {
    pub lead_id: Uuid,
    pub name: Option<String>,
    pub error: String,
}

/// Aggregate counts for one batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct InviteResults {
    pub total: u32,
    pub sent: u32,
    pub already_connected: u32,
    pub already_pending: u32,
    pub failed: u32,
    pub errors: Vec<InviteFailure>,
}

impl InviteResults {
    fn new(total: u32) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    fn record(&mut self, lead: &InviteLead, outcome: &InviteOutcome) {
        match outcome {
            InviteOutcome::Sent => self.sent += 1,
            InviteOutcome::AlreadyPending => self.already_pending += 1,
            InviteOutcome::AlreadyConnected => self.already_connected += 1,
            InviteOutcome::Failed(error) => {
                self.failed += 1;
                self.errors.push(InviteFailure {
                    lead_id: lead.id,
                    name: lead.name.clone(),
                    error: error.clone(),
                });
            }
        }
    }
}

/// Receives progress and completion events during a batch
///
/// Returning an [`Interrupt`] aborts the loop and re-raises; the observer
/// is also the party responsible for advancing the invite counter when it
/// sees a sent outcome, so the quota moves even if the batch is cut short.
#[async_trait]
pub trait InviteObserver: Send + Sync {
    async fn on_progress(&self, progress: InviteProgress) -> Result<(), Interrupt>;

    async fn on_lead_processed(
        &self,
        lead: &InviteLead,
        outcome: &InviteOutcome,
    ) -> Result<(), Interrupt>;
}

/// Persists per-lead invite state (per-campaign semantics, no URL fan-out)
#[async_trait]
pub trait LeadStatusWriter: Send + Sync {
    async fn write_outcome(&self, lead: &InviteLead, outcome: &InviteOutcome)
    -> Result<(), String>;
}

/// The Connect-flow driver
pub struct InviteRunner {
    navigation_timeout: Duration,
    stabilise_delay: Duration,
    modal_delay: Duration,
    verify_timeout: Duration,
    menu_delay: Duration,
    pace_between_leads: bool,
}

impl Default for InviteRunner {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(45),
            stabilise_delay: Duration::from_secs(5),
            modal_delay: Duration::from_millis(1800),
            verify_timeout: Duration::from_secs(3),
            menu_delay: Duration::from_millis(1000),
            pace_between_leads: true,
        }
    }
}

impl InviteRunner {
    /// Process a batch of leads through the Connect flow
    ///
    /// `custom_message` is accepted for API compatibility; invites are
    /// always sent without a note.
    pub async fn process_invites(
        &self,
        page: &Page,
        leads: &[InviteLead],
        custom_message: Option<&str>,
        writer: &dyn LeadStatusWriter,
        observer: &dyn InviteObserver,
    ) -> AutomationResult<InviteResults> {
        let _ = custom_message;

        let mut results = InviteResults::new(leads.len() as u32);

        for (index, lead) in leads.iter().enumerate() {
            let base = index as f64;

            let outcome = match self.process_single(page, lead, observer, base).await {
                Ok(outcome) => outcome,
                Err(e) if e.interrupt().is_some() => return Err(e),
                Err(e) => InviteOutcome::Failed(e.to_string()),
            };

            info!(lead_id = %lead.id, url = %lead.url, outcome = ?outcome, "Lead processed");

            // The browser action already happened; a failed state write
            // must not turn the outcome into a retry
            if let Err(e) = writer.write_outcome(lead, &outcome).await {
                warn!(lead_id = %lead.id, error = %e, "Lead status write failed");
            }

            results.record(lead, &outcome);

            observer
                .on_lead_processed(lead, &outcome)
                .await
                .map_err(AutomationError::Interrupted)?;

            if self.pace_between_leads && index + 1 < leads.len() {
                pacing::inter_lead_delay().await;
            }
        }

        Ok(results)
    }

    async fn process_single(
        &self,
        page: &Page,
        lead: &InviteLead,
        observer: &dyn InviteObserver,
        base: f64,
    ) -> AutomationResult<InviteOutcome> {
        self.report(observer, lead, base, InviteStage::Navigating)
            .await?;

        browser::goto_with_timeout(page, &lead.url, self.navigation_timeout).await?;
        tokio::time::sleep(self.stabilise_delay).await;

        self.report(observer, lead, base, InviteStage::Classifying)
            .await?;

        // Pending wins over everything else, even an (adversarial)
        // simultaneous Message button
        if self.pending_visible(page).await {
            return Ok(InviteOutcome::AlreadyPending);
        }

        let connect = self.find_connect_button(page).await?;

        let Some(connect) = connect else {
            return Ok(self.classify_without_connect(page).await);
        };

        self.report(observer, lead, base, InviteStage::Clicking)
            .await?;

        dom::click_with_fallbacks(&connect).await?;
        tokio::time::sleep(self.modal_delay).await;

        let Some(modal) = self.find_invite_modal(page).await else {
            return Ok(InviteOutcome::Failed(
                "invite modal did not appear".to_string(),
            ));
        };

        let Some(send) = self.find_send_without_note(&modal).await else {
            return Ok(InviteOutcome::Failed(
                "send-without-a-note button not found".to_string(),
            ));
        };

        self.report(observer, lead, base, InviteStage::Sending)
            .await?;

        dom::click_with_fallbacks(&send).await?;

        if self.verify_pending(page).await {
            Ok(InviteOutcome::Sent)
        } else {
            Ok(InviteOutcome::Failed(
                "invite not confirmed as pending".to_string(),
            ))
        }
    }

    async fn report(
        &self,
        observer: &dyn InviteObserver,
        lead: &InviteLead,
        base: f64,
        stage: InviteStage,
    ) -> AutomationResult<()> {
        observer
            .on_progress(InviteProgress {
                current: base + stage.fraction(),
                stage,
                lead_id: lead.id,
                lead_name: lead.name.clone(),
            })
            .await
            .map_err(AutomationError::Interrupted)
    }

    /// The profile header container; falls back to whole-page scope
    async fn top_card(&self, page: &Page) -> Option<Element> {
        for selector in TOP_CARD_SELECTORS {
            if let Ok(element) = page.find_element(*selector).await {
                return Some(element);
            }
        }
        None
    }

    async fn header_buttons(&self, page: &Page) -> Vec<Element> {
        match self.top_card(page).await {
            Some(scope) => dom::find_all_in(&scope, "button").await,
            None => dom::find_all(page, "button").await,
        }
    }

    async fn pending_visible(&self, page: &Page) -> bool {
        for button in self.header_buttons(page).await {
            let text = dom::inner_text(&button).await;
            let aria = dom::attribute(&button, "aria-label").await;

            if (is_pending_text(&text) || is_pending_text(&aria))
                && dom::is_visible_and_enabled(&button).await
            {
                return true;
            }
        }
        false
    }

    async fn connected_indicator_visible(&self, page: &Page) -> bool {
        // "Remove connection" lives in the overflow menu markup even when
        // collapsed; a header Message button is the secondary indicator
        for selector in OVERFLOW_ITEM_SELECTORS {
            for item in dom::find_all(page, *selector).await {
                let text = dom::inner_text(&item).await.to_lowercase();
                if CONNECTED_LABELS.iter().any(|label| text.contains(label)) {
                    return true;
                }
            }
        }

        for button in self.header_buttons(page).await {
            let text = dom::inner_text(&button).await;
            if is_message_text(&text) && dom::is_visible_and_enabled(&button).await {
                return true;
            }
        }

        false
    }

    /// Strategy 1: direct Connect button scoped to the profile header.
    /// Strategy 2: the "More" overflow menu's Connect item.
    async fn find_connect_button(&self, page: &Page) -> AutomationResult<Option<Element>> {
        for button in self.header_buttons(page).await {
            let text = dom::inner_text(&button).await;
            let aria = dom::attribute(&button, "aria-label").await;

            if (is_connect_text(&text) || is_invite_aria_label(&aria))
                && dom::is_visible_and_enabled(&button).await
            {
                debug!("Connect found directly in profile header");
                return Ok(Some(button));
            }
        }

        let Some(more) = self.find_more_button(page).await else {
            return Ok(None);
        };

        dom::click_with_fallbacks(&more).await?;
        tokio::time::sleep(self.menu_delay).await;

        for selector in OVERFLOW_ITEM_SELECTORS {
            for item in dom::find_all(page, *selector).await {
                let text = dom::inner_text(&item).await;
                let aria = dom::attribute(&item, "aria-label").await;

                let matches = text.trim().eq_ignore_ascii_case("connect")
                    || is_invite_aria_label(&aria);

                if matches && dom::is_visible_and_enabled(&item).await {
                    debug!("Connect found in overflow menu");
                    return Ok(Some(item));
                }
            }
        }

        Ok(None)
    }

    async fn find_more_button(&self, page: &Page) -> Option<Element> {
        for button in self.header_buttons(page).await {
            let text = dom::inner_text(&button).await.to_lowercase();
            let aria = dom::attribute(&button, "aria-label").await.to_lowercase();

            let matches = MORE_BUTTON_LABELS
                .iter()
                .any(|label| text == *label || aria.contains(label));

            if matches && dom::is_visible_and_enabled(&button).await {
                return Some(button);
            }
        }
        None
    }

    /// No Connect anywhere: re-verify before recording a failure
    async fn classify_without_connect(&self, page: &Page) -> InviteOutcome {
        if self.pending_visible(page).await {
            return InviteOutcome::AlreadyPending;
        }
        if self.connected_indicator_visible(page).await {
            return InviteOutcome::AlreadyConnected;
        }
        InviteOutcome::Failed("Connect button not found".to_string())
    }

    async fn find_invite_modal(&self, page: &Page) -> Option<Element> {
        for selector in INVITE_MODAL_SELECTORS {
            for dialog in dom::find_all(page, *selector).await {
                if *selector == ".send-invite" {
                    return Some(dialog);
                }

                let text = dom::inner_text(&dialog).await.to_lowercase();
                if text.contains("send without a note") || text.contains("add a note") {
                    return Some(dialog);
                }
            }
        }
        None
    }

    async fn find_send_without_note(&self, modal: &Element) -> Option<Element> {
        let mut buttons = dom::find_all_in(modal, "button").await;

        for label in SEND_WITHOUT_NOTE_LABELS {
            let mut found_idx = None;
            for (idx, button) in buttons.iter().enumerate() {
                let text = dom::inner_text(button).await.to_lowercase();
                let aria = dom::attribute(button, "aria-label").await.to_lowercase();

                if (text == *label || aria.contains(label))
                    && dom::is_visible_and_enabled(button).await
                {
                    found_idx = Some(idx);
                    break;
                }
            }
            if let Some(idx) = found_idx {
                return Some(buttons.swap_remove(idx));
            }
        }
        None
    }

    /// Confirm the invite landed: a Pending marker must appear
    async fn verify_pending(&self, page: &Page) -> bool {
        let deadline = tokio::time::Instant::now() + self.verify_timeout;

        loop {
            if self.pending_visible(page).await {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(url: &str) -> InviteLead {
        InviteLead {
            id: Uuid::now_v7(),
            campaign_id: Uuid::new_v4(),
            url: url.to_string(),
            name: Some("Jane Doe".to_string()),
        }
    }

    #[test]
    fn test_results_record_each_outcome() {
        let mut results = InviteResults::new(4);
        let l = lead("https://www.linkedin.com/in/a/");

        results.record(&l, &InviteOutcome::Sent);
        results.record(&l, &InviteOutcome::AlreadyPending);
        results.record(&l, &InviteOutcome::AlreadyConnected);
        results.record(&l, &InviteOutcome::Failed("no connect".to_string()));

        assert_eq!(results.total, 4);
        assert_eq!(results.sent, 1);
        assert_eq!(results.already_pending, 1);
        assert_eq!(results.already_connected, 1);
        assert_eq!(results.failed, 1);
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.errors[0].error, "no connect");
    }

    #[test]
    fn test_stage_fractions_are_strictly_increasing() {
        let stages = [
            InviteStage::Navigating,
            InviteStage::Classifying,
            InviteStage::Clicking,
            InviteStage::Sending,
        ];

        for pair in stages.windows(2) {
            assert!(pair[0].fraction() < pair[1].fraction());
        }
        for stage in stages {
            assert!(stage.fraction() > 0.0 && stage.fraction() < 1.0);
        }
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(InviteStage::Navigating.to_string(), "navigating");
        assert_eq!(InviteStage::Sending.to_string(), "sending");
    }

    #[test]
    fn test_outcome_is_sent() {
        assert!(InviteOutcome::Sent.is_sent());
        assert!(!InviteOutcome::AlreadyPending.is_sent());
        assert!(!InviteOutcome::Failed("x".to_string()).is_sent());
    }
}
