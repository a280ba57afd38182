//! Message flow: deliver a generated message to an accepted connection

use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use std::time::Duration;
use tracing::{debug, info};

use crate::browser;
use crate::dom;
use crate::error::{AutomationError, AutomationResult};
use crate::selectors::{
    COMPOSE_DIALOG_SELECTORS, COMPOSE_INPUT_SELECTORS, MESSAGE_BUTTON_ARIA_SELECTORS,
    MESSAGE_BUTTON_DATA_SELECTORS, SEND_BUTTON_SELECTORS, SEND_BUTTON_TEXTS, is_message_text,
};

/// Drives the compose dialog on a profile page
pub struct MessageSender {
    navigation_timeout: Duration,
    stabilise_delay: Duration,
    compose_delay: Duration,
    settle_delay: Duration,
}

impl Default for MessageSender {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(45),
            stabilise_delay: Duration::from_secs(3),
            compose_delay: Duration::from_secs(2),
            settle_delay: Duration::from_secs(2),
        }
    }
}

impl MessageSender {
    /// Navigate to the profile and send `content` through the compose
    /// dialog, typing character by character
    pub async fn send_message(
        &self,
        page: &Page,
        profile_url: &str,
        content: &str,
        display_name: Option<&str>,
    ) -> AutomationResult<()> {
        info!(
            url = %profile_url,
            recipient = display_name.unwrap_or("unknown"),
            "Sending message"
        );

        browser::goto_with_timeout(page, profile_url, self.navigation_timeout).await?;
        tokio::time::sleep(self.stabilise_delay).await;

        let message_button = self
            .find_message_button(page)
            .await
            .ok_or_else(|| AutomationError::ElementNotFound("Message button".to_string()))?;

        if let Err(e) = message_button.scroll_into_view().await {
            debug!(error = %e, "scroll_into_view failed, clicking anyway");
        }
        dom::click_with_fallbacks(&message_button).await?;

        let dialog = dom::wait_for_any(page, COMPOSE_DIALOG_SELECTORS, self.compose_delay)
            .await
            .ok_or_else(|| {
                AutomationError::ElementNotFound("message compose dialog".to_string())
            })?;

        let input = self
            .find_compose_input(page, &dialog)
            .await
            .ok_or_else(|| AutomationError::ElementNotFound("compose input".to_string()))?;

        input.focus().await?;
        dom::clear_editable(&input).await?;
        dom::type_text(&input, content).await?;

        let send = self
            .find_send_button(page, &dialog)
            .await
            .ok_or_else(|| AutomationError::ElementNotFound("Send button".to_string()))?;

        if !dom::is_visible_and_enabled(&send).await {
            return Err(AutomationError::ElementNotFound(
                "Send button is disabled".to_string(),
            ));
        }

        dom::click_with_fallbacks(&send).await?;
        tokio::time::sleep(self.settle_delay).await;

        info!(url = %profile_url, "Message sent");
        Ok(())
    }

    /// Discovery order: aria-label, data-control-name, visible text
    async fn find_message_button(&self, page: &Page) -> Option<Element> {
        for selector in MESSAGE_BUTTON_ARIA_SELECTORS
            .iter()
            .chain(MESSAGE_BUTTON_DATA_SELECTORS)
        {
            for candidate in dom::find_all(page, *selector).await {
                let aria = dom::attribute(&candidate, "aria-label").await.to_lowercase();
                if aria.contains("messaging") || aria.contains("message sent") {
                    continue;
                }
                if dom::is_visible_and_enabled(&candidate).await {
                    return Some(candidate);
                }
            }
        }

        for candidate in dom::find_all(page, "button, a.artdeco-button").await {
            let text = dom::inner_text(&candidate).await;
            if is_message_text(&text) && dom::is_visible_and_enabled(&candidate).await {
                return Some(candidate);
            }
        }

        None
    }

    async fn find_compose_input(&self, page: &Page, dialog: &Element) -> Option<Element> {
        for selector in COMPOSE_INPUT_SELECTORS {
            for input in dom::find_all_in(dialog, *selector).await {
                if dom::is_visible_and_enabled(&input).await {
                    return Some(input);
                }
            }
        }

        // Overlay bubbles render the form outside the dialog root
        for selector in COMPOSE_INPUT_SELECTORS {
            for input in dom::find_all(page, *selector).await {
                if dom::is_visible_and_enabled(&input).await {
                    return Some(input);
                }
            }
        }

        None
    }

    async fn find_send_button(&self, page: &Page, dialog: &Element) -> Option<Element> {
        for selector in SEND_BUTTON_SELECTORS {
            let mut candidates = dom::find_all_in(dialog, *selector).await;
            if candidates.is_empty() {
                candidates = dom::find_all(page, *selector).await;
            }

            for candidate in candidates {
                if *selector == "button[type='submit']" {
                    let text = dom::inner_text(&candidate).await.to_lowercase();
                    if !SEND_BUTTON_TEXTS.iter().any(|t| text.contains(t)) {
                        continue;
                    }
                }
                if dom::is_visible_and_enabled(&candidate).await {
                    return Some(candidate);
                }
            }
        }

        None
    }
}
