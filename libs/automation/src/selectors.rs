//! Ordered selector tables for LinkedIn surfaces
//!
//! The first matching visible-and-enabled element wins. These lists are
//! the only defensive posture against DOM churn; keep them as data, not
//! logic.

/// The authenticated feed, used to validate a restored session
pub const FEED_URL: &str = "https://www.linkedin.com/feed/";

/// The connections listing scraped by the acceptance checker
pub const CONNECTIONS_URL: &str = "https://www.linkedin.com/mynetwork/invite-connect/connections/";

/// URL fragments that mean the session bounced to authentication
pub const LOGIN_URL_MARKERS: &[&str] = &["/login", "/checkpoint", "/authwall", "/uas/"];

/// URL fragments that mean the session landed on an authenticated surface
pub const AUTHENTICATED_URL_MARKERS: &[&str] = &["/feed", "/in/", "/mynetwork", "/messaging"];

/// Profile header containers; Connect discovery is scoped here to avoid
/// sidebar Connect buttons on recommended-profile widgets
pub const TOP_CARD_SELECTORS: &[&str] = &[
    "section.artdeco-card",
    ".pv-top-card",
    ".ph5.pb5",
    "main section",
];

/// Candidate dialog roots for the send-invite modal
pub const INVITE_MODAL_SELECTORS: &[&str] = &[
    ".send-invite",
    "div[role='dialog'].artdeco-modal",
    "div[role='dialog']",
];

/// The "send without a note" affordance inside the invite modal
pub const SEND_WITHOUT_NOTE_LABELS: &[&str] = &["send without a note", "send now", "send"];

/// Texts that disqualify a button from being the Connect button
pub const CONNECT_EXCLUSION_TEXTS: &[&str] = &["message", "pending", "follow", "connected"];

/// The overflow menu trigger on a profile header
pub const MORE_BUTTON_LABELS: &[&str] = &["more", "more actions"];

/// Menu item containers inside the opened overflow menu
pub const OVERFLOW_ITEM_SELECTORS: &[&str] = &[
    "div[role='menuitem']",
    ".artdeco-dropdown__item",
    "li.artdeco-dropdown__item",
];

/// Indicators that an invite is already pending
pub const PENDING_LABELS: &[&str] = &["pending", "invitation sent"];

/// Indicators that the profile is already a connection
pub const CONNECTED_LABELS: &[&str] = &["remove connection", "remove your connection"];

/// Message button discovery order: aria-label, data attribute, text
pub const MESSAGE_BUTTON_ARIA_SELECTORS: &[&str] = &[
    "button[aria-label*='Message']",
    "a[aria-label*='Message']",
];
pub const MESSAGE_BUTTON_DATA_SELECTORS: &[&str] = &[
    "button[data-control-name='message']",
    "a[data-control-name='message']",
];
pub const MESSAGE_BUTTON_TEXTS: &[&str] = &["message", "send message"];
pub const MESSAGE_BUTTON_EXCLUSION_TEXTS: &[&str] = &["messaging", "message sent"];

/// Compose dialog roots for the message flow
pub const COMPOSE_DIALOG_SELECTORS: &[&str] = &[
    "div[role='dialog']",
    ".msg-overlay-conversation-bubble--is-active",
    ".msg-overlay-conversation-bubble-header",
    ".msg-form",
];

/// The editable message body
pub const COMPOSE_INPUT_SELECTORS: &[&str] = &[
    ".msg-form__contenteditable",
    "div[contenteditable='true'][role='textbox']",
    "div[contenteditable='true']",
];

/// Send button discovery order for the compose dialog
pub const SEND_BUTTON_SELECTORS: &[&str] = &[
    "button.msg-form__send-button",
    "button[type='submit']",
    "button[aria-label*='Send']",
];
pub const SEND_BUTTON_TEXTS: &[&str] = &["send"];

/// Whether a final URL is still on an authenticated surface
pub fn is_authenticated_url(url: &str) -> bool {
    !is_login_url(url)
        && AUTHENTICATED_URL_MARKERS
            .iter()
            .any(|marker| url.contains(marker))
}

/// Whether a final URL bounced to login/checkpoint
pub fn is_login_url(url: &str) -> bool {
    LOGIN_URL_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Whether button text qualifies as the Connect action
pub fn is_connect_text(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    lowered.contains("connect")
        && !CONNECT_EXCLUSION_TEXTS
            .iter()
            .any(|excluded| lowered.contains(excluded))
}

/// Whether an aria-label identifies an invite action
pub fn is_invite_aria_label(label: &str) -> bool {
    let lowered = label.to_lowercase();
    lowered.contains("invite") && lowered.contains("connect")
}

/// Whether button/label text marks a pending invitation
pub fn is_pending_text(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    PENDING_LABELS.iter().any(|label| lowered.contains(label))
}

/// Whether text marks an existing connection
pub fn is_connected_text(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    CONNECTED_LABELS.iter().any(|label| lowered.contains(label))
}

/// Whether text qualifies as the Message action
pub fn is_message_text(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    MESSAGE_BUTTON_TEXTS.iter().any(|t| lowered == *t)
        && !MESSAGE_BUTTON_EXCLUSION_TEXTS
            .iter()
            .any(|excluded| lowered.contains(excluded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_classification() {
        assert!(is_login_url("https://www.linkedin.com/login"));
        assert!(is_login_url("https://www.linkedin.com/checkpoint/challenge/x"));
        assert!(is_login_url("https://www.linkedin.com/authwall?x=1"));
        assert!(!is_login_url("https://www.linkedin.com/feed/"));
    }

    #[test]
    fn test_authenticated_url_classification() {
        assert!(is_authenticated_url("https://www.linkedin.com/feed/"));
        assert!(is_authenticated_url("https://www.linkedin.com/in/jane-doe/"));
        assert!(is_authenticated_url("https://www.linkedin.com/mynetwork/"));
        assert!(is_authenticated_url("https://www.linkedin.com/messaging/thread/1/"));
        // A checkpoint redirect is not authenticated even with /uas/login-submit
        assert!(!is_authenticated_url("https://www.linkedin.com/uas/login"));
        assert!(!is_authenticated_url("https://www.linkedin.com/legal/privacy"));
    }

    #[test]
    fn test_connect_text_accepts_plain_connect() {
        assert!(is_connect_text("Connect"));
        assert!(is_connect_text("  connect "));
    }

    #[test]
    fn test_connect_text_rejects_lookalikes() {
        assert!(!is_connect_text("Message"));
        assert!(!is_connect_text("Pending"));
        assert!(!is_connect_text("Following"));
        assert!(!is_connect_text("Connected"));
        assert!(!is_connect_text("Connected 2 years ago"));
    }

    #[test]
    fn test_invite_aria_label() {
        assert!(is_invite_aria_label("Invite Jane Doe to connect"));
        assert!(!is_invite_aria_label("Connect with premium"));
        assert!(!is_invite_aria_label("Invite to event"));
    }

    #[test]
    fn test_pending_and_connected_markers() {
        assert!(is_pending_text("Pending"));
        assert!(is_pending_text("Invitation sent"));
        assert!(!is_pending_text("Connect"));

        assert!(is_connected_text("Remove Connection"));
        assert!(!is_connected_text("Connect"));
    }

    #[test]
    fn test_message_text_exclusions() {
        assert!(is_message_text("Message"));
        assert!(is_message_text("Send message"));
        assert!(!is_message_text("Messaging"));
        assert!(!is_message_text("Message sent"));
    }
}
