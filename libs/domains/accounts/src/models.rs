use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::{AccountError, AccountResult};

/// Fallback limits when the account row carries no override
pub const DEFAULT_INVITE_LIMIT: i32 = 30;
pub const DEFAULT_CONNECTION_CHECK_LIMIT: i32 = 3;
pub const DEFAULT_MESSAGE_LIMIT: i32 = 10;

/// The three independently-metered daily quotas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LimitKind {
    Invite,
    ConnectionCheck,
    Message,
}

/// Result of a quota check
#[derive(Debug, Clone, Serialize)]
pub struct LimitStatus {
    pub can_proceed: bool,
    pub remaining: i32,
    pub limit: i32,
    pub used: i32,
    /// When the 24-hour window rolls over
    pub resets_at: DateTime<Utc>,
}

impl LimitStatus {
    /// Hours until the counter resets, rounded up, never negative
    pub fn hours_until_reset(&self, now: DateTime<Utc>) -> i64 {
        let minutes = (self.resets_at - now).num_minutes().max(0);
        (minutes + 59) / 60
    }
}

/// A browser cookie as persisted in the session bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// Unix timestamp in seconds; None for session cookies
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

/// The persisted cookie + storage snapshot that lets the browser resume
/// an authenticated LinkedIn session without re-login
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBundle {
    #[serde(default)]
    pub cookies: Vec<SessionCookie>,
    #[serde(default)]
    pub local_storage: HashMap<String, String>,
    #[serde(default)]
    pub session_storage: HashMap<String, String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl SessionBundle {
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// A linked LinkedIn account with its session and daily counters
#[derive(Debug, Clone)]
pub struct LinkedInAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub user_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub user_agent: Option<String>,
    pub cookies: serde_json::Value,
    pub local_storage: serde_json::Value,
    pub session_storage: serde_json::Value,
    pub is_active: bool,
    pub daily_invites_sent: i32,
    pub daily_connection_checks: i32,
    pub daily_messages_sent: i32,
    pub invites_reset_at: DateTime<Utc>,
    pub checks_reset_at: DateTime<Utc>,
    pub messages_reset_at: DateTime<Utc>,
    pub invite_limit: Option<i32>,
    pub connection_check_limit: Option<i32>,
    pub message_limit: Option<i32>,
    pub last_used: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkedInAccount {
    /// Deserialize the stored session columns into a bundle
    pub fn session_bundle(&self) -> AccountResult<SessionBundle> {
        let cookies: Vec<SessionCookie> = serde_json::from_value(self.cookies.clone())
            .map_err(|e| AccountError::Session(format!("invalid cookie payload: {}", e)))?;
        let local_storage: HashMap<String, String> =
            serde_json::from_value(self.local_storage.clone())
                .map_err(|e| AccountError::Session(format!("invalid localStorage payload: {}", e)))?;
        let session_storage: HashMap<String, String> =
            serde_json::from_value(self.session_storage.clone()).map_err(|e| {
                AccountError::Session(format!("invalid sessionStorage payload: {}", e))
            })?;

        Ok(SessionBundle {
            cookies,
            local_storage,
            session_storage,
            user_agent: self.user_agent.clone(),
        })
    }

    /// Effective limit for a quota kind, falling back to the defaults
    pub fn limit_for(&self, kind: LimitKind) -> i32 {
        match kind {
            LimitKind::Invite => self.invite_limit.unwrap_or(DEFAULT_INVITE_LIMIT),
            LimitKind::ConnectionCheck => self
                .connection_check_limit
                .unwrap_or(DEFAULT_CONNECTION_CHECK_LIMIT),
            LimitKind::Message => self.message_limit.unwrap_or(DEFAULT_MESSAGE_LIMIT),
        }
    }

    /// Counter value for a quota kind
    pub fn used_for(&self, kind: LimitKind) -> i32 {
        match kind {
            LimitKind::Invite => self.daily_invites_sent,
            LimitKind::ConnectionCheck => self.daily_connection_checks,
            LimitKind::Message => self.daily_messages_sent,
        }
    }

    /// Last reset stamp for a quota kind
    pub fn reset_at_for(&self, kind: LimitKind) -> DateTime<Utc> {
        match kind {
            LimitKind::Invite => self.invites_reset_at,
            LimitKind::ConnectionCheck => self.checks_reset_at,
            LimitKind::Message => self.messages_reset_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn account() -> LinkedInAccount {
        let now = Utc::now();
        LinkedInAccount {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            user_name: None,
            profile_image_url: None,
            user_agent: Some("Mozilla/5.0".to_string()),
            cookies: json!([{"name": "li_at", "value": "tok", "domain": ".linkedin.com"}]),
            local_storage: json!({"k": "v"}),
            session_storage: json!({}),
            is_active: true,
            daily_invites_sent: 5,
            daily_connection_checks: 1,
            daily_messages_sent: 0,
            invites_reset_at: now,
            checks_reset_at: now,
            messages_reset_at: now,
            invite_limit: None,
            connection_check_limit: Some(7),
            message_limit: None,
            last_used: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_session_bundle_round_trip() {
        let bundle = account().session_bundle().unwrap();
        assert_eq!(bundle.cookies.len(), 1);
        assert_eq!(bundle.cookies[0].name, "li_at");
        assert_eq!(bundle.cookies[0].domain.as_deref(), Some(".linkedin.com"));
        assert_eq!(bundle.local_storage.get("k").map(String::as_str), Some("v"));
        assert_eq!(bundle.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert!(!bundle.is_empty());
    }

    #[test]
    fn test_session_bundle_rejects_malformed_cookies() {
        let mut acct = account();
        acct.cookies = json!({"not": "an array"});
        assert!(acct.session_bundle().is_err());
    }

    #[test]
    fn test_limit_fallbacks() {
        let acct = account();
        assert_eq!(acct.limit_for(LimitKind::Invite), DEFAULT_INVITE_LIMIT);
        assert_eq!(acct.limit_for(LimitKind::ConnectionCheck), 7);
        assert_eq!(acct.limit_for(LimitKind::Message), DEFAULT_MESSAGE_LIMIT);
    }

    #[test]
    fn test_used_for_tracks_each_kind() {
        let acct = account();
        assert_eq!(acct.used_for(LimitKind::Invite), 5);
        assert_eq!(acct.used_for(LimitKind::ConnectionCheck), 1);
        assert_eq!(acct.used_for(LimitKind::Message), 0);
    }

    #[test]
    fn test_limit_kind_string_forms() {
        assert_eq!(LimitKind::ConnectionCheck.to_string(), "connection_check");
        assert_eq!("invite".parse::<LimitKind>().unwrap(), LimitKind::Invite);
    }

    #[test]
    fn test_hours_until_reset_rounds_up() {
        let now = Utc::now();
        let status = LimitStatus {
            can_proceed: false,
            remaining: 0,
            limit: 30,
            used: 30,
            resets_at: now + Duration::minutes(90),
        };
        assert_eq!(status.hours_until_reset(now), 2);
    }

    #[test]
    fn test_hours_until_reset_never_negative() {
        let now = Utc::now();
        let status = LimitStatus {
            can_proceed: true,
            remaining: 30,
            limit: 30,
            used: 0,
            resets_at: now - Duration::hours(1),
        };
        assert_eq!(status.hours_until_reset(now), 0);
    }
}
