use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AccountError, AccountResult};
use crate::models::{LimitKind, LimitStatus};
use crate::repository::AccountRepository;

/// Per-account daily quota authority
///
/// Counters roll over on a 24-hour sliding window, reset lazily on the
/// next check. `increment` never gates; callers must check first.
pub struct RateLimitManager<R: AccountRepository> {
    repository: Arc<R>,
}

impl<R: AccountRepository> Clone for RateLimitManager<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
        }
    }
}

impl<R: AccountRepository> RateLimitManager<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub fn with_arc(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Check the quota for one kind, applying the lazy 24-hour reset first
    #[instrument(skip(self), fields(account_id = %account_id, kind = %kind))]
    pub async fn check_limit(&self, account_id: Uuid, kind: LimitKind) -> AccountResult<LimitStatus> {
        let account = self
            .repository
            .get_by_id(account_id)
            .await?
            .ok_or(AccountError::NotFound(account_id))?;

        let now = Utc::now();
        let mut used = account.used_for(kind);
        let mut reset_at = account.reset_at_for(kind);

        if now - reset_at >= Duration::hours(24) {
            self.repository.reset_counter(account_id, kind, now).await?;
            used = 0;
            reset_at = now;
            info!(account_id = %account_id, kind = %kind, "Daily counter window rolled over");
        }

        let limit = account.limit_for(kind);
        let remaining = (limit - used).max(0);

        Ok(LimitStatus {
            can_proceed: remaining > 0,
            remaining,
            limit,
            used,
            resets_at: reset_at + Duration::hours(24),
        })
    }

    /// Atomically advance the counter; does not check the limit
    pub async fn increment(&self, account_id: Uuid, kind: LimitKind, n: i32) -> AccountResult<()> {
        self.repository.increment_counter(account_id, kind, n).await
    }

    /// Admin/test operation: zero the counter immediately
    pub async fn reset(&self, account_id: Uuid, kind: LimitKind) -> AccountResult<()> {
        self.repository
            .reset_counter(account_id, kind, Utc::now())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_INVITE_LIMIT, LinkedInAccount};
    use crate::repository::MockAccountRepository;
    use serde_json::json;

    fn account_with(used: i32, reset_hours_ago: i64) -> LinkedInAccount {
        let now = Utc::now();
        LinkedInAccount {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            user_name: None,
            profile_image_url: None,
            user_agent: None,
            cookies: json!([]),
            local_storage: json!({}),
            session_storage: json!({}),
            is_active: true,
            daily_invites_sent: used,
            daily_connection_checks: 0,
            daily_messages_sent: 0,
            invites_reset_at: now - Duration::hours(reset_hours_ago),
            checks_reset_at: now,
            messages_reset_at: now,
            invite_limit: None,
            connection_check_limit: None,
            message_limit: None,
            last_used: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_check_limit_within_window() {
        let account = account_with(12, 2);
        let account_id = account.id;

        let mut repo = MockAccountRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(account.clone())));
        repo.expect_reset_counter().never();

        let manager = RateLimitManager::new(repo);
        let status = manager
            .check_limit(account_id, LimitKind::Invite)
            .await
            .unwrap();

        assert!(status.can_proceed);
        assert_eq!(status.used, 12);
        assert_eq!(status.limit, DEFAULT_INVITE_LIMIT);
        assert_eq!(status.remaining + status.used, status.limit);
    }

    #[tokio::test]
    async fn test_check_limit_resets_stale_window_before_computing() {
        let account = account_with(30, 25);
        let account_id = account.id;

        let mut repo = MockAccountRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(account.clone())));
        repo.expect_reset_counter()
            .withf(move |id, kind, _| *id == account_id && *kind == LimitKind::Invite)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let manager = RateLimitManager::new(repo);
        let status = manager
            .check_limit(account_id, LimitKind::Invite)
            .await
            .unwrap();

        // Exhausted counter became usable again after the rollover
        assert!(status.can_proceed);
        assert_eq!(status.used, 0);
        assert_eq!(status.remaining, DEFAULT_INVITE_LIMIT);
    }

    #[tokio::test]
    async fn test_check_limit_exhausted() {
        let account = account_with(DEFAULT_INVITE_LIMIT, 1);
        let account_id = account.id;

        let mut repo = MockAccountRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(account.clone())));

        let manager = RateLimitManager::new(repo);
        let status = manager
            .check_limit(account_id, LimitKind::Invite)
            .await
            .unwrap();

        assert!(!status.can_proceed);
        assert_eq!(status.remaining, 0);
    }

    #[tokio::test]
    async fn test_check_limit_respects_account_override() {
        let mut account = account_with(3, 1);
        account.invite_limit = Some(5);
        let account_id = account.id;

        let mut repo = MockAccountRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(account.clone())));

        let manager = RateLimitManager::new(repo);
        let status = manager
            .check_limit(account_id, LimitKind::Invite)
            .await
            .unwrap();

        assert_eq!(status.limit, 5);
        assert_eq!(status.remaining, 2);
    }

    #[tokio::test]
    async fn test_check_limit_unknown_account() {
        let mut repo = MockAccountRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));

        let manager = RateLimitManager::new(repo);
        let result = manager
            .check_limit(Uuid::new_v4(), LimitKind::Message)
            .await;

        assert!(matches!(result, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_increment_does_not_gate() {
        let account_id = Uuid::new_v4();

        let mut repo = MockAccountRepository::new();
        repo.expect_get_by_id().never();
        repo.expect_increment_counter()
            .withf(move |id, kind, n| {
                *id == account_id && *kind == LimitKind::Invite && *n == 1
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let manager = RateLimitManager::new(repo);
        manager
            .increment(account_id, LimitKind::Invite, 1)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_store_errors_surface() {
        let mut repo = MockAccountRepository::new();
        repo.expect_get_by_id()
            .returning(|_| Err(AccountError::Database("connection refused".to_string())));

        let manager = RateLimitManager::new(repo);
        let result = manager
            .check_limit(Uuid::new_v4(), LimitKind::Invite)
            .await;

        assert!(matches!(result, Err(AccountError::Database(_))));
    }
}
