use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AccountResult;
use crate::models::{LimitKind, LinkedInAccount};

/// Repository trait for LinkedIn account persistence
///
/// Counter mutations must be single-statement read-modify-writes at the
/// store; callers rely on them being atomic with respect to the row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Load an account by ID
    async fn get_by_id(&self, id: Uuid) -> AccountResult<Option<LinkedInAccount>>;

    /// The user's single active account, if any
    async fn active_for_user(&self, user_id: Uuid) -> AccountResult<Option<LinkedInAccount>>;

    /// Atomically add `n` to the counter of `kind` and touch last_used
    async fn increment_counter(&self, id: Uuid, kind: LimitKind, n: i32) -> AccountResult<()>;

    /// Zero the counter of `kind` and stamp its reset time
    async fn reset_counter(&self, id: Uuid, kind: LimitKind, at: DateTime<Utc>)
    -> AccountResult<()>;
}
