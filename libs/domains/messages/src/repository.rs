use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::MessageResult;
use crate::models::Message;

/// Repository trait for message persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// The draft message for a lead, if one was generated
    async fn draft_for_lead(&self, lead_id: Uuid) -> MessageResult<Option<Message>>;

    /// Flip a message to sent with its delivery timestamp
    async fn mark_sent(&self, message_id: Uuid, sent_at: DateTime<Utc>) -> MessageResult<()>;
}
