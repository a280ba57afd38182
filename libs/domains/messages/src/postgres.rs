use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entity;
use crate::error::MessageResult;
use crate::models::{Message, MessageStatus};
use crate::repository::MessageRepository;

pub struct PgMessageRepository {
    db: DatabaseConnection,
}

impl PgMessageRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn draft_for_lead(&self, lead_id: Uuid) -> MessageResult<Option<Message>> {
        let model = entity::Entity::find()
            .filter(entity::Column::LeadId.eq(lead_id))
            .filter(entity::Column::Status.eq(MessageStatus::Draft))
            .order_by_desc(entity::Column::CreatedAt)
            .one(&self.db)
            .await?;

        Ok(model.map(Into::into))
    }

    async fn mark_sent(&self, message_id: Uuid, sent_at: DateTime<Utc>) -> MessageResult<()> {
        entity::Entity::update_many()
            .col_expr(entity::Column::Status, Expr::value(MessageStatus::Sent))
            .col_expr(entity::Column::SentAt, Expr::value(sent_at))
            .filter(entity::Column::Id.eq(message_id))
            .exec(&self.db)
            .await?;

        tracing::debug!(message_id = %message_id, "Marked message sent");
        Ok(())
    }
}
