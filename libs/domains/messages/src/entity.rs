use crate::models::{Message, MessageStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sea-ORM entity for the messages table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub lead_id: Uuid,
    pub campaign_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub model_id: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub prompt: Option<String>,
    pub status: MessageStatus,
    pub sent_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Message {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            lead_id: model.lead_id,
            campaign_id: model.campaign_id,
            content: model.content,
            model_id: model.model_id,
            prompt: model.prompt,
            status: model.status,
            sent_at: model.sent_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}
