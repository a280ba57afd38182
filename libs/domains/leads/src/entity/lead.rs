use crate::models::{InviteStatus, Lead, ScrapeStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sea-ORM entity for the leads table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub campaign_id: Uuid,
    pub url: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
    pub status: ScrapeStatus,
    pub invite_sent: bool,
    pub invite_status: InviteStatus,
    pub invite_sent_at: Option<DateTimeWithTimeZone>,
    pub invite_accepted_at: Option<DateTimeWithTimeZone>,
    pub invite_retry_count: i32,
    pub last_connection_check_at: Option<DateTimeWithTimeZone>,
    pub message_sent: bool,
    pub message_sent_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub message_error: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::campaign::Entity",
        from = "Column::CampaignId",
        to = "super::campaign::Column::Id"
    )]
    Campaign,
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Lead {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            campaign_id: model.campaign_id,
            url: model.url,
            name: model.name,
            title: model.title,
            company: model.company,
            location: model.location,
            profile_picture: model.profile_picture,
            status: model.status,
            invite_sent: model.invite_sent,
            invite_status: model.invite_status,
            invite_sent_at: model.invite_sent_at.map(Into::into),
            invite_accepted_at: model.invite_accepted_at.map(Into::into),
            invite_retry_count: model.invite_retry_count,
            last_connection_check_at: model.last_connection_check_at.map(Into::into),
            message_sent: model.message_sent,
            message_sent_at: model.message_sent_at.map(Into::into),
            message_error: model.message_error,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}
