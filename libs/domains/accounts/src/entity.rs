use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sea-ORM entity for the linkedin_accounts table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "linkedin_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub user_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub user_agent: Option<String>,
    pub cookies: Json,
    pub local_storage: Json,
    pub session_storage: Json,
    pub is_active: bool,
    pub daily_invites_sent: i32,
    pub daily_connection_checks: i32,
    pub daily_messages_sent: i32,
    pub invites_reset_at: DateTimeWithTimeZone,
    pub checks_reset_at: DateTimeWithTimeZone,
    pub messages_reset_at: DateTimeWithTimeZone,
    pub invite_limit: Option<i32>,
    pub connection_check_limit: Option<i32>,
    pub message_limit: Option<i32>,
    pub last_used: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::LinkedInAccount {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            email: model.email,
            user_name: model.user_name,
            profile_image_url: model.profile_image_url,
            user_agent: model.user_agent,
            cookies: model.cookies,
            local_storage: model.local_storage,
            session_storage: model.session_storage,
            is_active: model.is_active,
            daily_invites_sent: model.daily_invites_sent,
            daily_connection_checks: model.daily_connection_checks,
            daily_messages_sent: model.daily_messages_sent,
            invites_reset_at: model.invites_reset_at.into(),
            checks_reset_at: model.checks_reset_at.into(),
            messages_reset_at: model.messages_reset_at.into(),
            invite_limit: model.invite_limit,
            connection_check_limit: model.connection_check_limit,
            message_limit: model.message_limit,
            last_used: model.last_used.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}
