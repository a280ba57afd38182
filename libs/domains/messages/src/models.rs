use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Message lifecycle: drafts transition to sent only after a confirmed
/// delivery
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "message_status")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "sent")]
    Sent,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
}

/// A generated outreach message tied to one lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lead_id: Uuid,
    pub campaign_id: Uuid,
    pub content: String,
    pub model_id: String,
    pub prompt: Option<String>,
    pub status: MessageStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn is_draft(&self) -> bool {
        self.status == MessageStatus::Draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_status_serde() {
        assert_eq!(
            serde_json::to_string(&MessageStatus::Scheduled).unwrap(),
            "\"scheduled\""
        );
        assert_eq!("sent".parse::<MessageStatus>().unwrap(), MessageStatus::Sent);
    }
}
