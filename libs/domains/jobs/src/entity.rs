use crate::models::{JobResults, JobStatus, WorkflowJob};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sea-ORM entity for the workflow_jobs table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "workflow_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub campaign_id: Uuid,
    pub linkedin_account_id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub custom_message: Option<String>,
    pub status: JobStatus,
    pub total_leads: i32,
    pub processed_leads: i32,
    pub progress: i32,
    pub results: Option<Json>,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub started_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for WorkflowJob {
    fn from(model: Model) -> Self {
        let results = model.results.and_then(|json| {
            serde_json::from_value::<JobResults>(json.clone())
                .inspect_err(|e| warn!(error = %e, "Discarding unreadable job results payload"))
                .ok()
        });

        Self {
            id: model.id,
            user_id: model.user_id,
            campaign_id: model.campaign_id,
            linkedin_account_id: model.linkedin_account_id,
            custom_message: model.custom_message,
            status: model.status,
            total_leads: model.total_leads,
            processed_leads: model.processed_leads,
            progress: model.progress,
            results,
            error_message: model.error_message,
            created_at: model.created_at.into(),
            started_at: model.started_at.map(Into::into),
            completed_at: model.completed_at.map(Into::into),
        }
    }
}
