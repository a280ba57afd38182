use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entity;
use crate::error::JobResult;
use crate::models::{CreateJob, JobResults, JobStatus, WorkflowJob};
use crate::repository::JobRepository;

pub struct PgJobRepository {
    db: DatabaseConnection,
}

impl PgJobRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create(&self, input: CreateJob) -> JobResult<WorkflowJob> {
        let active = entity::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(input.user_id),
            campaign_id: Set(input.campaign_id),
            linkedin_account_id: Set(input.linkedin_account_id),
            custom_message: Set(input.custom_message),
            status: Set(JobStatus::Queued),
            total_leads: Set(0),
            processed_leads: Set(0),
            progress: Set(0),
            results: Set(None),
            error_message: Set(None),
            created_at: Set(Utc::now().into()),
            started_at: Set(None),
            completed_at: Set(None),
        };

        let model = entity::Entity::insert(active)
            .exec_with_returning(&self.db)
            .await?;

        tracing::info!(job_id = %model.id, campaign_id = %model.campaign_id, "Created workflow job");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> JobResult<Option<WorkflowJob>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn status(&self, id: Uuid) -> JobResult<Option<JobStatus>> {
        let status = entity::Entity::find_by_id(id)
            .select_only()
            .column(entity::Column::Status)
            .into_tuple::<JobStatus>()
            .one(&self.db)
            .await?;

        Ok(status)
    }

    async fn transition_processing(&self, id: Uuid, at: DateTime<Utc>) -> JobResult<()> {
        entity::Entity::update_many()
            .col_expr(entity::Column::Status, Expr::value(JobStatus::Processing))
            .col_expr(entity::Column::StartedAt, Expr::value(at))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn set_total_leads(&self, id: Uuid, total: i32) -> JobResult<()> {
        entity::Entity::update_many()
            .col_expr(entity::Column::TotalLeads, Expr::value(total))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn update_progress(&self, id: Uuid, processed: i32, progress: i32) -> JobResult<()> {
        entity::Entity::update_many()
            .col_expr(entity::Column::ProcessedLeads, Expr::value(processed))
            .col_expr(entity::Column::Progress, Expr::value(progress))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: JobStatus) -> JobResult<()> {
        entity::Entity::update_many()
            .col_expr(entity::Column::Status, Expr::value(status))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        tracing::info!(job_id = %id, status = %status, "Updated job status");
        Ok(())
    }

    async fn finish(
        &self,
        id: Uuid,
        status: JobStatus,
        results: Option<JobResults>,
        error_message: Option<String>,
        at: DateTime<Utc>,
    ) -> JobResult<()> {
        let results_json = match results {
            Some(ref r) => Some(serde_json::to_value(r)?),
            None => None,
        };

        entity::Entity::update_many()
            .col_expr(entity::Column::Status, Expr::value(status))
            .col_expr(entity::Column::Results, Expr::value(results_json))
            .col_expr(entity::Column::ErrorMessage, Expr::value(error_message))
            .col_expr(entity::Column::CompletedAt, Expr::value(at))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        tracing::info!(job_id = %id, status = %status, "Finished workflow job");
        Ok(())
    }
}
