use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(JobStatus::Enum)
                    .values([
                        JobStatus::Queued,
                        JobStatus::Processing,
                        JobStatus::Paused,
                        JobStatus::Cancelled,
                        JobStatus::Completed,
                        JobStatus::Failed,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WorkflowJobs::Table)
                    .if_not_exists()
                    .col(pk_uuid(WorkflowJobs::Id))
                    .col(uuid(WorkflowJobs::UserId))
                    .col(uuid(WorkflowJobs::CampaignId))
                    .col(uuid(WorkflowJobs::LinkedinAccountId))
                    .col(text_null(WorkflowJobs::CustomMessage))
                    .col(
                        ColumnDef::new(WorkflowJobs::Status)
                            .enumeration(
                                JobStatus::Enum,
                                [
                                    JobStatus::Queued,
                                    JobStatus::Processing,
                                    JobStatus::Paused,
                                    JobStatus::Cancelled,
                                    JobStatus::Completed,
                                    JobStatus::Failed,
                                ],
                            )
                            .not_null()
                            .default("queued"),
                    )
                    .col(integer(WorkflowJobs::TotalLeads).default(0))
                    .col(integer(WorkflowJobs::ProcessedLeads).default(0))
                    .col(integer(WorkflowJobs::Progress).default(0))
                    .col(json_binary_null(WorkflowJobs::Results))
                    .col(text_null(WorkflowJobs::ErrorMessage))
                    .col(
                        timestamp_with_time_zone(WorkflowJobs::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(WorkflowJobs::StartedAt))
                    .col(timestamp_with_time_zone_null(WorkflowJobs::CompletedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_jobs_user_id")
                            .from(WorkflowJobs::Table, WorkflowJobs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_jobs_campaign_id")
                            .from(WorkflowJobs::Table, WorkflowJobs::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_workflow_jobs_linkedin_account_id")
                            .from(WorkflowJobs::Table, WorkflowJobs::LinkedinAccountId)
                            .to(LinkedinAccounts::Table, LinkedinAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workflow_jobs_campaign_id")
                    .table(WorkflowJobs::Table)
                    .col(WorkflowJobs::CampaignId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_workflow_jobs_status")
                    .table(WorkflowJobs::Table)
                    .col(WorkflowJobs::Status)
                    .to_owned(),
            )
            .await?;

        // Only one job per (user, campaign) may be processing at a time
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX idx_workflow_jobs_one_processing
                    ON workflow_jobs (user_id, campaign_id)
                    WHERE status = 'processing'
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WorkflowJobs::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(JobStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum WorkflowJobs {
    Table,
    Id,
    UserId,
    CampaignId,
    LinkedinAccountId,
    CustomMessage,
    Status,
    TotalLeads,
    ProcessedLeads,
    Progress,
    Results,
    ErrorMessage,
    CreatedAt,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum LinkedinAccounts {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum JobStatus {
    #[sea_orm(iden = "job_status")]
    Enum,
    #[sea_orm(iden = "queued")]
    Queued,
    #[sea_orm(iden = "processing")]
    Processing,
    #[sea_orm(iden = "paused")]
    Paused,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "failed")]
    Failed,
}
