use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Scraping status is used by the external UI, not the invite path
        manager
            .create_type(
                Type::create()
                    .as_enum(LeadStatus::Enum)
                    .values([
                        LeadStatus::Pending,
                        LeadStatus::Processing,
                        LeadStatus::Completed,
                        LeadStatus::Error,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(InviteStatus::Enum)
                    .values([
                        InviteStatus::Pending,
                        InviteStatus::Sent,
                        InviteStatus::Accepted,
                        InviteStatus::Rejected,
                        InviteStatus::Failed,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Leads::Table)
                    .if_not_exists()
                    .col(pk_uuid(Leads::Id))
                    .col(uuid(Leads::UserId))
                    .col(uuid(Leads::CampaignId))
                    .col(string(Leads::Url))
                    .col(string_null(Leads::Name))
                    .col(string_null(Leads::Title))
                    .col(string_null(Leads::Company))
                    .col(string_null(Leads::Location))
                    .col(string_null(Leads::ProfilePicture))
                    .col(
                        ColumnDef::new(Leads::Status)
                            .enumeration(
                                LeadStatus::Enum,
                                [
                                    LeadStatus::Pending,
                                    LeadStatus::Processing,
                                    LeadStatus::Completed,
                                    LeadStatus::Error,
                                ],
                            )
                            .not_null()
                            .default("pending"),
                    )
                    .col(boolean(Leads::InviteSent).default(false))
                    .col(
                        ColumnDef::new(Leads::InviteStatus)
                            .enumeration(
                                InviteStatus::Enum,
                                [
                                    InviteStatus::Pending,
                                    InviteStatus::Sent,
                                    InviteStatus::Accepted,
                                    InviteStatus::Rejected,
                                    InviteStatus::Failed,
                                ],
                            )
                            .not_null()
                            .default("pending"),
                    )
                    .col(timestamp_with_time_zone_null(Leads::InviteSentAt))
                    .col(timestamp_with_time_zone_null(Leads::InviteAcceptedAt))
                    .col(integer(Leads::InviteRetryCount).default(0))
                    .col(timestamp_with_time_zone_null(Leads::LastConnectionCheckAt))
                    .col(boolean(Leads::MessageSent).default(false))
                    .col(timestamp_with_time_zone_null(Leads::MessageSentAt))
                    .col(text_null(Leads::MessageError))
                    .col(
                        timestamp_with_time_zone(Leads::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Leads::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leads_user_id")
                            .from(Leads::Table, Leads::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_leads_campaign_id")
                            .from(Leads::Table, Leads::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Same url may recur across campaigns of one user; unique only
        // within a campaign
        manager
            .create_index(
                Index::create()
                    .name("idx_leads_campaign_url")
                    .table(Leads::Table)
                    .col(Leads::CampaignId)
                    .col(Leads::Url)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leads_campaign_id")
                    .table(Leads::Table)
                    .col(Leads::CampaignId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leads_url")
                    .table(Leads::Table)
                    .col(Leads::Url)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_leads_invite_status")
                    .table(Leads::Table)
                    .col(Leads::InviteStatus)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER leads_touch_updated_at
                    BEFORE UPDATE ON leads
                    FOR EACH ROW
                    EXECUTE FUNCTION util.touch_updated_at()
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS leads_touch_updated_at ON leads")
            .await?;

        manager
            .drop_table(Table::drop().table(Leads::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(InviteStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(LeadStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Leads {
    Table,
    Id,
    UserId,
    CampaignId,
    Url,
    Name,
    Title,
    Company,
    Location,
    ProfilePicture,
    Status,
    InviteSent,
    InviteStatus,
    InviteSentAt,
    InviteAcceptedAt,
    InviteRetryCount,
    LastConnectionCheckAt,
    MessageSent,
    MessageSentAt,
    MessageError,
    CreatedAt,
    UpdatedAt,
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
enum LeadStatus {
    #[sea_orm(iden = "lead_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "processing")]
    Processing,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "error")]
    Error,
}

#[derive(DeriveIden)]
enum InviteStatus {
    #[sea_orm(iden = "invite_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "sent")]
    Sent,
    #[sea_orm(iden = "accepted")]
    Accepted,
    #[sea_orm(iden = "rejected")]
    Rejected,
    #[sea_orm(iden = "failed")]
    Failed,
}
