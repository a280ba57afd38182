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
                    .as_enum(MessageStatus::Enum)
                    .values([
                        MessageStatus::Draft,
                        MessageStatus::Sent,
                        MessageStatus::Scheduled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Messages::Table)
                    .if_not_exists()
                    .col(pk_uuid(Messages::Id))
                    .col(uuid(Messages::UserId))
                    .col(uuid(Messages::LeadId))
                    .col(uuid(Messages::CampaignId))
                    .col(text(Messages::Content))
                    .col(string(Messages::ModelId))
                    .col(text_null(Messages::Prompt))
                    .col(
                        ColumnDef::new(Messages::Status)
                            .enumeration(
                                MessageStatus::Enum,
                                [
                                    MessageStatus::Draft,
                                    MessageStatus::Sent,
                                    MessageStatus::Scheduled,
                                ],
                            )
                            .not_null()
                            .default("draft"),
                    )
                    .col(timestamp_with_time_zone_null(Messages::SentAt))
                    .col(
                        timestamp_with_time_zone(Messages::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Messages::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_user_id")
                            .from(Messages::Table, Messages::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_lead_id")
                            .from(Messages::Table, Messages::LeadId)
                            .to(Leads::Table, Leads::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_campaign_id")
                            .from(Messages::Table, Messages::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_messages_lead_id")
                    .table(Messages::Table)
                    .col(Messages::LeadId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_messages_status")
                    .table(Messages::Table)
                    .col(Messages::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER messages_touch_updated_at
                    BEFORE UPDATE ON messages
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
            .execute_unprepared("DROP TRIGGER IF EXISTS messages_touch_updated_at ON messages")
            .await?;

        manager
            .drop_table(Table::drop().table(Messages::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(MessageStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Messages {
    Table,
    Id,
    UserId,
    LeadId,
    CampaignId,
    Content,
    ModelId,
    Prompt,
    Status,
    SentAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Leads {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum MessageStatus {
    #[sea_orm(iden = "message_status")]
    Enum,
    #[sea_orm(iden = "draft")]
    Draft,
    #[sea_orm(iden = "sent")]
    Sent,
    #[sea_orm(iden = "scheduled")]
    Scheduled,
}
