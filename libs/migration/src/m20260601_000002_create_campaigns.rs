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
                    .as_enum(CampaignStatus::Enum)
                    .values([CampaignStatus::Draft, CampaignStatus::Active])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(pk_uuid(Campaigns::Id))
                    .col(uuid(Campaigns::UserId))
                    .col(string(Campaigns::Name))
                    .col(text_null(Campaigns::Description))
                    .col(
                        ColumnDef::new(Campaigns::Status)
                            .enumeration(
                                CampaignStatus::Enum,
                                [CampaignStatus::Draft, CampaignStatus::Active],
                            )
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        timestamp_with_time_zone(Campaigns::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Campaigns::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaigns_user_id")
                            .from(Campaigns::Table, Campaigns::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_campaigns_user_id")
                    .table(Campaigns::Table)
                    .col(Campaigns::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER campaigns_touch_updated_at
                    BEFORE UPDATE ON campaigns
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
            .execute_unprepared("DROP TRIGGER IF EXISTS campaigns_touch_updated_at ON campaigns")
            .await?;

        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(CampaignStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    UserId,
    Name,
    Description,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum CampaignStatus {
    #[sea_orm(iden = "campaign_status")]
    Enum,
    #[sea_orm(iden = "draft")]
    Draft,
    #[sea_orm(iden = "active")]
    Active,
}
