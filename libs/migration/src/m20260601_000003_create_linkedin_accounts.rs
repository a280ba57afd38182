use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LinkedinAccounts::Table)
                    .if_not_exists()
                    .col(pk_uuid(LinkedinAccounts::Id))
                    .col(uuid(LinkedinAccounts::UserId))
                    .col(string(LinkedinAccounts::Email))
                    .col(string_null(LinkedinAccounts::UserName))
                    .col(string_null(LinkedinAccounts::ProfileImageUrl))
                    .col(string_null(LinkedinAccounts::UserAgent))
                    .col(json_binary(LinkedinAccounts::Cookies).default("[]"))
                    .col(json_binary(LinkedinAccounts::LocalStorage).default("{}"))
                    .col(json_binary(LinkedinAccounts::SessionStorage).default("{}"))
                    .col(boolean(LinkedinAccounts::IsActive).default(false))
                    .col(integer(LinkedinAccounts::DailyInvitesSent).default(0))
                    .col(integer(LinkedinAccounts::DailyConnectionChecks).default(0))
                    .col(integer(LinkedinAccounts::DailyMessagesSent).default(0))
                    .col(
                        timestamp_with_time_zone(LinkedinAccounts::InvitesResetAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(LinkedinAccounts::ChecksResetAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(LinkedinAccounts::MessagesResetAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(integer_null(LinkedinAccounts::InviteLimit))
                    .col(integer_null(LinkedinAccounts::ConnectionCheckLimit))
                    .col(integer_null(LinkedinAccounts::MessageLimit))
                    .col(timestamp_with_time_zone_null(LinkedinAccounts::LastUsed))
                    .col(
                        timestamp_with_time_zone(LinkedinAccounts::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(LinkedinAccounts::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_linkedin_accounts_user_id")
                            .from(LinkedinAccounts::Table, LinkedinAccounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_linkedin_accounts_user_id")
                    .table(LinkedinAccounts::Table)
                    .col(LinkedinAccounts::UserId)
                    .to_owned(),
            )
            .await?;

        // At most one active account per user
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX idx_linkedin_accounts_one_active
                    ON linkedin_accounts (user_id)
                    WHERE is_active
                "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER linkedin_accounts_touch_updated_at
                    BEFORE UPDATE ON linkedin_accounts
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
            .execute_unprepared(
                "DROP TRIGGER IF EXISTS linkedin_accounts_touch_updated_at ON linkedin_accounts",
            )
            .await?;

        manager
            .drop_table(Table::drop().table(LinkedinAccounts::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum LinkedinAccounts {
    Table,
    Id,
    UserId,
    Email,
    UserName,
    ProfileImageUrl,
    UserAgent,
    Cookies,
    LocalStorage,
    SessionStorage,
    IsActive,
    DailyInvitesSent,
    DailyConnectionChecks,
    DailyMessagesSent,
    InvitesResetAt,
    ChecksResetAt,
    MessagesResetAt,
    InviteLimit,
    ConnectionCheckLimit,
    MessageLimit,
    LastUsed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
