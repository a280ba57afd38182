use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity;
use crate::error::AccountResult;
use crate::models::{LimitKind, LinkedInAccount};
use crate::repository::AccountRepository;

pub struct PgAccountRepository {
    db: DatabaseConnection,
}

impl PgAccountRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn counter_column(kind: LimitKind) -> entity::Column {
        match kind {
            LimitKind::Invite => entity::Column::DailyInvitesSent,
            LimitKind::ConnectionCheck => entity::Column::DailyConnectionChecks,
            LimitKind::Message => entity::Column::DailyMessagesSent,
        }
    }

    fn reset_column(kind: LimitKind) -> entity::Column {
        match kind {
            LimitKind::Invite => entity::Column::InvitesResetAt,
            LimitKind::ConnectionCheck => entity::Column::ChecksResetAt,
            LimitKind::Message => entity::Column::MessagesResetAt,
        }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn get_by_id(&self, id: Uuid) -> AccountResult<Option<LinkedInAccount>> {
        let model = entity::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn active_for_user(&self, user_id: Uuid) -> AccountResult<Option<LinkedInAccount>> {
        let model = entity::Entity::find()
            .filter(entity::Column::UserId.eq(user_id))
            .filter(entity::Column::IsActive.eq(true))
            .one(&self.db)
            .await?;
        Ok(model.map(Into::into))
    }

    async fn increment_counter(&self, id: Uuid, kind: LimitKind, n: i32) -> AccountResult<()> {
        let column = Self::counter_column(kind);

        // Single-statement add, not read-then-write: workers race on this row
        entity::Entity::update_many()
            .col_expr(column, Expr::col(column).add(n))
            .col_expr(entity::Column::LastUsed, Expr::value(Utc::now()))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        tracing::debug!(account_id = %id, kind = %kind, n = n, "Incremented daily counter");
        Ok(())
    }

    async fn reset_counter(
        &self,
        id: Uuid,
        kind: LimitKind,
        at: DateTime<Utc>,
    ) -> AccountResult<()> {
        entity::Entity::update_many()
            .col_expr(Self::counter_column(kind), Expr::value(0))
            .col_expr(Self::reset_column(kind), Expr::value(at))
            .filter(entity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        tracing::info!(account_id = %id, kind = %kind, "Reset daily counter");
        Ok(())
    }
}
