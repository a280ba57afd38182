use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entity::{campaign, lead};
use crate::error::LeadResult;
use crate::models::{InviteStatus, Lead};
use crate::repository::LeadRepository;

pub struct PgLeadRepository {
    db: DatabaseConnection,
}

impl PgLeadRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LeadRepository for PgLeadRepository {
    async fn leads_for_campaign(&self, campaign_id: Uuid) -> LeadResult<Vec<Lead>> {
        let models = lead::Entity::find()
            .filter(lead::Column::CampaignId.eq(campaign_id))
            .order_by_asc(lead::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn campaign_owned_by(&self, campaign_id: Uuid, user_id: Uuid) -> LeadResult<bool> {
        let found = campaign::Entity::find()
            .filter(campaign::Column::Id.eq(campaign_id))
            .filter(campaign::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        Ok(found.is_some())
    }

    async fn update_invite_status(
        &self,
        campaign_id: Uuid,
        lead_id: Uuid,
        status: InviteStatus,
        invite_sent: bool,
        sent_at: DateTime<Utc>,
    ) -> LeadResult<()> {
        lead::Entity::update_many()
            .col_expr(lead::Column::InviteSent, Expr::value(invite_sent))
            .col_expr(lead::Column::InviteStatus, Expr::value(status))
            .col_expr(lead::Column::InviteSentAt, Expr::value(sent_at))
            .filter(lead::Column::CampaignId.eq(campaign_id))
            .filter(lead::Column::Id.eq(lead_id))
            .exec(&self.db)
            .await?;

        tracing::debug!(lead_id = %lead_id, status = %status, "Updated lead invite status");
        Ok(())
    }

    async fn update_invite_status_by_url(
        &self,
        url: &str,
        status: InviteStatus,
        invite_sent: bool,
    ) -> LeadResult<u64> {
        let result = lead::Entity::update_many()
            .col_expr(lead::Column::InviteSent, Expr::value(invite_sent))
            .col_expr(lead::Column::InviteStatus, Expr::value(status))
            .filter(lead::Column::Url.eq(url))
            .exec(&self.db)
            .await?;

        tracing::info!(
            url = %url,
            status = %status,
            rows = result.rows_affected,
            "Fanned out invite status by URL"
        );
        Ok(result.rows_affected)
    }

    async fn mark_accepted_by_url(&self, url: &str, accepted_at: DateTime<Utc>) -> LeadResult<u64> {
        let result = lead::Entity::update_many()
            .col_expr(lead::Column::InviteSent, Expr::value(true))
            .col_expr(
                lead::Column::InviteStatus,
                Expr::value(InviteStatus::Accepted),
            )
            .col_expr(lead::Column::InviteAcceptedAt, Expr::value(accepted_at))
            .filter(lead::Column::Url.eq(url))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    async fn mark_message_sent_by_url(&self, url: &str, sent_at: DateTime<Utc>) -> LeadResult<u64> {
        let result = lead::Entity::update_many()
            .col_expr(lead::Column::MessageSent, Expr::value(true))
            .col_expr(lead::Column::MessageSentAt, Expr::value(sent_at))
            .col_expr(
                lead::Column::MessageError,
                Expr::value(Option::<String>::None),
            )
            .filter(lead::Column::Url.eq(url))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    async fn mark_message_error_by_url(&self, url: &str, error: &str) -> LeadResult<u64> {
        let result = lead::Entity::update_many()
            .col_expr(lead::Column::MessageSent, Expr::value(false))
            .col_expr(lead::Column::MessageError, Expr::value(error))
            .filter(lead::Column::Url.eq(url))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    async fn sent_leads_for_user(&self, user_id: Uuid) -> LeadResult<Vec<Lead>> {
        let models = lead::Entity::find()
            .filter(lead::Column::UserId.eq(user_id))
            .filter(lead::Column::InviteStatus.eq(InviteStatus::Sent))
            .order_by_asc(lead::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn touch_connection_check(
        &self,
        lead_ids: Vec<Uuid>,
        at: DateTime<Utc>,
    ) -> LeadResult<()> {
        if lead_ids.is_empty() {
            return Ok(());
        }

        lead::Entity::update_many()
            .col_expr(lead::Column::LastConnectionCheckAt, Expr::value(at))
            .filter(lead::Column::Id.is_in(lead_ids))
            .exec(&self.db)
            .await?;

        Ok(())
    }
}
