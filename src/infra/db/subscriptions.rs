use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{RepoError, SubscriptionsRepo, UpsertSubscriptionParams},
    domain::users::SubscriptionRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, customer_id, subscription_id, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    customer_id: String,
    subscription_id: Option<String>,
    status: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<SubscriptionRow> for SubscriptionRecord {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            customer_id: row.customer_id,
            subscription_id: row.subscription_id,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SubscriptionsRepo for PostgresRepositories {
    async fn upsert_subscription(
        &self,
        params: UpsertSubscriptionParams,
    ) -> Result<SubscriptionRecord, RepoError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "INSERT INTO subscriptions (id, user_id, customer_id, subscription_id, status) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (customer_id) DO UPDATE \
             SET subscription_id = EXCLUDED.subscription_id, \
                 status = EXCLUDED.status, \
                 updated_at = now() \
             RETURNING {SUBSCRIPTION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(params.user_id)
        .bind(params.customer_id)
        .bind(params.subscription_id)
        .bind(params.status)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(SubscriptionRecord::from(row))
    }

    async fn find_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, RepoError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE customer_id = $1"
        ))
        .bind(customer_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SubscriptionRecord::from))
    }

    async fn set_status(&self, customer_id: &str, status: &str) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = $2, updated_at = now() WHERE customer_id = $1",
        )
        .bind(customer_id)
        .bind(status)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
