use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{RepoError, UpdateProfileParams, UsersRepo},
    domain::{types::Credits, users::UserRecord},
};

use super::{PostgresRepositories, map_sqlx_error};

const USER_COLUMNS: &str = "id, email, display_name, phone, company, credits, is_admin, is_banned, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    display_name: Option<String>,
    phone: Option<String>,
    company: Option<String>,
    credits: i64,
    is_admin: bool,
    is_banned: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            phone: row.phone,
            company: row.company,
            credits: Credits(row.credits),
            is_admin: row.is_admin,
            is_banned: row.is_banned,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn ensure_user(
        &self,
        id: Uuid,
        email: &str,
        initial_credits: Credits,
    ) -> Result<UserRecord, RepoError> {
        sqlx::query(
            "INSERT INTO users (id, email, credits) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(id)
        .bind(email)
        .bind(initial_credits.get())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(UserRecord::from(row))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        params: UpdateProfileParams,
    ) -> Result<UserRecord, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users \
             SET display_name = $2, phone = $3, company = $4, updated_at = now() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(params.display_name)
        .bind(params.phone)
        .bind(params.company)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(UserRecord::from).ok_or(RepoError::NotFound)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE users SET is_banned = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(banned)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn set_credits(&self, id: Uuid, credits: Credits) -> Result<(), RepoError> {
        let result =
            sqlx::query("UPDATE users SET credits = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(credits.get())
                .execute(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn decrement_credits(&self, id: Uuid) -> Result<Credits, RepoError> {
        let balance: i64 = sqlx::query_scalar(
            "UPDATE users SET credits = credits - 1, updated_at = now() \
             WHERE id = $1 \
             RETURNING credits",
        )
        .bind(id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(Credits(balance))
    }
}
