//! User profile access and administrative account operations.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{RepoError, UpdateProfileParams, UsersRepo};
use crate::domain::types::Credits;
use crate::domain::users::UserRecord;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UsersRepo>,
    free_tier_credits: i64,
}

impl UserService {
    pub fn new(repo: Arc<dyn UsersRepo>, free_tier_credits: i64) -> Self {
        Self {
            repo,
            free_tier_credits,
        }
    }

    /// Materialize the account row for an authenticated principal. The hosted
    /// identity provider owns signup; the first request seeds the local row
    /// with the free-tier balance.
    pub async fn ensure(&self, id: Uuid, email: &str) -> Result<UserRecord, UserError> {
        self.repo
            .ensure_user(id, email, Credits(self.free_tier_credits))
            .await
            .map_err(UserError::from)
    }

    pub async fn profile(&self, id: Uuid) -> Result<UserRecord, UserError> {
        self.repo.find_user(id).await?.ok_or(UserError::NotFound)
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        params: UpdateProfileParams,
    ) -> Result<UserRecord, UserError> {
        match self.repo.update_profile(id, params).await {
            Ok(record) => Ok(record),
            Err(RepoError::NotFound) => Err(UserError::NotFound),
            Err(err) => Err(UserError::Repo(err)),
        }
    }
}

/// Account moderation: listing, banning, and credit adjustment. Handlers gate
/// these behind the caller's admin flag.
#[derive(Clone)]
pub struct AdminUserService {
    repo: Arc<dyn UsersRepo>,
}

impl AdminUserService {
    pub fn new(repo: Arc<dyn UsersRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<UserRecord>, UserError> {
        self.repo.list_users().await.map_err(UserError::from)
    }

    pub async fn set_banned(&self, id: Uuid, banned: bool) -> Result<(), UserError> {
        self.repo.set_banned(id, banned).await?;
        info!(
            target = "recibo::admin",
            user_id = %id,
            banned,
            "ban flag updated"
        );
        Ok(())
    }

    pub async fn set_credits(&self, id: Uuid, credits: Credits) -> Result<(), UserError> {
        self.repo.set_credits(id, credits).await?;
        info!(
            target = "recibo::admin",
            user_id = %id,
            credits = credits.get(),
            "credit balance updated"
        );
        Ok(())
    }
}
