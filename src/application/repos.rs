//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::receipt::ReceiptRecord;
use crate::domain::types::Credits;
use crate::domain::uploads::StoredFileRecord;
use crate::domain::users::{SubscriptionRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct UpdateProfileParams {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpsertSubscriptionParams {
    pub user_id: Uuid,
    pub customer_id: String,
    pub subscription_id: Option<String>,
    pub status: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    /// Insert the account row on first sight of an authenticated principal;
    /// an existing row is returned unchanged.
    async fn ensure_user(
        &self,
        id: Uuid,
        email: &str,
        initial_credits: Credits,
    ) -> Result<UserRecord, RepoError>;

    async fn update_profile(
        &self,
        id: Uuid,
        params: UpdateProfileParams,
    ) -> Result<UserRecord, RepoError>;

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError>;

    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<(), RepoError>;

    async fn set_credits(&self, id: Uuid, credits: Credits) -> Result<(), RepoError>;

    /// Atomically subtract one credit and return the new balance. Callers are
    /// responsible for skipping unlimited balances.
    async fn decrement_credits(&self, id: Uuid) -> Result<Credits, RepoError>;
}

#[async_trait]
pub trait ReceiptsRepo: Send + Sync {
    async fn insert_receipt(&self, record: ReceiptRecord) -> Result<(), RepoError>;

    async fn list_receipts(&self, user_id: Uuid) -> Result<Vec<ReceiptRecord>, RepoError>;

    async fn find_receipt(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ReceiptRecord>, RepoError>;

    /// Delete an owned receipt; deleting someone else's receipt (or a missing
    /// one) reports `NotFound`.
    async fn delete_receipt(&self, user_id: Uuid, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SubscriptionsRepo: Send + Sync {
    async fn upsert_subscription(
        &self,
        params: UpsertSubscriptionParams,
    ) -> Result<SubscriptionRecord, RepoError>;

    async fn find_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, RepoError>;

    async fn set_status(&self, customer_id: &str, status: &str) -> Result<(), RepoError>;
}

#[async_trait]
pub trait FilesRepo: Send + Sync {
    async fn insert_file(&self, record: StoredFileRecord) -> Result<(), RepoError>;
}
