//! Owner-scoped receipt queries.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{ReceiptsRepo, RepoError};
use crate::domain::receipt::ReceiptRecord;

#[derive(Debug, Error)]
pub enum ReceiptQueryError {
    #[error("receipt not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Read/delete access to a user's own receipts. Ownership is enforced in the
/// queries themselves; there is no cross-user surface here.
#[derive(Clone)]
pub struct ReceiptQueryService {
    repo: Arc<dyn ReceiptsRepo>,
}

impl ReceiptQueryService {
    pub fn new(repo: Arc<dyn ReceiptsRepo>) -> Self {
        Self { repo }
    }

    /// All receipts owned by the user, newest first.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<ReceiptRecord>, ReceiptQueryError> {
        self.repo
            .list_receipts(user_id)
            .await
            .map_err(ReceiptQueryError::from)
    }

    pub async fn find(&self, user_id: Uuid, id: Uuid) -> Result<ReceiptRecord, ReceiptQueryError> {
        self.repo
            .find_receipt(user_id, id)
            .await?
            .ok_or(ReceiptQueryError::NotFound)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), ReceiptQueryError> {
        match self.repo.delete_receipt(user_id, id).await {
            Ok(()) => Ok(()),
            Err(RepoError::NotFound) => Err(ReceiptQueryError::NotFound),
            Err(err) => Err(ReceiptQueryError::Repo(err)),
        }
    }
}
