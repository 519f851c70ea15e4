//! In-memory fakes for the repository and rendering seams, shared by the
//! integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use uuid::Uuid;

use recibo::application::generation::{ArtifactStore, ArtifactStoreError};
use recibo::application::repos::{
    FilesRepo, ReceiptsRepo, RepoError, SubscriptionsRepo, UpdateProfileParams,
    UpsertSubscriptionParams, UsersRepo,
};
use recibo::domain::receipt::ReceiptRecord;
use recibo::domain::types::Credits;
use recibo::domain::uploads::StoredFileRecord;
use recibo::domain::users::{SubscriptionRecord, UserRecord};
use recibo::render::{DocumentRasterizer, RasterOutput, RasterizeError, ReceiptDocument};

pub fn user_record(id: Uuid, credits: i64) -> UserRecord {
    UserRecord {
        id,
        email: format!("{id}@example.com"),
        display_name: None,
        phone: None,
        company: None,
        credits: Credits(credits),
        is_admin: false,
        is_banned: false,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUsers {
    pub fn with_user(record: UserRecord) -> Self {
        let repo = Self::default();
        repo.users.lock().unwrap().insert(record.id, record);
        repo
    }

    pub fn insert(&self, record: UserRecord) {
        self.users.lock().unwrap().insert(record.id, record);
    }

    pub fn credits_of(&self, id: Uuid) -> i64 {
        self.users.lock().unwrap().get(&id).unwrap().credits.get()
    }
}

#[async_trait]
impl UsersRepo for InMemoryUsers {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn ensure_user(
        &self,
        id: Uuid,
        email: &str,
        initial_credits: Credits,
    ) -> Result<UserRecord, RepoError> {
        let mut users = self.users.lock().unwrap();
        let record = users.entry(id).or_insert_with(|| UserRecord {
            id,
            email: email.to_string(),
            display_name: None,
            phone: None,
            company: None,
            credits: initial_credits,
            is_admin: false,
            is_banned: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        });
        Ok(record.clone())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        params: UpdateProfileParams,
    ) -> Result<UserRecord, RepoError> {
        let mut users = self.users.lock().unwrap();
        let record = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        record.display_name = params.display_name;
        record.phone = params.phone;
        record.company = params.company;
        Ok(record.clone())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        Ok(self.users.lock().unwrap().values().cloned().collect())
    }

    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<(), RepoError> {
        let mut users = self.users.lock().unwrap();
        let record = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        record.is_banned = banned;
        Ok(())
    }

    async fn set_credits(&self, id: Uuid, credits: Credits) -> Result<(), RepoError> {
        let mut users = self.users.lock().unwrap();
        let record = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        record.credits = credits;
        Ok(())
    }

    async fn decrement_credits(&self, id: Uuid) -> Result<Credits, RepoError> {
        let mut users = self.users.lock().unwrap();
        let record = users.get_mut(&id).ok_or(RepoError::NotFound)?;
        record.credits = Credits(record.credits.get() - 1);
        Ok(record.credits)
    }
}

#[derive(Default)]
pub struct InMemoryReceipts {
    receipts: Mutex<Vec<ReceiptRecord>>,
    fail_inserts: AtomicBool,
}

impl InMemoryReceipts {
    pub fn failing_inserts() -> Self {
        let repo = Self::default();
        repo.fail_inserts.store(true, Ordering::SeqCst);
        repo
    }

    pub fn count(&self) -> usize {
        self.receipts.lock().unwrap().len()
    }
}

#[async_trait]
impl ReceiptsRepo for InMemoryReceipts {
    async fn insert_receipt(&self, record: ReceiptRecord) -> Result<(), RepoError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("simulated insert failure"));
        }
        self.receipts.lock().unwrap().push(record);
        Ok(())
    }

    async fn list_receipts(&self, user_id: Uuid) -> Result<Vec<ReceiptRecord>, RepoError> {
        let mut records: Vec<_> = self
            .receipts
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn find_receipt(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ReceiptRecord>, RepoError> {
        Ok(self
            .receipts
            .lock()
            .unwrap()
            .iter()
            .find(|record| record.id == id && record.user_id == user_id)
            .cloned())
    }

    async fn delete_receipt(&self, user_id: Uuid, id: Uuid) -> Result<(), RepoError> {
        let mut receipts = self.receipts.lock().unwrap();
        let before = receipts.len();
        receipts.retain(|record| !(record.id == id && record.user_id == user_id));
        if receipts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySubscriptions {
    subscriptions: Mutex<HashMap<String, SubscriptionRecord>>,
}

impl InMemorySubscriptions {
    pub fn status_of(&self, customer_id: &str) -> Option<String> {
        self.subscriptions
            .lock()
            .unwrap()
            .get(customer_id)
            .map(|record| record.status.clone())
    }
}

#[async_trait]
impl SubscriptionsRepo for InMemorySubscriptions {
    async fn upsert_subscription(
        &self,
        params: UpsertSubscriptionParams,
    ) -> Result<SubscriptionRecord, RepoError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let record = SubscriptionRecord {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            customer_id: params.customer_id.clone(),
            subscription_id: params.subscription_id,
            status: params.status,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        subscriptions.insert(params.customer_id, record.clone());
        Ok(record)
    }

    async fn find_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, RepoError> {
        Ok(self.subscriptions.lock().unwrap().get(customer_id).cloned())
    }

    async fn set_status(&self, customer_id: &str, status: &str) -> Result<(), RepoError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let record = subscriptions
            .get_mut(customer_id)
            .ok_or(RepoError::NotFound)?;
        record.status = status.to_string();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryFiles {
    files: Mutex<Vec<StoredFileRecord>>,
}

impl InMemoryFiles {
    pub fn count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl FilesRepo for InMemoryFiles {
    async fn insert_file(&self, record: StoredFileRecord) -> Result<(), RepoError> {
        self.files.lock().unwrap().push(record);
        Ok(())
    }
}

/// Artifact store capturing writes in memory; can be flipped to fail writes.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Bytes>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn failing_writes() -> Self {
        let store = Self::default();
        store.fail_writes.store(true, Ordering::SeqCst);
        store
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<(), ArtifactStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ArtifactStoreError::Write("simulated write failure".into()));
        }
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("http://storage.test/{key}")
    }
}

/// Rasterizer stub: fixed bytes on success, a counted failure otherwise.
#[derive(Default)]
pub struct StubRasterizer {
    fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl StubRasterizer {
    pub fn failing() -> Self {
        let stub = Self::default();
        stub.fail.store(true, Ordering::SeqCst);
        stub
    }
}

#[async_trait]
impl DocumentRasterizer for StubRasterizer {
    async fn rasterize(&self, _document: &ReceiptDocument) -> Result<RasterOutput, RasterizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RasterizeError::Parse("simulated engine failure".into()));
        }
        Ok(RasterOutput {
            pdf: b"%PDF-1.7 stub".to_vec(),
            png: vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a],
        })
    }
}
