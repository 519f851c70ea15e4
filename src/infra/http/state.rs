use std::sync::Arc;

use crate::application::billing::BillingService;
use crate::application::generation::GenerationService;
use crate::application::layouts::LayoutService;
use crate::application::receipts::ReceiptQueryService;
use crate::application::repos::FilesRepo;
use crate::application::users::{AdminUserService, UserService};
use crate::infra::db::PostgresRepositories;
use crate::infra::storage::ReceiptStorage;

use super::auth::TokenVerifier;

#[derive(Clone)]
pub struct ApiState {
    pub generation: Arc<GenerationService>,
    pub receipts: Arc<ReceiptQueryService>,
    pub users: Arc<UserService>,
    pub admin_users: Arc<AdminUserService>,
    pub layouts: Arc<LayoutService>,
    pub billing: Arc<BillingService>,
    pub storage: Arc<ReceiptStorage>,
    pub files: Arc<dyn FilesRepo>,
    pub auth: Arc<TokenVerifier>,
    pub db: Arc<PostgresRepositories>,
    pub webhook_secret: Arc<str>,
    pub upload_limit_bytes: usize,
}
