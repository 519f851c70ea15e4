//! The generation orchestrator: credit enforcement, rendering, artifact
//! upload, persistence, and credit decrement for one receipt request.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use rust_decimal::Decimal;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::repos::{ReceiptsRepo, RepoError, UsersRepo};
use crate::domain::layout::LayoutSchema;
use crate::domain::receipt::{BusinessInfo, ReceiptData, ReceiptItem, ReceiptRecord};
use crate::domain::types::Credits;
use crate::render::{DocumentRasterizer, RasterizeError, render};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    #[error("storage write failed: {0}")]
    Write(String),
}

/// Object storage for generated artifacts. Keys are namespaced by owning
/// user; the public URL is derivable from the key alone.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), ArtifactStoreError>;

    fn public_url(&self, key: &str) -> String;
}

#[derive(Debug, Error)]
pub enum LogoFetchError {
    #[error("logo fetch failed: {0}")]
    Fetch(String),
}

#[derive(Debug, Clone)]
pub struct FetchedLogo {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Resolves a remote logo URL into bytes so it can be inlined as a data URI
/// before rendering; the renderer itself never performs I/O.
#[async_trait]
pub trait LogoFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedLogo, LogoFetchError>;
}

#[derive(Debug, Clone)]
pub struct GenerateReceiptCommand {
    pub layout: LayoutSchema,
    pub business_info: BusinessInfo,
    pub items: Vec<ReceiptItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub receipt_number: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub pdf_url: String,
    pub png_url: String,
    pub receipt: Option<ReceiptRecord>,
    pub remaining_credits: Credits,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("user account not found")]
    UserNotFound,
    #[error("account is banned")]
    Banned,
    #[error("credit balance exhausted")]
    PaymentRequired,
    #[error("invalid generation request: {0}")]
    Validation(String),
    #[error("document rendering failed")]
    Render(#[source] RasterizeError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct GenerationService {
    users: Arc<dyn UsersRepo>,
    receipts: Arc<dyn ReceiptsRepo>,
    rasterizer: Arc<dyn DocumentRasterizer>,
    storage: Arc<dyn ArtifactStore>,
    logos: Option<Arc<dyn LogoFetcher>>,
}

impl GenerationService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        receipts: Arc<dyn ReceiptsRepo>,
        rasterizer: Arc<dyn DocumentRasterizer>,
        storage: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            users,
            receipts,
            rasterizer,
            storage,
            logos: None,
        }
    }

    pub fn with_logo_fetcher(mut self, logos: Arc<dyn LogoFetcher>) -> Self {
        self.logos = Some(logos);
        self
    }

    /// Run one generation request end to end. Credits are only consumed after
    /// rendering succeeds; storage and persistence failures after that point
    /// are logged and do not fail the request.
    pub async fn generate(
        &self,
        user_id: Uuid,
        command: GenerateReceiptCommand,
    ) -> Result<GenerationOutcome, GenerationError> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(GenerationError::UserNotFound)?;

        if user.is_banned {
            return Err(GenerationError::Banned);
        }
        if !user.credits.is_unlimited() && user.credits.is_exhausted() {
            return Err(GenerationError::PaymentRequired);
        }

        validate_command(&command)?;

        let date = command
            .date
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(today_display);
        let business_info = self.resolve_logo(command.business_info).await;

        let data = ReceiptData {
            business_info,
            items: command.items,
            subtotal: command.subtotal,
            tax: command.tax,
            total: command.total,
            receipt_number: command.receipt_number,
            date,
            notes: command.notes,
        };

        let document = render(&command.layout, &data);
        let output = self
            .rasterizer
            .rasterize(&document)
            .await
            .map_err(|err| {
                counter!("recibo_render_failures_total").increment(1);
                GenerationError::Render(err)
            })?;

        let timestamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let pdf_key = format!("{user_id}/{timestamp}-receipt.pdf");
        let png_key = format!("{user_id}/{timestamp}-receipt.png");
        let pdf_url = self.storage.public_url(&pdf_key);
        let png_url = self.storage.public_url(&png_key);

        let (pdf_write, png_write) = tokio::join!(
            self.storage
                .put(&pdf_key, Bytes::from(output.pdf), "application/pdf"),
            self.storage
                .put(&png_key, Bytes::from(output.png), "image/png"),
        );
        for (key, result) in [(&pdf_key, pdf_write), (&png_key, png_write)] {
            if let Err(err) = result {
                counter!("recibo_storage_write_failures_total").increment(1);
                warn!(
                    target = "recibo::generation",
                    key = %key,
                    error = %err,
                    "artifact upload failed; continuing with derived URL"
                );
            }
        }

        let record = ReceiptRecord {
            id: Uuid::new_v4(),
            user_id,
            layout: command.layout,
            business_info: data.business_info.clone(),
            items: data.items.clone(),
            subtotal: data.subtotal,
            tax: data.tax,
            total: data.total,
            receipt_number: data.receipt_number.clone(),
            notes: data.notes.clone(),
            pdf_url: pdf_url.clone(),
            png_url: png_url.clone(),
            created_at: OffsetDateTime::now_utc(),
        };

        let receipt = match self.receipts.insert_receipt(record.clone()).await {
            Ok(()) => Some(record),
            Err(err) => {
                counter!("recibo_persist_failures_total").increment(1);
                warn!(
                    target = "recibo::generation",
                    user_id = %user_id,
                    error = %err,
                    "receipt insert failed; artifacts remain in storage"
                );
                None
            }
        };

        let remaining_credits = if user.credits.is_unlimited() {
            user.credits
        } else {
            match self.users.decrement_credits(user_id).await {
                Ok(balance) => {
                    counter!("recibo_credits_decremented_total").increment(1);
                    if balance.get() < 0 {
                        warn!(
                            target = "recibo::generation",
                            user_id = %user_id,
                            balance = balance.get(),
                            "concurrent generations overdrew the credit balance"
                        );
                    }
                    balance
                }
                Err(err) => {
                    warn!(
                        target = "recibo::generation",
                        user_id = %user_id,
                        error = %err,
                        "credit decrement failed after successful generation"
                    );
                    Credits(user.credits.get() - 1)
                }
            }
        };

        counter!("recibo_generations_total").increment(1);
        info!(
            target = "recibo::generation",
            user_id = %user_id,
            pdf_key = %pdf_key,
            png_key = %png_key,
            remaining = remaining_credits.get(),
            "receipt generated"
        );

        Ok(GenerationOutcome {
            pdf_url,
            png_url,
            receipt,
            remaining_credits,
        })
    }

    /// Inline a remote logo as a data URI when a fetcher is configured. Data
    /// URIs pass through untouched; fetch failures keep the original URL and
    /// leave image resolution to the rendering engine.
    async fn resolve_logo(&self, mut business_info: BusinessInfo) -> BusinessInfo {
        let Some(url) = business_info.logo_url.clone() else {
            return business_info;
        };
        if url.starts_with("data:") {
            return business_info;
        }
        let Some(fetcher) = self.logos.as_ref() else {
            return business_info;
        };

        match fetcher.fetch(&url).await {
            Ok(logo) => {
                let encoded = BASE64.encode(&logo.bytes);
                business_info.logo_url =
                    Some(format!("data:{};base64,{}", logo.content_type, encoded));
            }
            Err(err) => {
                warn!(
                    target = "recibo::generation",
                    url = %url,
                    error = %err,
                    "logo fetch failed; rendering with the original URL"
                );
            }
        }
        business_info
    }
}

fn validate_command(command: &GenerateReceiptCommand) -> Result<(), GenerationError> {
    if command.business_info.name.trim().is_empty() {
        return Err(GenerationError::Validation(
            "businessInfo.name must not be empty".to_string(),
        ));
    }
    if command.items.is_empty() {
        return Err(GenerationError::Validation(
            "items must contain at least one entry".to_string(),
        ));
    }
    if let Some(item) = command.items.iter().find(|item| item.quantity == 0) {
        return Err(GenerationError::Validation(format!(
            "item `{}` has zero quantity",
            item.name
        )));
    }
    Ok(())
}

fn today_display() -> String {
    let format = format_description!("[month]/[day]/[year]");
    OffsetDateTime::now_utc()
        .date()
        .format(&format)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().date().to_string())
}
