use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{ReceiptsRepo, RepoError},
    domain::receipt::ReceiptRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const RECEIPT_COLUMNS: &str = "id, user_id, layout, business_info, items, subtotal, tax, total, receipt_number, notes, pdf_url, png_url, created_at";

#[derive(sqlx::FromRow)]
struct ReceiptRow {
    id: Uuid,
    user_id: Uuid,
    layout: JsonValue,
    business_info: JsonValue,
    items: JsonValue,
    subtotal: Decimal,
    tax: Decimal,
    total: Decimal,
    receipt_number: Option<String>,
    notes: Option<String>,
    pdf_url: String,
    png_url: String,
    created_at: OffsetDateTime,
}

impl TryFrom<ReceiptRow> for ReceiptRecord {
    type Error = RepoError;

    fn try_from(row: ReceiptRow) -> Result<Self, Self::Error> {
        let layout = serde_json::from_value(row.layout)
            .map_err(|err| RepoError::from_persistence(format!("layout column: {err}")))?;
        let business_info = serde_json::from_value(row.business_info)
            .map_err(|err| RepoError::from_persistence(format!("business_info column: {err}")))?;
        let items = serde_json::from_value(row.items)
            .map_err(|err| RepoError::from_persistence(format!("items column: {err}")))?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            layout,
            business_info,
            items,
            subtotal: row.subtotal,
            tax: row.tax,
            total: row.total,
            receipt_number: row.receipt_number,
            notes: row.notes,
            pdf_url: row.pdf_url,
            png_url: row.png_url,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ReceiptsRepo for PostgresRepositories {
    async fn insert_receipt(&self, record: ReceiptRecord) -> Result<(), RepoError> {
        let layout = serde_json::to_value(&record.layout).expect("layout serializable");
        let business_info =
            serde_json::to_value(&record.business_info).expect("business info serializable");
        let items = serde_json::to_value(&record.items).expect("items serializable");

        sqlx::query(
            "INSERT INTO receipts (id, user_id, layout, business_info, items, subtotal, tax, total, receipt_number, notes, pdf_url, png_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(layout)
        .bind(business_info)
        .bind(items)
        .bind(record.subtotal)
        .bind(record.tax)
        .bind(record.total)
        .bind(record.receipt_number)
        .bind(record.notes)
        .bind(record.pdf_url)
        .bind(record.png_url)
        .bind(record.created_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_receipts(&self, user_id: Uuid) -> Result<Vec<ReceiptRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ReceiptRow>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM receipts \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(ReceiptRecord::try_from).collect()
    }

    async fn find_receipt(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ReceiptRecord>, RepoError> {
        let row = sqlx::query_as::<_, ReceiptRow>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM receipts WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(ReceiptRecord::try_from).transpose()
    }

    async fn delete_receipt(&self, user_id: Uuid, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM receipts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
