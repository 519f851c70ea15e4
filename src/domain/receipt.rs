//! Receipt input data and the persisted receipt entity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::layout::LayoutSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// One line item. `total` is caller-computed (quantity × price) and is trusted
/// as-is; the renderer never recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
    pub total: Decimal,
}

/// The values populated into a layout for one rendering. Never persisted in
/// this shape; the persisted entity is [`ReceiptRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptData {
    pub business_info: BusinessInfo,
    pub items: Vec<ReceiptItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A generated receipt. Created once after a successful render and upload;
/// read, listed, and deleted by the owning user; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub layout: LayoutSchema,
    pub business_info: BusinessInfo,
    pub items: Vec<ReceiptItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
    pub pdf_url: String,
    pub png_url: String,
    pub created_at: OffsetDateTime,
}
