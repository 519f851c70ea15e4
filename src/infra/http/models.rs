//! Request and response payloads for the JSON API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::layout::LayoutSchema;
use crate::domain::receipt::{BusinessInfo, ReceiptItem, ReceiptRecord};
use crate::domain::users::UserRecord;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReceiptRequest {
    pub layout: LayoutSchema,
    pub business_info: BusinessInfo,
    pub items: Vec<ReceiptItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReceiptResponse {
    pub pdf_url: String,
    pub png_url: String,
    pub receipt: Option<ReceiptRecord>,
    pub remaining_credits: i64,
}

#[derive(Debug, Serialize)]
pub struct ReceiptListResponse {
    pub receipts: Vec<ReceiptRecord>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserRecord,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetBannedRequest {
    pub banned: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetCreditsRequest {
    pub credits: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractLayoutResponse {
    pub layout: LayoutSchema,
    pub sample_url: String,
}

#[derive(Debug, Serialize)]
pub struct UploadLogoResponse {
    pub url: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Billing-provider webhook envelope. Unknown event types are acknowledged
/// without action.
#[derive(Debug, Deserialize)]
pub struct BillingWebhookPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: BillingWebhookData,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BillingWebhookData {
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<Uuid>,
}
