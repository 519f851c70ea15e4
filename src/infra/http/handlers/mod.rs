//! API handlers and the error-mapping helpers they share.

mod generate;
mod layouts;
mod receipts;
mod uploads;
mod users;
mod webhook;

pub use generate::generate_receipt;
pub use layouts::{extract_layout, list_templates};
pub use receipts::{delete_receipt, get_receipt, list_receipts};
pub use uploads::upload_logo;
pub use users::{admin_list_users, admin_set_banned, admin_set_credits, get_user, update_profile};
pub use webhook::billing_webhook;

use axum::http::StatusCode;

use crate::application::generation::GenerationError;
use crate::application::layouts::LayoutServiceError;
use crate::application::receipts::ReceiptQueryError;
use crate::application::users::UserError;

use super::error::{ApiError, codes};

pub(super) fn generation_to_api(error: GenerationError) -> ApiError {
    match error {
        GenerationError::UserNotFound => ApiError::not_found("User not found"),
        GenerationError::Banned => ApiError::banned(),
        GenerationError::PaymentRequired => ApiError::payment_required(),
        GenerationError::Validation(detail) => ApiError::invalid_input(detail),
        GenerationError::Render(err) => {
            tracing::error!(
                target = "recibo::http::generate",
                error = %err,
                "rasterization failed"
            );
            ApiError::render_failure()
        }
        GenerationError::Repo(err) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Service error",
            Some(err.to_string()),
        ),
    }
}

pub(super) fn receipt_to_api(error: ReceiptQueryError) -> ApiError {
    match error {
        ReceiptQueryError::NotFound => ApiError::not_found("Receipt not found"),
        ReceiptQueryError::Repo(err) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Service error",
            Some(err.to_string()),
        ),
    }
}

pub(super) fn user_to_api(error: UserError) -> ApiError {
    match error {
        UserError::NotFound => ApiError::not_found("User not found"),
        UserError::Repo(err) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Service error",
            Some(err.to_string()),
        ),
    }
}

pub(super) fn layout_to_api(error: LayoutServiceError) -> ApiError {
    match error {
        LayoutServiceError::Repo(err) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Service error",
            Some(err.to_string()),
        ),
    }
}
