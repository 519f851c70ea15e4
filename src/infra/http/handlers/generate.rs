//! The generation endpoint: the only route that consumes a credit.

use axum::Json;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;

use crate::application::generation::GenerateReceiptCommand;
use crate::infra::http::auth::AuthenticatedUser;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{GenerateReceiptRequest, GenerateReceiptResponse};
use crate::infra::http::state::ApiState;

use super::{generation_to_api, user_to_api};

pub async fn generate_receipt(
    State(state): State<ApiState>,
    Extension(principal): Extension<AuthenticatedUser>,
    Json(request): Json<GenerateReceiptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Seed the account row on first contact; signup itself belongs to the
    // hosted identity provider.
    state
        .users
        .ensure(principal.id, &principal.email)
        .await
        .map_err(user_to_api)?;

    let command = GenerateReceiptCommand {
        layout: request.layout,
        business_info: request.business_info,
        items: request.items,
        subtotal: request.subtotal,
        tax: request.tax,
        total: request.total,
        receipt_number: request.receipt_number,
        date: request.date,
        notes: request.notes,
    };

    let outcome = state
        .generation
        .generate(principal.id, command)
        .await
        .map_err(generation_to_api)?;

    Ok(Json(GenerateReceiptResponse {
        pdf_url: outcome.pdf_url,
        png_url: outcome.png_url,
        receipt: outcome.receipt,
        remaining_credits: outcome.remaining_credits.get(),
    }))
}
