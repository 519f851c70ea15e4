//! Owner-scoped receipt listing, retrieval, and deletion.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::infra::http::auth::AuthenticatedUser;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::ReceiptListResponse;
use crate::infra::http::state::ApiState;

use super::receipt_to_api;

pub async fn list_receipts(
    State(state): State<ApiState>,
    Extension(principal): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let receipts = state
        .receipts
        .list(principal.id)
        .await
        .map_err(receipt_to_api)?;

    Ok(Json(ReceiptListResponse { receipts }))
}

pub async fn get_receipt(
    State(state): State<ApiState>,
    Extension(principal): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .receipts
        .find(principal.id, id)
        .await
        .map_err(receipt_to_api)?;

    Ok(Json(receipt))
}

pub async fn delete_receipt(
    State(state): State<ApiState>,
    Extension(principal): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .receipts
        .delete(principal.id, id)
        .await
        .map_err(receipt_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
