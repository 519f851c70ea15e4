//! Layout extraction from sample images and the built-in template table.

use axum::Json;
use axum::extract::{Extension, Multipart, State};
use axum::response::IntoResponse;

use crate::infra::http::auth::AuthenticatedUser;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::ExtractLayoutResponse;
use crate::infra::http::state::ApiState;

use super::{layout_to_api, user_to_api};

const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/jpg", "image/webp"];

pub async fn extract_layout(
    State(state): State<ApiState>,
    Extension(principal): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    state
        .users
        .ensure(principal.id, &principal.email)
        .await
        .map_err(user_to_api)?;

    let mut content_type = None;
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request("invalid multipart payload", Some(err.to_string())))?
    {
        if field.name() == Some("file") {
            content_type = field.content_type().map(|s| s.to_string());
            data = Some(field.bytes().await.map_err(|err| {
                ApiError::bad_request("failed to read upload", Some(err.to_string()))
            })?);
            break;
        }
    }

    let data = data.ok_or_else(|| ApiError::bad_request("missing file", None))?;
    let content_type = content_type.unwrap_or_else(|| "image/jpeg".to_string());

    if !ACCEPTED_IMAGE_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::invalid_input(format!(
            "unsupported sample image type `{content_type}`"
        )));
    }
    if data.is_empty() {
        return Err(ApiError::bad_request("missing file", None));
    }

    let extracted = state
        .layouts
        .extract(principal.id, data, &content_type)
        .await
        .map_err(layout_to_api)?;

    Ok(Json(ExtractLayoutResponse {
        layout: extracted.layout,
        sample_url: extracted.sample_url,
    }))
}

pub async fn list_templates(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.layouts.templates())
}
