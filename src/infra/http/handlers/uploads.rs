//! Logo uploads for receipt headers.

use axum::Json;
use axum::extract::{Extension, Multipart, State};
use axum::response::IntoResponse;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::application::generation::ArtifactStore;
use crate::domain::uploads::{FileKind, StoredFileRecord};
use crate::infra::http::auth::AuthenticatedUser;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::UploadLogoResponse;
use crate::infra::http::state::ApiState;

use super::user_to_api;

const ACCEPTED_LOGO_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/jpg", "image/svg+xml"];

pub async fn upload_logo(
    State(state): State<ApiState>,
    Extension(principal): Extension<AuthenticatedUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    state
        .users
        .ensure(principal.id, &principal.email)
        .await
        .map_err(user_to_api)?;

    let mut filename = None;
    let mut content_type = None;
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request("invalid multipart payload", Some(err.to_string())))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(|s| s.to_string());
            content_type = field.content_type().map(|s| s.to_string());
            data = Some(field.bytes().await.map_err(|err| {
                ApiError::bad_request("failed to read upload", Some(err.to_string()))
            })?);
            break;
        }
    }

    let data = data.ok_or_else(|| ApiError::bad_request("missing file", None))?;
    let content_type =
        content_type.ok_or_else(|| ApiError::bad_request("missing content type", None))?;

    if !ACCEPTED_LOGO_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::invalid_input(
            "invalid file type; only PNG, JPG, and SVG are allowed".to_string(),
        ));
    }
    if data.len() > state.upload_limit_bytes {
        return Err(ApiError::invalid_input(format!(
            "file too large; maximum size is {} bytes",
            state.upload_limit_bytes
        )));
    }
    if data.is_empty() {
        return Err(ApiError::bad_request("missing file", None));
    }

    let extension = filename
        .as_deref()
        .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()))
        .unwrap_or_else(|| "png".to_string());
    let timestamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let key = format!("{}/logo-{timestamp}.{extension}", principal.id);

    state
        .storage
        .put(&key, data, &content_type)
        .await
        .map_err(|err| {
            ApiError::new(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                crate::infra::http::error::codes::UPLOAD,
                "Failed to upload file",
                Some(err.to_string()),
            )
        })?;

    let url = state.storage.public_url(&key);

    let record = StoredFileRecord {
        id: Uuid::new_v4(),
        user_id: principal.id,
        file_url: url.clone(),
        kind: FileKind::Logo,
        created_at: OffsetDateTime::now_utc(),
    };
    if let Err(err) = state.files.insert_file(record).await {
        warn!(
            target = "recibo::http::uploads",
            user_id = %principal.id,
            error = %err,
            "logo file record insert failed"
        );
    }

    Ok(Json(UploadLogoResponse {
        url,
        message: "Logo uploaded successfully",
    }))
}
