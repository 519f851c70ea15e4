//! Profile access and admin account moderation.

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::repos::UpdateProfileParams;
use crate::domain::types::Credits;
use crate::infra::http::auth::AuthenticatedUser;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::{
    SetBannedRequest, SetCreditsRequest, UpdateProfileRequest, UserListResponse, UserResponse,
};
use crate::infra::http::state::ApiState;

use super::user_to_api;

pub async fn get_user(
    State(state): State<ApiState>,
    Extension(principal): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .ensure(principal.id, &principal.email)
        .await
        .map_err(user_to_api)?;

    Ok(Json(UserResponse { user }))
}

pub async fn update_profile(
    State(state): State<ApiState>,
    Extension(principal): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .users
        .ensure(principal.id, &principal.email)
        .await
        .map_err(user_to_api)?;

    let user = state
        .users
        .update_profile(
            principal.id,
            UpdateProfileParams {
                display_name: request.display_name,
                phone: request.phone,
                company: request.company,
            },
        )
        .await
        .map_err(user_to_api)?;

    Ok(Json(UserResponse { user }))
}

/// Admin routes bypass per-user ownership but still require the caller's own
/// account to carry the admin flag.
async fn require_admin(state: &ApiState, principal: &AuthenticatedUser) -> Result<(), ApiError> {
    let caller = state
        .users
        .profile(principal.id)
        .await
        .map_err(|_| ApiError::forbidden())?;
    if !caller.is_admin {
        return Err(ApiError::forbidden());
    }
    Ok(())
}

pub async fn admin_list_users(
    State(state): State<ApiState>,
    Extension(principal): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &principal).await?;

    let users = state.admin_users.list().await.map_err(user_to_api)?;
    Ok(Json(UserListResponse { users }))
}

pub async fn admin_set_banned(
    State(state): State<ApiState>,
    Extension(principal): Extension<AuthenticatedUser>,
    Path(target): Path<Uuid>,
    Json(request): Json<SetBannedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &principal).await?;

    state
        .admin_users
        .set_banned(target, request.banned)
        .await
        .map_err(user_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn admin_set_credits(
    State(state): State<ApiState>,
    Extension(principal): Extension<AuthenticatedUser>,
    Path(target): Path<Uuid>,
    Json(request): Json<SetCreditsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&state, &principal).await?;

    if request.credits < 0 {
        return Err(ApiError::invalid_input(
            "credits must not be negative".to_string(),
        ));
    }

    state
        .admin_users
        .set_credits(target, Credits(request.credits))
        .await
        .map_err(user_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
