pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, State},
    http::{StatusCode, header},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;
use crate::infra::storage::StorageError;

/// Assemble the public router: health, artifact serving, the billing webhook,
/// and the authenticated JSON API.
pub fn build_router(state: ApiState) -> Router {
    let upload_limit = state.upload_limit_bytes;

    let api = Router::new()
        .route("/api/v1/receipts/generate", post(handlers::generate_receipt))
        .route("/api/v1/receipts", get(handlers::list_receipts))
        .route(
            "/api/v1/receipts/{id}",
            get(handlers::get_receipt).delete(handlers::delete_receipt),
        )
        .route("/api/v1/user", get(handlers::get_user))
        .route("/api/v1/user/profile", put(handlers::update_profile))
        .route(
            "/api/v1/layouts/extract",
            post(handlers::extract_layout).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/layouts/templates", get(handlers::list_templates))
        .route(
            "/api/v1/uploads/logo",
            post(handlers::upload_logo).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/admin/users", get(handlers::admin_list_users))
        .route("/api/v1/admin/users/{id}/ban", post(handlers::admin_set_banned))
        .route(
            "/api/v1/admin/users/{id}/credits",
            post(handlers::admin_set_credits),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::api_auth,
        ));

    Router::new()
        .route("/healthz", get(health))
        .route("/storage/{*key}", get(serve_artifact))
        .route("/webhooks/billing", post(handlers::billing_webhook))
        .merge(api)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> Response {
    db_health_response(state.db.health_check().await)
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Serve a stored artifact back over the public URL space.
async fn serve_artifact(State(state): State<ApiState>, Path(key): Path<String>) -> Response {
    match state.storage.read(&key).await {
        Ok(bytes) => {
            let content_type = mime_guess::from_path(&key).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, content_type.to_string())],
                bytes,
            )
                .into_response()
        }
        Err(StorageError::InvalidKey) => StatusCode::NOT_FOUND.into_response(),
        Err(StorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => {
            let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
            ErrorReport::from_error(
                "infra::http::serve_artifact",
                StatusCode::INTERNAL_SERVER_ERROR,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
