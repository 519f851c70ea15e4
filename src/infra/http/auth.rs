//! Bearer-token authentication against the hosted identity provider.
//!
//! The provider issues HS256 tokens over a shared secret; this middleware
//! only establishes the caller identity. Account state (credits, bans) is
//! checked by the services behind it.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthSettings;

use super::error::ApiError;
use super::state::ApiState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
}

/// The verified caller identity, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(settings: &AuthSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = settings.issuer.as_deref() {
            validation.set_issuer(&[issuer]);
        }
        Self {
            key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|err| {
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            }
        })?;

        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::Invalid)?;
        let email = data.claims.email.unwrap_or_default();

        Ok(AuthenticatedUser { id, email })
    }
}

pub async fn api_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = extract_token(request.headers().get(axum::http::header::AUTHORIZATION));

    let token = match token {
        Some(value) => value,
        None => return ApiError::unauthorized().into_response(),
    };

    let principal = match state.auth.verify(&token) {
        Ok(principal) => principal,
        Err(AuthError::Missing) | Err(AuthError::Invalid) => {
            return ApiError::unauthorized().into_response();
        }
        Err(AuthError::Expired) => {
            return ApiError::new(
                StatusCode::UNAUTHORIZED,
                "expired",
                "Token expired",
                Some("Refresh the session and retry once.".to_string()),
            )
            .into_response();
        }
    };

    request.extensions_mut().insert(principal);

    next.run(request).await
}

fn extract_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?;
    Some(bearer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        email: String,
        exp: u64,
    }

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "unit-test-secret".to_string(),
            issuer: None,
        }
    }

    fn token_for(sub: &str, secret: &str) -> String {
        let claims = TestClaims {
            sub: sub.to_string(),
            email: "user@example.com".to_string(),
            exp: 4_102_444_800, // 2100-01-01
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode token")
    }

    #[test]
    fn accepts_valid_token() {
        let verifier = TokenVerifier::new(&settings());
        let id = Uuid::new_v4();
        let user = verifier
            .verify(&token_for(&id.to_string(), "unit-test-secret"))
            .expect("verify");
        assert_eq!(user.id, id);
        assert_eq!(user.email, "user@example.com");
    }

    #[test]
    fn rejects_wrong_secret() {
        let verifier = TokenVerifier::new(&settings());
        let id = Uuid::new_v4();
        let error = verifier
            .verify(&token_for(&id.to_string(), "other-secret"))
            .expect_err("must reject");
        assert!(matches!(error, AuthError::Invalid));
    }

    #[test]
    fn rejects_non_uuid_subject() {
        let verifier = TokenVerifier::new(&settings());
        let error = verifier
            .verify(&token_for("not-a-uuid", "unit-test-secret"))
            .expect_err("must reject");
        assert!(matches!(error, AuthError::Invalid));
    }
}
