//! Inbound billing webhook: signature-verified subscription lifecycle events.
//!
//! Signature scheme: `x-webhook-signature: t=<unix>,v1=<hex>` where the hex
//! value is HMAC-SHA256 over `"{t}.{raw body}"` with the shared secret.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use ring::hmac;
use tracing::{info, warn};

use crate::application::billing::BillingEvent;
use crate::infra::http::error::{ApiError, codes};
use crate::infra::http::models::{BillingWebhookPayload, WebhookAck};
use crate::infra::http::state::ApiState;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

pub async fn billing_webhook(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| invalid_signature("missing signature header"))?;

    verify_signature(&state.webhook_secret, signature, &body)?;

    let payload: BillingWebhookPayload = serde_json::from_str(&body)
        .map_err(|err| ApiError::invalid_input(format!("malformed webhook payload: {err}")))?;

    let event = match payload.event_type.as_str() {
        "checkout.session.completed" => {
            let user_id = payload
                .data
                .user_id
                .ok_or_else(|| ApiError::invalid_input("missing user_id".to_string()))?;
            let customer_id = payload
                .data
                .customer_id
                .ok_or_else(|| ApiError::invalid_input("missing customer_id".to_string()))?;
            Some(BillingEvent::CheckoutCompleted {
                user_id,
                customer_id,
                subscription_id: payload.data.subscription_id,
            })
        }
        "customer.subscription.created" | "customer.subscription.updated" => {
            let customer_id = payload
                .data
                .customer_id
                .ok_or_else(|| ApiError::invalid_input("missing customer_id".to_string()))?;
            Some(BillingEvent::SubscriptionUpdated {
                customer_id,
                subscription_id: payload.data.subscription_id,
                status: payload
                    .data
                    .status
                    .unwrap_or_else(|| "active".to_string()),
            })
        }
        "customer.subscription.deleted" => {
            let customer_id = payload
                .data
                .customer_id
                .ok_or_else(|| ApiError::invalid_input("missing customer_id".to_string()))?;
            Some(BillingEvent::SubscriptionDeleted { customer_id })
        }
        other => {
            info!(
                target = "recibo::http::webhook",
                event_type = %other,
                "unhandled billing event acknowledged"
            );
            None
        }
    };

    if let Some(event) = event {
        state.billing.apply(event).await.map_err(|err| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "Webhook handler failed",
                Some(err.to_string()),
            )
        })?;
    }

    Ok(Json(WebhookAck { received: true }))
}

fn invalid_signature(detail: &str) -> ApiError {
    warn!(
        target = "recibo::http::webhook",
        detail, "webhook signature rejected"
    );
    ApiError::new(
        StatusCode::BAD_REQUEST,
        codes::INVALID_SIGNATURE,
        "Invalid signature",
        None,
    )
}

fn verify_signature(secret: &str, header: &str, body: &str) -> Result<(), ApiError> {
    let mut timestamp = None;
    let mut provided = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => provided = Some(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| invalid_signature("missing timestamp"))?;
    let provided = provided.ok_or_else(|| invalid_signature("missing v1 component"))?;
    let provided =
        hex::decode(provided).map_err(|_| invalid_signature("signature is not valid hex"))?;

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let signed_payload = format!("{timestamp}.{body}");
    hmac::verify(&key, signed_payload.as_bytes(), &provided)
        .map_err(|_| invalid_signature("signature mismatch"))
}

/// Test helper mirroring the provider's signing step.
#[cfg(test)]
pub(crate) fn sign(secret: &str, timestamp: &str, body: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let tag = hmac::sign(&key, format!("{timestamp}.{body}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(tag.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_signature() {
        let body = r#"{"type":"customer.subscription.deleted"}"#;
        let header = sign("whsec_test", "1700000000", body);
        assert!(verify_signature("whsec_test", &header, body).is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let body = r#"{"type":"customer.subscription.deleted"}"#;
        let header = sign("whsec_test", "1700000000", body);
        assert!(verify_signature("whsec_test", &header, "{}").is_err());
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = "{}";
        let header = sign("whsec_other", "1700000000", body);
        assert!(verify_signature("whsec_test", &header, body).is_err());
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(verify_signature("whsec_test", "v1=zz", "{}").is_err());
        assert!(verify_signature("whsec_test", "t=1700000000", "{}").is_err());
    }
}
