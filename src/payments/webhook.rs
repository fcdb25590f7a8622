//! Stripe webhook handler with signature verification

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::store::subscriptions::{SubscriptionRecord, SubscriptionUpdate};
use crate::store::supabase::SupabaseError;
use crate::util::time::{from_unix, unix_secs};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed webhook, in seconds
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Plan name stored for paid subscriptions
pub const PREMIUM_PLAN: &str = "premium";

/// Handle Stripe webhook events
pub async fn stripe_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookError> {
    // Get the Stripe-Signature header
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;

    // Get the raw body as string for verification
    let payload = std::str::from_utf8(&body).map_err(|_| WebhookError::InvalidPayload)?;

    verify_stripe_signature(
        payload,
        signature,
        &state.config.stripe_webhook_secret,
        unix_secs() as i64,
    )?;

    let event: StripeEvent = serde_json::from_str(payload).map_err(|e| {
        error!(error = %e, "Failed to parse Stripe event");
        WebhookError::InvalidPayload
    })?;

    info!(
        event_type = %event.event_type,
        event_id = %event.id,
        "Received Stripe webhook"
    );

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSessionData = event.data.parse()?;
            handle_checkout_completed(&state, &session).await?;
        }
        "customer.subscription.updated" => {
            let subscription: SubscriptionData = event.data.parse()?;
            handle_subscription_changed(&state, &subscription, &subscription.status).await?;
        }
        "customer.subscription.deleted" => {
            let subscription: SubscriptionData = event.data.parse()?;
            handle_subscription_changed(&state, &subscription, "canceled").await?;
        }
        _ => {
            info!(event_type = %event.event_type, "Unhandled event type");
        }
    }

    Ok(StatusCode::OK)
}

/// Verify a `Stripe-Signature` header (`t=...,v1=...`) against the raw payload
pub fn verify_stripe_signature(
    payload: &str,
    signature_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), WebhookError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let mut kv = part.trim().splitn(2, '=');
        if let (Some(key), Some(value)) = (kv.next(), kv.next()) {
            match key {
                "t" => timestamp = Some(value),
                "v1" => signatures.push(value),
                _ => {}
            }
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::InvalidSignature)?;
    if signatures.is_empty() {
        return Err(WebhookError::InvalidSignature);
    }

    let signed_at: i64 = timestamp
        .parse()
        .map_err(|_| WebhookError::InvalidSignature)?;

    let signed_payload = format!("{}.{}", timestamp, payload);

    // verify_slice compares in constant time
    let valid = signatures.iter().any(|sig| {
        let Ok(provided) = hex::decode(sig) else {
            return false;
        };
        HmacSha256::new_from_slice(secret.as_bytes())
            .map(|mut mac| {
                mac.update(signed_payload.as_bytes());
                mac.verify_slice(&provided).is_ok()
            })
            .unwrap_or(false)
    });

    if !valid {
        return Err(WebhookError::InvalidSignature);
    }

    if (now - signed_at).abs() > SIGNATURE_TOLERANCE_SECS {
        warn!(signed_at, "Rejecting webhook outside the timestamp tolerance");
        return Err(WebhookError::StaleTimestamp);
    }

    Ok(())
}

/// Compute the `v1` signature for a payload. Used to sign test fixtures.
pub fn sign_payload(payload: &str, secret: &str, timestamp: i64) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    Ok(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Handle a completed subscription checkout
async fn handle_checkout_completed(
    state: &AppState,
    session: &CheckoutSessionData,
) -> Result<(), WebhookError> {
    if session.mode.as_deref() != Some("subscription") {
        info!(session_id = %session.id, "Ignoring non-subscription checkout");
        return Ok(());
    }

    info!(session_id = %session.id, "Processing checkout completion");

    let user_id = resolve_checkout_user(state, session).await?;

    let subscription_id = session.subscription.clone().ok_or_else(|| {
        error!(session_id = %session.id, "Missing subscription on checkout session");
        WebhookError::InvalidMetadata
    })?;

    // Check if already processed (idempotency)
    if let Some(existing) = state.subscriptions.get(user_id).await? {
        if existing.stripe_subscription_id.as_deref() == Some(subscription_id.as_str())
            && existing.is_active()
        {
            info!(session_id = %session.id, "Subscription already recorded (idempotent)");
            return Ok(());
        }
    }

    state
        .subscriptions
        .upsert(&SubscriptionRecord {
            user_id,
            stripe_customer_id: session.customer.clone(),
            stripe_subscription_id: Some(subscription_id.clone()),
            status: "active".to_string(),
            plan: Some(PREMIUM_PLAN.to_string()),
            current_period_end: None,
        })
        .await?;

    info!(
        user_id = %user_id,
        subscription_id = %subscription_id,
        "Subscription activated"
    );

    Ok(())
}

/// Find the user a checkout belongs to: session metadata first, then
/// `client_reference_id`, then an existing row for the Stripe customer
async fn resolve_checkout_user(
    state: &AppState,
    session: &CheckoutSessionData,
) -> Result<Uuid, WebhookError> {
    let tagged = session
        .metadata
        .get("user_id")
        .and_then(|s| s.parse().ok())
        .or_else(|| {
            session
                .client_reference_id
                .as_deref()
                .and_then(|s| s.parse().ok())
        });
    if let Some(user_id) = tagged {
        return Ok(user_id);
    }

    if let Some(customer_id) = session.customer.as_deref() {
        if let Some(existing) = state.subscriptions.find_by_customer(customer_id).await? {
            info!(
                session_id = %session.id,
                user_id = %existing.user_id,
                "Resolved checkout user from Stripe customer"
            );
            return Ok(existing.user_id);
        }
    }

    error!(session_id = %session.id, "Missing user_id in session metadata");
    Err(WebhookError::InvalidMetadata)
}

/// Mirror a subscription status change
async fn handle_subscription_changed(
    state: &AppState,
    subscription: &SubscriptionData,
    status: &str,
) -> Result<(), WebhookError> {
    info!(
        subscription_id = %subscription.id,
        status = %status,
        "Updating subscription status"
    );

    state
        .subscriptions
        .update_status_by_subscription(
            &subscription.id,
            &SubscriptionUpdate {
                status: status.to_string(),
                current_period_end: subscription.current_period_end.and_then(from_unix),
            },
        )
        .await?;

    Ok(())
}

// ============================================================================
// Stripe Event Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

impl StripeEventData {
    fn parse<T: for<'de> Deserialize<'de>>(self) -> Result<T, WebhookError> {
        serde_json::from_value(self.object).map_err(|e| {
            error!(error = %e, "Unexpected Stripe object shape");
            WebhookError::InvalidPayload
        })
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionData {
    id: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    subscription: Option<String>,
    #[serde(default)]
    client_reference_id: Option<String>,
    #[serde(default)]
    metadata: std::collections::HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionData {
    id: String,
    status: String,
    #[serde(default)]
    current_period_end: Option<i64>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Missing Stripe-Signature header")]
    MissingSignature,

    #[error("Invalid request payload")]
    InvalidPayload,

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Webhook timestamp outside tolerance")]
    StaleTimestamp,

    #[error("Invalid metadata in session")]
    InvalidMetadata,

    #[error("Database error: {0}")]
    Database(#[from] SupabaseError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            WebhookError::MissingSignature => StatusCode::BAD_REQUEST,
            WebhookError::InvalidPayload => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::StaleTimestamp => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidMetadata => StatusCode::BAD_REQUEST,
            WebhookError::Database(e) => {
                error!(error = %e, "Webhook database failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const PAYLOAD: &str = r#"{"id":"evt_1","type":"ping","data":{"object":{}}}"#;

    #[test]
    fn accepts_valid_signature() {
        let header = sign_payload(PAYLOAD, SECRET, 1_700_000_000).unwrap();
        verify_stripe_signature(PAYLOAD, &header, SECRET, 1_700_000_010).unwrap();
    }

    #[test]
    fn accepts_any_matching_v1_among_several() {
        let signed = sign_payload(PAYLOAD, SECRET, 1_700_000_000).unwrap();
        let v1 = signed.split("v1=").nth(1).unwrap();
        let header = format!("t=1700000000,v1={},v0=abc,v1={}", "00".repeat(32), v1);
        verify_stripe_signature(PAYLOAD, &header, SECRET, 1_700_000_000).unwrap();
    }

    #[test]
    fn rejects_tampered_payload() {
        let header = sign_payload(PAYLOAD, SECRET, 1_700_000_000).unwrap();
        let err = verify_stripe_signature("{}", &header, SECRET, 1_700_000_000).unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSignature));
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = sign_payload(PAYLOAD, "whsec_other", 1_700_000_000).unwrap();
        assert!(verify_stripe_signature(PAYLOAD, &header, SECRET, 1_700_000_000).is_err());
    }

    #[test]
    fn rejects_stale_timestamp() {
        let header = sign_payload(PAYLOAD, SECRET, 1_700_000_000).unwrap();
        let err = verify_stripe_signature(PAYLOAD, &header, SECRET, 1_700_000_000 + 301)
            .unwrap_err();
        assert!(matches!(err, WebhookError::StaleTimestamp));
    }

    #[test]
    fn rejects_malformed_header() {
        for header in ["", "t=123", "v1=abc", "t=abc,v1=00", "garbage"] {
            assert!(
                verify_stripe_signature(PAYLOAD, header, SECRET, 0).is_err(),
                "header {header:?} accepted"
            );
        }
    }

    #[test]
    fn checkout_session_reads_subscription_fields() {
        let data = StripeEventData {
            object: serde_json::json!({
                "id": "cs_1",
                "mode": "subscription",
                "customer": "cus_1",
                "subscription": "sub_1",
                "metadata": {"user_id": "00000000-0000-0000-0000-000000000001"}
            }),
        };
        let session: CheckoutSessionData = data.parse().unwrap();
        assert_eq!(session.subscription.as_deref(), Some("sub_1"));
        assert_eq!(session.customer.as_deref(), Some("cus_1"));
    }
}
