//! Subscription endpoints backed by Stripe and `user_subscriptions`

use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::http::middleware::AuthenticatedUser;
use crate::http::AppError;
use crate::payments::stripe::CheckoutSessionResponse;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub price_id: Option<String>,
}

/// POST /api/create-checkout-session
pub async fn checkout_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    payload: Option<Json<CheckoutRequest>>,
) -> Result<Json<CheckoutSessionResponse>, AppError> {
    let req = payload.map(|Json(r)| r).unwrap_or_default();

    let session = state
        .stripe
        .create_checkout_session(auth.user_id, auth.email.as_deref(), req.price_id.as_deref())
        .await?;

    info!(user_id = %auth.user_id, session_id = %session.session_id, "Created checkout session");
    Ok(Json(session))
}

#[derive(Serialize)]
pub struct PortalResponse {
    pub url: String,
}

/// POST /api/create-portal-session
pub async fn portal_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<PortalResponse>, AppError> {
    let customer_id = state
        .subscriptions
        .get(auth.user_id)
        .await?
        .and_then(|record| record.stripe_customer_id)
        .ok_or_else(|| AppError::NotFound("No billing account for this user".to_string()))?;

    let url = state.stripe.create_portal_session(&customer_id).await?;
    Ok(Json(PortalResponse { url }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub status: String,
    pub plan: Option<String>,
    pub current_period_end: Option<chrono::DateTime<chrono::Utc>>,
    pub active: bool,
}

/// GET /api/subscription
pub async fn subscription_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let response = match state.subscriptions.get(auth.user_id).await? {
        Some(record) => SubscriptionResponse {
            active: record.is_active(),
            status: record.status,
            plan: record.plan,
            current_period_end: record.current_period_end,
        },
        None => SubscriptionResponse {
            status: "inactive".to_string(),
            plan: None,
            current_period_end: None,
            active: false,
        },
    };

    Ok(Json(response))
}
