//! Stripe checkout and billing-portal session creation

use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// Stripe service for subscription operations
#[derive(Clone)]
pub struct StripeService {
    client: Client,
    api_base: String,
    stripe_secret_key: String,
    default_price_id: String,
    public_base_url: String,
}

impl StripeService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_base: config.stripe_api_base.trim_end_matches('/').to_string(),
            stripe_secret_key: config.stripe_secret_key.clone(),
            default_price_id: config.stripe_price_id.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a subscription checkout session for a user
    pub async fn create_checkout_session(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        price_id: Option<&str>,
    ) -> Result<CheckoutSessionResponse, StripeError> {
        let price_id = price_id
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(self.default_price_id.as_str());

        let success_url = format!(
            "{}/subscription/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.public_base_url
        );
        let cancel_url = format!("{}/subscription/select", self.public_base_url);

        let mut form_data: Vec<(&str, String)> = vec![
            ("mode", "subscription".to_string()),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("client_reference_id", user_id.to_string()),
            ("metadata[user_id]", user_id.to_string()),
            ("subscription_data[metadata][user_id]", user_id.to_string()),
            ("line_items[0][price]", price_id.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
        ];

        if let Some(email) = email {
            form_data.push(("customer_email", email.to_string()));
        }

        let session: StripeSession = self.post_form("/v1/checkout/sessions", &form_data).await?;
        let url = session.url.ok_or(StripeError::NoSessionUrl)?;

        Ok(CheckoutSessionResponse {
            session_id: session.id,
            url,
        })
    }

    /// Create a billing-portal session for an existing customer
    pub async fn create_portal_session(&self, customer_id: &str) -> Result<String, StripeError> {
        let form_data: Vec<(&str, String)> = vec![
            ("customer", customer_id.to_string()),
            ("return_url", format!("{}/my-page", self.public_base_url)),
        ];

        let session: StripeSession = self
            .post_form("/v1/billing_portal/sessions", &form_data)
            .await?;
        session.url.ok_or(StripeError::NoSessionUrl)
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form_data: &[(&str, String)],
    ) -> Result<T, StripeError> {
        let response = self
            .client
            .post(format!("{}{}", self.api_base, path))
            .basic_auth(&self.stripe_secret_key, None::<&str>)
            .form(form_data)
            .send()
            .await
            .map_err(StripeError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StripeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(StripeError::Request)
    }
}

/// Stripe session response (checkout and portal share this shape)
#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
}

/// Response from checkout session creation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
}

/// Stripe-related errors
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Stripe API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("No session URL returned")]
    NoSessionUrl,
}
