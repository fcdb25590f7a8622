//! Subscription state mirrored from Stripe into `user_subscriptions`

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::{SupabaseClient, SupabaseError};

const TABLE: &str = "user_subscriptions";

/// One row per user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub user_id: Uuid,
    #[serde(default)]
    pub stripe_customer_id: Option<String>,
    #[serde(default)]
    pub stripe_subscription_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub plan: Option<String>,
    /// Omitted when unknown so an upsert keeps the stored value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<chrono::DateTime<chrono::Utc>>,
}

impl SubscriptionRecord {
    /// Statuses that grant access to premium features
    pub fn is_active(&self) -> bool {
        is_active_status(&self.status)
    }
}

pub fn is_active_status(status: &str) -> bool {
    matches!(status, "active" | "trialing")
}

/// Subscription status update
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionUpdate {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<chrono::DateTime<chrono::Utc>>,
}

/// Subscription store operations
#[derive(Clone)]
pub struct SubscriptionStore {
    client: SupabaseClient,
}

impl SubscriptionStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Get a user's subscription row
    pub async fn get(&self, user_id: Uuid) -> Result<Option<SubscriptionRecord>, SupabaseError> {
        let query = format!("user_id=eq.{}", user_id);
        self.client.get_one(TABLE, &query).await
    }

    /// Insert or replace a user's subscription row
    pub async fn upsert(&self, record: &SubscriptionRecord) -> Result<(), SupabaseError> {
        self.client.upsert(TABLE, record, "user_id").await
    }

    /// Update the row owning a Stripe subscription
    pub async fn update_status_by_subscription(
        &self,
        subscription_id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<(), SupabaseError> {
        let query = format!("stripe_subscription_id=eq.{}", subscription_id);
        self.client.update(TABLE, &query, update).await
    }

    /// Find the row for a Stripe customer
    pub async fn find_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<SubscriptionRecord>, SupabaseError> {
        let query = format!("stripe_customer_id=eq.{}", customer_id);
        let rows: Vec<SubscriptionRecord> = self.client.get(TABLE, &query).await?;
        Ok(rows.into_iter().next())
    }
}
