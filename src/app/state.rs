//! Application state shared across routes

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::evaluator::Evaluator;
use crate::payments::StripeService;
use crate::store::{HistoryStore, SubscriptionStore, SupabaseClient};
use crate::util::rate_limit::AiRateLimiter;

/// Upper bound for any single upstream call
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub supabase: SupabaseClient,
    pub subscriptions: SubscriptionStore,
    pub history: HistoryStore,
    pub stripe: StripeService,
    pub evaluator: Evaluator,
    pub ai_limiter: AiRateLimiter,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let config = Arc::new(config);

        // One connection pool for every upstream
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;

        // Initialize Supabase client
        let supabase = SupabaseClient::new(&config, http.clone());

        // Initialize stores
        let subscriptions = SubscriptionStore::new(supabase.clone());
        let history = HistoryStore::new(supabase.clone());

        // Initialize Stripe
        let stripe = StripeService::new(&config, http.clone());

        let evaluator = Evaluator::new(&config, http);
        let ai_limiter = AiRateLimiter::new(config.ai_rate_limit_per_sec);

        Ok(Self {
            config,
            supabase,
            subscriptions,
            history,
            stripe,
            evaluator,
            ai_limiter,
        })
    }
}
