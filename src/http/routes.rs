//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::State,
    http::{header, Method},
    middleware,
    response::Json,
    routing::{any, get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::app::AppState;
use crate::http::admin::create_user_handler;
use crate::http::billing::{checkout_handler, portal_handler, subscription_handler};
use crate::http::middleware::require_auth;
use crate::http::practice::{evaluate_handler, history_handler, problem_handler};
use crate::http::AppError;
use crate::payments::webhook::stripe_webhook_handler;
use crate::util::time::uptime_secs;

/// Whole-request ceiling; model calls dominate
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "*")
        .filter_map(|s| s.parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/api/config", get(client_config_handler))
        .route("/api/problem", post(problem_handler))
        .route("/api/evaluate", post(evaluate_handler))
        .route("/api/evaluate-with-claude", post(evaluate_handler))
        .route("/api/evaluate-with-claude-with-claude", post(evaluate_handler))
        .route("/api/stripe-webhook", post(stripe_webhook_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/admin/create-user", post(create_user_handler))
        .route("/api/create-checkout-session", post(checkout_handler))
        .route("/api/create-portal-session", post(portal_handler))
        .route("/api/subscription", get(subscription_handler))
        .route("/api/history", get(history_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Unknown API paths must never fall through to the SPA
        .route("/api", any(api_not_found))
        .route("/api/", any(api_not_found))
        .route("/api/*rest", any(api_not_found))
        .method_not_allowed_fallback(method_not_allowed);

    let static_dir = &state.config.static_dir;
    let router = if static_dir.is_dir() {
        info!(dir = %static_dir.display(), "Serving static files");
        // SPA fallback: serve index.html for any path that isn't a file
        router.fallback_service(
            ServeDir::new(static_dir)
                .append_index_html_on_directories(true)
                .fallback(ServeFile::new(static_dir.join("index.html"))),
        )
    } else {
        warn!(dir = %static_dir.display(), "Static directory missing, serving API only");
        router.fallback(api_not_found)
    };

    router
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn api_not_found() -> AppError {
    AppError::NotFound("No such endpoint".to_string())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    evaluator: &'static str,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: uptime_secs(),
        evaluator: state.evaluator.mode(),
    })
}

// ============================================================================
// Client runtime config
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfigResponse {
    supabase_url: String,
    supabase_anon_key: String,
    stripe_enabled: bool,
    evaluator: &'static str,
}

async fn client_config_handler(State(state): State<AppState>) -> Json<ClientConfigResponse> {
    Json(ClientConfigResponse {
        supabase_url: state.config.supabase_url.clone(),
        supabase_anon_key: state.config.supabase_anon_key.clone(),
        stripe_enabled: true,
        evaluator: state.evaluator.mode(),
    })
}
