//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use composition_coach_server::app::AppState;
use composition_coach_server::config::Config;
use composition_coach_server::http::build_router;
use composition_coach_server::http::middleware::{sign_jwt, JwtClaims, AUTHENTICATED_AUDIENCE};
use composition_coach_server::util::time::unix_secs;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const SERVICE_ROLE_KEY: &str = "service-role-key";
pub const ANTHROPIC_KEY: &str = "sk-ant-test";
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Config pointing every upstream at `upstream` (a wiremock server URI)
pub fn test_config(upstream: &str, anthropic_key: Option<&str>) -> Config {
    Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "debug".to_string(),
        log_json: false,
        supabase_url: upstream.to_string(),
        supabase_anon_key: "anon-key".to_string(),
        supabase_service_role_key: SERVICE_ROLE_KEY.to_string(),
        supabase_jwt_secret: JWT_SECRET.to_string(),
        stripe_secret_key: "sk_test_123".to_string(),
        stripe_webhook_secret: WEBHOOK_SECRET.to_string(),
        stripe_price_id: "price_default".to_string(),
        stripe_api_base: upstream.to_string(),
        anthropic_api_key: anthropic_key.map(str::to_string),
        anthropic_base_url: upstream.to_string(),
        anthropic_model: "claude-test".to_string(),
        public_base_url: "https://coach.example.com".to_string(),
        client_origin: "https://coach.example.com".to_string(),
        static_dir: PathBuf::from("/nonexistent/static/dir"),
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        ai_rate_limit_per_sec: 100,
    }
}

pub fn app_with(config: Config) -> Router {
    build_router(AppState::new(config).unwrap())
}

pub fn app(upstream: &str, anthropic_key: Option<&str>) -> Router {
    app_with(test_config(upstream, anthropic_key))
}

/// A valid Supabase-style access token
pub fn token_for(user_id: Uuid, email: &str) -> String {
    let claims = JwtClaims {
        sub: user_id,
        aud: Some(AUTHENTICATED_AUDIENCE.to_string()),
        exp: unix_secs() + 3600,
        iat: unix_secs(),
        email: Some(email.to_string()),
        role: Some("authenticated".to_string()),
    };
    sign_jwt(&claims, JWT_SECRET).unwrap()
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_json_authed(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Anthropic Messages API reply wrapping `text`
pub fn claude_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn"
    })
}
