//! Auth, admin and billing integration tests

mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

#[tokio::test]
async fn protected_routes_require_token() {
    let server = MockServer::start().await;
    let app = app(&server.uri(), None);

    for (method, uri) in [
        ("GET", "/api/subscription"),
        ("GET", "/api/history"),
        ("POST", "/api/create-checkout-session"),
        ("POST", "/api/create-portal-session"),
        ("POST", "/api/admin/create-user"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert!(body_json(response).await["error"].is_string());
    }
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let server = MockServer::start().await;
    let app = app(&server.uri(), None);

    let response = send(
        &app,
        get_authed("/api/subscription", "eyJhbGciOiJIUzI1NiJ9.e30.c2lnbmF0dXJl"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_user_requires_admin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let token = token_for(Uuid::new_v4(), "learner@example.com");
    let response = send(
        &app,
        post_json_authed(
            "/api/admin/create-user",
            &token,
            json!({"email": "new@example.com", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_user_forwards_to_supabase_admin_api() {
    let server = MockServer::start().await;
    let new_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .and(header("apikey", SERVICE_ROLE_KEY))
        .and(header("authorization", format!("Bearer {}", SERVICE_ROLE_KEY).as_str()))
        .and(body_partial_json(json!({
            "email": "new@example.com",
            "password": "secret123",
            "email_confirm": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": new_id,
            "email": "new@example.com",
            "aud": "authenticated"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let token = token_for(Uuid::new_v4(), ADMIN_EMAIL);
    let response = send(
        &app,
        post_json_authed(
            "/api/admin/create-user",
            &token,
            json!({"email": " new@example.com ", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["id"], new_id.to_string());
    assert_eq!(json["email"], "new@example.com");
}

#[tokio::test]
async fn create_user_validates_input() {
    let server = MockServer::start().await;
    let app = app(&server.uri(), None);
    let token = token_for(Uuid::new_v4(), ADMIN_EMAIL);

    for body in [
        json!({"email": "not-an-email", "password": "secret123"}),
        json!({"email": "new@example.com", "password": "123"}),
        json!({"email": "new@example.com"}),
    ] {
        let response = send(
            &app,
            post_json_authed("/api/admin/create-user", &token, body.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn create_user_reports_duplicate_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": 422,
            "msg": "A user with this email address has already been registered"
        })))
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let token = token_for(Uuid::new_v4(), ADMIN_EMAIL);
    let response = send(
        &app,
        post_json_authed(
            "/api/admin/create-user",
            &token,
            json!({"email": "taken@example.com", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "A user with this email address has already been registered"
    );
}

#[tokio::test]
async fn create_user_maps_supabase_outage_to_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let token = token_for(Uuid::new_v4(), ADMIN_EMAIL);
    let response = send(
        &app,
        post_json_authed(
            "/api/admin/create-user",
            &token,
            json!({"email": "new@example.com", "password": "secret123"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn subscription_defaults_to_inactive() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_subscriptions"))
        .and(query_param("user_id", format!("eq.{}", user_id).as_str()))
        .respond_with(ResponseTemplate::new(406))
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let response = send(
        &app,
        get_authed("/api/subscription", &token_for(user_id, "learner@example.com")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "inactive");
    assert_eq!(json["active"], false);
}

#[tokio::test]
async fn subscription_reports_active_plan() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": user_id,
            "stripe_customer_id": "cus_1",
            "stripe_subscription_id": "sub_1",
            "status": "trialing",
            "plan": "premium",
            "current_period_end": "2030-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let response = send(
        &app,
        get_authed("/api/subscription", &token_for(user_id, "learner@example.com")),
    )
    .await;

    let json = body_json(response).await;
    assert_eq!(json["status"], "trialing");
    assert_eq!(json["active"], true);
    assert_eq!(json["plan"], "premium");
    assert!(json["currentPeriodEnd"].is_string());
}

#[tokio::test]
async fn checkout_creates_subscription_session() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("mode=subscription"))
        .and(body_string_contains("price_default"))
        .and(body_string_contains(user_id.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "url": "https://checkout.stripe.com/c/pay/cs_test_1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let request = Request::post("/api/create-checkout-session")
        .header("authorization", format!("Bearer {}", token_for(user_id, "learner@example.com")))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["sessionId"], "cs_test_1");
    assert_eq!(json["url"], "https://checkout.stripe.com/c/pay/cs_test_1");
}

#[tokio::test]
async fn checkout_honours_requested_price() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("price_yearly"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_2",
            "url": "https://checkout.stripe.com/c/pay/cs_test_2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let response = send(
        &app,
        post_json_authed(
            "/api/create-checkout-session",
            &token_for(Uuid::new_v4(), "learner@example.com"),
            json!({"priceId": "price_yearly"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn portal_requires_existing_customer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_subscriptions"))
        .respond_with(ResponseTemplate::new(406))
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let request = Request::post("/api/create-portal-session")
        .header(
            "authorization",
            format!("Bearer {}", token_for(Uuid::new_v4(), "learner@example.com")),
        )
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn portal_returns_stripe_url() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": user_id,
            "stripe_customer_id": "cus_42",
            "status": "active"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/billing_portal/sessions"))
        .and(body_string_contains("customer=cus_42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "bps_1",
            "url": "https://billing.stripe.com/p/session/bps_1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let request = Request::post("/api/create-portal-session")
        .header("authorization", format!("Bearer {}", token_for(user_id, "learner@example.com")))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["url"],
        "https://billing.stripe.com/p/session/bps_1"
    );
}

#[tokio::test]
async fn history_limit_is_clamped() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/practice_history"))
        .and(query_param("limit", "100"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let response = send(
        &app,
        get_authed("/api/history?limit=5000", &token_for(user_id, "learner@example.com")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["entries"], json!([]));
}

#[tokio::test]
async fn negative_history_limit_is_raised_to_one() {
    let server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path("/rest/v1/practice_history"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let app = app(&server.uri(), None);
    let response = send(
        &app,
        get_authed("/api/history?limit=-5", &token_for(user_id, "learner@example.com")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_numeric_history_limit_is_json_bad_request() {
    let server = MockServer::start().await;
    let app = app(&server.uri(), None);

    let response = send(
        &app,
        get_authed(
            "/api/history?limit=abc",
            &token_for(Uuid::new_v4(), "learner@example.com"),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}
