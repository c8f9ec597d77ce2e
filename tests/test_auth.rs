mod common;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::Value;
use std::sync::{atomic::Ordering, Arc};
use std::time::Duration;

use common::{
    sign_token, spawn_counting_jwks_server, spawn_jwks_server, valid_token, OTHER_PRIVATE_KEY,
    TEST_KID, TEST_PRIVATE_KEY,
};
use dedicated_portal::{
    auth::AuthError, server::customers_router, services::DemoCustomersService, AuthService,
    CustomersState, CUSTOMERS_OPENAPI,
};

const CUSTOMERS_PATH: &str = "/api/customers_mgmt/v1/customers";

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

async fn protected_server() -> TestServer {
    let auth = AuthService::new(&spawn_jwks_server().await).unwrap();
    let state = CustomersState::new(Arc::new(DemoCustomersService::new()), CUSTOMERS_OPENAPI);
    TestServer::new(customers_router(state, Some(auth))).unwrap()
}

#[tokio::test]
async fn test_valid_token_is_accepted() {
    let server = protected_server().await;

    let response = server
        .get(CUSTOMERS_PATH)
        .add_header(header::AUTHORIZATION, bearer(&valid_token()))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let server = protected_server().await;

    let response = server.get(CUSTOMERS_PATH).await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_non_bearer_header_is_rejected() {
    let server = protected_server().await;

    let response = server
        .get(CUSTOMERS_PATH)
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_key_is_rejected() {
    let server = protected_server().await;
    let token = sign_token(Some(TEST_KID), OTHER_PRIVATE_KEY, 3600);

    let response = server
        .get(CUSTOMERS_PATH)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let server = protected_server().await;
    let token = sign_token(Some(TEST_KID), TEST_PRIVATE_KEY, -3600);

    let response = server
        .get(CUSTOMERS_PATH)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_key_id_is_rejected() {
    let server = protected_server().await;
    let token = sign_token(Some("rotated-away"), TEST_PRIVATE_KEY, 3600);

    let response = server
        .get(CUSTOMERS_PATH)
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_every_customer_route_is_protected() {
    let server = protected_server().await;

    let by_id = server
        .get("/api/customers_mgmt/v1/customers/2b7c9d41-0e2a-4f86-8b53-5d6e7f809a12")
        .await;
    assert_eq!(by_id.status_code(), StatusCode::UNAUTHORIZED);

    let create = server
        .post(CUSTOMERS_PATH)
        .json(&serde_json::json!({ "name": "Hooli" }))
        .await;
    assert_eq!(create.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_and_health_are_public() {
    let server = protected_server().await;

    let openapi = server.get("/api/customers_mgmt/v1/openapi").await;
    assert_eq!(openapi.status_code(), StatusCode::OK);
    assert_eq!(openapi.as_bytes().as_ref(), CUSTOMERS_OPENAPI);

    let health = server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_demo_mode_needs_no_token() {
    let state = CustomersState::new(Arc::new(DemoCustomersService::new()), CUSTOMERS_OPENAPI);
    let server = TestServer::new(customers_router(state, None)).unwrap();

    let response = server.get(CUSTOMERS_PATH).await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_unreachable_key_endpoint_is_a_server_error() {
    // Nothing listens on port 9 locally
    let auth = AuthService::new("http://127.0.0.1:9/certs").unwrap();
    let state = CustomersState::new(Arc::new(DemoCustomersService::new()), CUSTOMERS_OPENAPI);
    let server = TestServer::new(customers_router(state, Some(auth))).unwrap();

    let response = server
        .get(CUSTOMERS_PATH)
        .add_header(header::AUTHORIZATION, bearer(&valid_token()))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_validate_token_returns_claims() {
    let auth = AuthService::new(&spawn_jwks_server().await).unwrap();

    let claims = auth.validate_token(&valid_token()).await.unwrap();

    assert_eq!(claims.sub.as_deref(), Some("portal-user"));
    assert_eq!(claims.extra["aud"], "account");
}

#[tokio::test]
async fn test_token_without_kid_is_rejected() {
    let auth = AuthService::new(&spawn_jwks_server().await).unwrap();
    let token = sign_token(None, TEST_PRIVATE_KEY, 3600);

    let err = auth.validate_token(&token).await.unwrap_err();

    assert!(matches!(err, AuthError::MissingKeyId));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_key_set_is_fetched_once_while_fresh() {
    let (url, hits) = spawn_counting_jwks_server().await;
    let auth = AuthService::new(&url).unwrap();

    for _ in 0..3 {
        auth.validate_token(&valid_token()).await.unwrap();
    }

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_kid_refetches_key_set() {
    let (url, hits) = spawn_counting_jwks_server().await;
    let auth = AuthService::new(&url).unwrap();

    auth.validate_token(&valid_token()).await.unwrap();
    let unknown = sign_token(Some("rotated-in"), TEST_PRIVATE_KEY, 3600);
    let err = auth.validate_token(&unknown).await.unwrap_err();

    assert!(matches!(err, AuthError::UnknownKey(kid) if kid == "rotated-in"));
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // Known keys are still served from the refreshed set
    auth.validate_token(&valid_token()).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_expired_key_set_is_refetched() {
    let (url, hits) = spawn_counting_jwks_server().await;
    let auth = AuthService::new(&url)
        .unwrap()
        .with_key_set_ttl(Duration::ZERO);

    auth.validate_token(&valid_token()).await.unwrap();
    auth.validate_token(&valid_token()).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_router_clones_share_the_key_set() {
    let (url, hits) = spawn_counting_jwks_server().await;
    let auth = AuthService::new(&url).unwrap();
    let state = CustomersState::new(Arc::new(DemoCustomersService::new()), CUSTOMERS_OPENAPI);
    let server = TestServer::new(customers_router(state, Some(auth))).unwrap();

    for _ in 0..3 {
        let response = server
            .get(CUSTOMERS_PATH)
            .add_header(header::AUTHORIZATION, bearer(&valid_token()))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
