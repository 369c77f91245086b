//! Bearer authentication integration tests

use axum::http::{header, HeaderValue, StatusCode};
use serde_json::{json, Value};

use crate::common::{bearer, constants, TestHarness};
use crate::mocks::sample_volume;

#[tokio::test]
async fn test_missing_authorization_is_401() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/functions/book-lookup")
        .json(&json!({"title": "Anything"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_rejected() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/functions/book-lookup")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"))
        .json(&json!({"title": "Anything"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_token_rejected_by_baas() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;

    let (name, value) = bearer("expired-token");
    let response = harness
        .server
        .post("/functions/book-lookup")
        .add_header(name, value)
        .json(&json!({"title": "Anything"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_validated_token_is_cached() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness
        .books
        .mock_volumes("intitle:The 5 Love Languages", vec![sample_volume()])
        .await;

    for _ in 0..3 {
        let (name, value) = bearer(constants::TEST_TOKEN);
        harness
            .server
            .post("/functions/book-lookup")
            .add_header(name, value)
            .json(&json!({"title": "The 5 Love Languages"}))
            .await
            .assert_status_ok();
    }

    let lookups = harness.baas.requests_to("GET", "/auth/v1/user").await;
    assert_eq!(lookups.len(), 1);
    assert_eq!(harness.state.token_cache.len(), 1);
}

#[tokio::test]
async fn test_cors_preflight_is_answered() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .method(axum::http::Method::OPTIONS, "/functions/send-push")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://lovebeyondborders.app"))
        .add_header(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            HeaderValue::from_static("POST"),
        )
        .await;

    response.assert_status_ok();
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
