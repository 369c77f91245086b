//! Rate limiting integration tests
//!
//! Tests for the rate limiting middleware:
//! - Basic rate limiting behavior (allowed/denied)
//! - Rate limit headers (X-RateLimit-Limit, X-RateLimit-Remaining, X-RateLimit-Reset)
//! - 429 Too Many Requests responses with Retry-After header
//! - Reset-window behavior driven by a manual clock
//! - Per-user and per-family isolation

use axum::http::{header, StatusCode};
use serde_json::{json, Value};

use crate::common::{bearer, constants, TestHarness};
use crate::mocks::sample_volume;

/// Window of the account-management family
const AUTH_WINDOW_MS: u64 = 15 * 60 * 1000;

async fn change_password(harness: &TestHarness, token: &str) -> axum_test::TestResponse {
    let (name, value) = bearer(token);
    harness
        .server
        .post("/functions/change-password")
        .add_header(name, value)
        .json(&json!({"new_password": "short"}))
        .await
}

fn header_str<'a>(response: &'a axum_test::TestResponse, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_headers_count_down() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;

    let first = change_password(&harness, constants::TEST_TOKEN).await;
    assert_eq!(header_str(&first, "x-ratelimit-limit"), "5");
    assert_eq!(header_str(&first, "x-ratelimit-remaining"), "4");
    assert_eq!(header_str(&first, "x-ratelimit-reset"), "900");

    let second = change_password(&harness, constants::TEST_TOKEN).await;
    assert_eq!(header_str(&second, "x-ratelimit-remaining"), "3");
}

#[tokio::test]
async fn test_sixth_attempt_is_429_until_window_resets() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;

    for _ in 0..5 {
        let response = change_password(&harness, constants::TEST_TOKEN).await;
        // Validation fails, but the attempt still counts
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    harness.clock.advance(60_000);
    let limited = change_password(&harness, constants::TEST_TOKEN).await;
    limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header_str(&limited, "x-ratelimit-remaining"), "0");
    let expected_retry = ((AUTH_WINDOW_MS - 60_000) / 1000).to_string();
    assert_eq!(
        header_str(&limited, header::RETRY_AFTER.as_str()),
        expected_retry
    );
    let body: Value = limited.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "RATE_LIMITED");

    harness.clock.advance(AUTH_WINDOW_MS);
    change_password(&harness, constants::TEST_TOKEN)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_families_are_limited_independently() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness
        .books
        .mock_volumes("intitle:Attached", vec![sample_volume()])
        .await;

    for _ in 0..6 {
        change_password(&harness, constants::TEST_TOKEN).await;
    }
    change_password(&harness, constants::TEST_TOKEN)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/book-lookup")
        .add_header(name, value)
        .json(&json!({"title": "Attached"}))
        .await;
    response.assert_status_ok();
    assert_eq!(header_str(&response, "x-ratelimit-limit"), "60");
}

#[tokio::test]
async fn test_users_are_limited_independently() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness.login_as_admin().await;

    for _ in 0..5 {
        change_password(&harness, constants::TEST_TOKEN).await;
    }
    change_password(&harness, constants::TEST_TOKEN)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    change_password(&harness, constants::ADMIN_TOKEN)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unauthenticated_requests_do_not_consume_allowance() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;

    for _ in 0..10 {
        harness
            .server
            .post("/functions/change-password")
            .json(&json!({"new_password": "short"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    let response = change_password(&harness, constants::TEST_TOKEN).await;
    assert_eq!(header_str(&response, "x-ratelimit-remaining"), "4");
}
