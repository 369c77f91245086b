//! Daily quote integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{bearer, constants, TestHarness};

#[tokio::test]
async fn test_quote_is_unwrapped() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness
        .perplexity
        .mock_completion(
            constants::TEST_PERPLEXITY_API_KEY,
            "\"Distance is not for the fearful.\" - Unknown",
        )
        .await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/daily-quote")
        .add_header(name, value)
        .json(&json!({"mood": "hopeful"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["mood"], "hopeful");
    assert!(body["quote"]
        .as_str()
        .unwrap()
        .starts_with("Distance is not for the fearful."));

    let sent = harness.perplexity.request_bodies().await;
    assert_eq!(sent[0]["model"], "sonar-small");
    assert!(sent[0]["messages"][1]["content"]
        .as_str()
        .unwrap()
        .contains("hopeful"));

    // The quote goes to Perplexity, never to OpenAI
    assert!(harness.openai.request_bodies().await.is_empty());
}

#[tokio::test]
async fn test_quote_without_body() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness
        .perplexity
        .mock_completion(constants::TEST_PERPLEXITY_API_KEY, "Love is patient.")
        .await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/daily-quote")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["quote"], "Love is patient.");
    assert!(body.get("mood").is_none());
}

#[tokio::test]
async fn test_overlong_mood_is_400() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/daily-quote")
        .add_header(name, value)
        .json(&json!({"mood": "x".repeat(200)}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
