//! Book lookup integration tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{bearer, constants, TestHarness};
use crate::mocks::sample_volume;

#[tokio::test]
async fn test_lookup_by_title_and_author() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness
        .books
        .mock_volumes(
            "intitle:The 5 Love Languages inauthor:Gary Chapman",
            vec![sample_volume()],
        )
        .await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/book-lookup")
        .add_header(name, value)
        .json(&json!({"title": "The 5 Love Languages", "author": "Gary Chapman"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["book"]["title"], "The 5 Love Languages");
    assert_eq!(body["book"]["authors"], json!(["Gary Chapman"]));
    assert_eq!(body["book"]["isbn"], "9780802412706");
    assert!(body["book"]["thumbnail"]
        .as_str()
        .unwrap()
        .starts_with("https://"));

    let trace_id = response.headers().get("x-trace-id").unwrap();
    assert_eq!(trace_id.len(), 8);

    let affiliate = body["affiliate_url"].as_str().unwrap();
    assert!(affiliate.starts_with("https://www.amazon.com/s?k="));
    assert!(affiliate.ends_with(&format!("&tag={}", constants::TEST_ASSOCIATE_TAG)));
}

#[tokio::test]
async fn test_lookup_by_isbn_normalizes_input() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness
        .books
        .mock_volumes("isbn:9780802412706", vec![sample_volume()])
        .await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/book-lookup")
        .add_header(name, value)
        .json(&json!({"isbn": "978-0-8024-1270-6"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["book"]["isbn"], "9780802412706");
}

#[tokio::test]
async fn test_lookup_without_query_is_400() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/book-lookup")
        .add_header(name, value)
        .json(&json!({}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_lookup_without_results_is_404() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness.books.mock_no_volumes().await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/book-lookup")
        .add_header(name, value)
        .json(&json!({"title": "A book nobody wrote"}))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/book-lookup")
        .add_header(name, value)
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}
