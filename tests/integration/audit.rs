//! Admin audit integration tests

use axum::http::{HeaderName, HeaderValue, StatusCode};
use serde_json::{json, Value};

use crate::common::{bearer, constants, TestHarness};

#[tokio::test]
async fn test_admin_action_is_recorded() {
    let harness = TestHarness::new().await;
    harness.login_as_admin().await;
    harness.baas.mock_insert("admin_audit_logs", 201).await;

    let (name, value) = bearer(constants::ADMIN_TOKEN);
    let response = harness
        .server
        .post("/functions/admin-audit")
        .add_header(name, value)
        .add_header(
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        )
        .add_header(
            HeaderName::from_static("user-agent"),
            HeaderValue::from_static("AdminDashboard/1.0"),
        )
        .json(&json!({
            "action": "suspend_user",
            "target_type": "user",
            "target_id": "user_999",
            "details": {"reason": "spam"}
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let inserts = harness
        .baas
        .requests_to("POST", "/rest/v1/admin_audit_logs")
        .await;
    assert_eq!(inserts.len(), 1);
    let row: Value = serde_json::from_slice(&inserts[0].body).unwrap();
    assert_eq!(row["admin_id"], constants::ADMIN_USER_ID);
    assert_eq!(row["action"], "suspend_user");
    assert_eq!(row["target_id"], "user_999");
    assert_eq!(row["details"]["reason"], "spam");
    assert_eq!(row["ip_address"], "203.0.113.9");
    assert_eq!(row["user_agent"], "AdminDashboard/1.0");
    assert!(row["created_at"].is_string());
}

#[tokio::test]
async fn test_non_admin_is_forbidden() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/admin-audit")
        .add_header(name, value)
        .json(&json!({"action": "suspend_user"}))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert!(harness
        .baas
        .requests_to("POST", "/rest/v1/admin_audit_logs")
        .await
        .is_empty());
}

#[tokio::test]
async fn test_blank_action_is_400() {
    let harness = TestHarness::new().await;
    harness.login_as_admin().await;

    let (name, value) = bearer(constants::ADMIN_TOKEN);
    let response = harness
        .server
        .post("/functions/admin-audit")
        .add_header(name, value)
        .json(&json!({"action": "  "}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
