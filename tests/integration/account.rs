//! Password change and account deletion integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{bearer, constants, TestHarness};

fn admin_user_path() -> String {
    format!("/auth/v1/admin/users/{}", constants::TEST_USER_ID)
}

#[tokio::test]
async fn test_change_password_updates_and_audits() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness.baas.mock_update_user(constants::TEST_USER_ID, 200).await;
    harness.baas.mock_insert("security_audit_logs", 201).await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/change-password")
        .add_header(name, value)
        .json(&json!({"new_password": "correct horse battery"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let updates = harness.baas.requests_to("PUT", &admin_user_path()).await;
    assert_eq!(updates.len(), 1);
    let update: Value = serde_json::from_slice(&updates[0].body).unwrap();
    assert_eq!(update["password"], "correct horse battery");

    let audits = harness
        .baas
        .requests_to("POST", "/rest/v1/security_audit_logs")
        .await;
    assert_eq!(audits.len(), 1);
    let audit: Value = serde_json::from_slice(&audits[0].body).unwrap();
    assert_eq!(audit["event_type"], "password_changed");
    assert_eq!(audit["user_id"], constants::TEST_USER_ID);
}

#[tokio::test]
async fn test_short_password_never_reaches_baas() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/change-password")
        .add_header(name, value)
        .json(&json!({"new_password": "short"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(harness.baas.requests_to("PUT", &admin_user_path()).await.is_empty());
}

#[tokio::test]
async fn test_audit_failure_does_not_fail_password_change() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness.baas.mock_update_user(constants::TEST_USER_ID, 200).await;
    harness.baas.mock_insert("security_audit_logs", 500).await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/change-password")
        .add_header(name, value)
        .json(&json!({"new_password": "correct horse battery"}))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_admin_api_failure_is_502() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness.baas.mock_update_user(constants::TEST_USER_ID, 422).await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/change-password")
        .add_header(name, value)
        .json(&json!({"new_password": "correct horse battery"}))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/delete-account")
        .add_header(name, value)
        .json(&json!({"confirm": false}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(harness
        .baas
        .requests_to("DELETE", &admin_user_path())
        .await
        .is_empty());
}

#[tokio::test]
async fn test_delete_audits_first_and_forgets_token() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness.baas.mock_insert("security_audit_logs", 201).await;
    harness.baas.mock_delete_user(constants::TEST_USER_ID, 200).await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/delete-account")
        .add_header(name, value)
        .json(&json!({"confirm": true}))
        .await;

    response.assert_status_ok();

    let requests = harness.baas.received_requests().await;
    let audit_at = requests
        .iter()
        .position(|r| r.url.path() == "/rest/v1/security_audit_logs")
        .unwrap();
    let delete_at = requests
        .iter()
        .position(|r| r.method.as_str() == "DELETE" && r.url.path() == admin_user_path())
        .unwrap();
    assert!(audit_at < delete_at);

    let audit: Value = serde_json::from_slice(&requests[audit_at].body).unwrap();
    assert_eq!(audit["event_type"], "account_deleted");

    assert!(harness.state.token_cache.is_empty());
}

#[tokio::test]
async fn test_delete_aborts_when_audit_fails() {
    let harness = TestHarness::new().await;
    harness.login_as_test_user().await;
    harness.baas.mock_insert("security_audit_logs", 500).await;
    harness.baas.mock_delete_user(constants::TEST_USER_ID, 200).await;

    let (name, value) = bearer(constants::TEST_TOKEN);
    let response = harness
        .server
        .post("/functions/delete-account")
        .add_header(name, value)
        .json(&json!({"confirm": true}))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert!(harness
        .baas
        .requests_to("DELETE", &admin_user_path())
        .await
        .is_empty());
}
