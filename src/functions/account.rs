//! Password change and account deletion

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::AppJson;
use crate::{
    baas::SecurityAuditEntry,
    error::{AppError, AppResult},
    middleware::auth::{extract_bearer_token, hash_token, AuthenticatedUser},
    AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;
/// bcrypt ignores anything past 72 bytes
pub const MAX_PASSWORD_LEN: usize = 72;

pub const SECURITY_AUDIT_TABLE: &str = "security_audit_logs";

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteAccountRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub success: bool,
    pub message: &'static str,
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at most {} bytes",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn security_entry(user: &AuthenticatedUser, event_type: &str) -> SecurityAuditEntry {
    SecurityAuditEntry {
        user_id: user.user_id.clone(),
        event_type: event_type.to_string(),
        details: json!({ "email": user.email }),
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// POST /functions/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    AppJson(request): AppJson<ChangePasswordRequest>,
) -> AppResult<Json<AccountResponse>> {
    validate_password(&request.new_password)?;

    info!(step = "update", user_id = %user.user_id, "Changing password");
    state
        .baas
        .update_user_password(&user.user_id, &request.new_password)
        .await?;

    // The password is already changed at this point
    let entry = security_entry(&user, "password_changed");
    if let Err(e) = state.baas.insert_row(SECURITY_AUDIT_TABLE, &entry).await {
        warn!(step = "audit", user_id = %user.user_id, error = %e, "Failed to write audit row");
    }

    Ok(Json(AccountResponse {
        success: true,
        message: "Password updated",
    }))
}

/// POST /functions/delete-account
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    AppJson(request): AppJson<DeleteAccountRequest>,
) -> AppResult<Json<AccountResponse>> {
    if !request.confirm {
        return Err(AppError::BadRequest(
            "Account deletion must be confirmed".to_string(),
        ));
    }

    info!(step = "audit", user_id = %user.user_id, "Recording account deletion");
    let entry = security_entry(&user, "account_deleted");
    state.baas.insert_row(SECURITY_AUDIT_TABLE, &entry).await?;

    info!(step = "delete", user_id = %user.user_id, "Deleting account");
    state.baas.delete_user(&user.user_id).await?;

    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
    {
        state.token_cache.remove(&hash_token(token));
    }

    Ok(Json(AccountResponse {
        success: true,
        message: "Account deleted",
    }))
}
