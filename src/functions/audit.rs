//! Admin action audit logger

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{require_admin, AppJson};
use crate::{
    baas::AdminAuditEntry,
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    AppState,
};

pub const ADMIN_AUDIT_TABLE: &str = "admin_audit_logs";

#[derive(Debug, Clone, Deserialize)]
pub struct AdminAuditRequest {
    pub action: String,
    #[serde(default)]
    pub target_type: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Serialize)]
pub struct AdminAuditResponse {
    pub success: bool,
}

/// First address of `x-forwarded-for`, else `x-real-ip`
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// POST /functions/admin-audit
pub async fn admin_audit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    AppJson(request): AppJson<AdminAuditRequest>,
) -> AppResult<Json<AdminAuditResponse>> {
    let action = request.action.trim();
    if action.is_empty() {
        return Err(AppError::BadRequest("action is required".to_string()));
    }

    require_admin(&state, &user).await?;

    let entry = AdminAuditEntry {
        admin_id: user.user_id.clone(),
        action: action.to_string(),
        target_type: request.target_type,
        target_id: request.target_id,
        details: request.details,
        ip_address: client_ip(&headers),
        user_agent: user_agent(&headers),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    info!(step = "insert", admin_id = %entry.admin_id, action = %entry.action, "Recording admin action");
    state.baas.insert_row(ADMIN_AUDIT_TABLE, &entry).await?;

    Ok(Json(AdminAuditResponse { success: true }))
}
