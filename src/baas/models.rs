//! BaaS data models
//!
//! Shapes of the auth user, table rows, and admin API payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tiers::Tier;

/// User returned by the auth `user` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub app_metadata: Value,
    #[serde(default)]
    pub user_metadata: Value,
}

/// Row of the `profiles` table, restricted to what the functions read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub subscription_tier: Option<Tier>,
}

impl Profile {
    /// Effective tier; profiles without one are on the free tier
    pub fn tier(&self) -> Tier {
        self.subscription_tier.unwrap_or_default()
    }
}

/// Row written to `security_audit_logs` for account-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAuditEntry {
    pub user_id: String,
    pub event_type: String,
    #[serde(default)]
    pub details: Value,
    pub created_at: String,
}

/// Row written to `admin_audit_logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAuditEntry {
    pub admin_id: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default)]
    pub details: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub created_at: String,
}

/// Row of the `push_subscriptions` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub id: String,
    pub user_id: String,
    pub endpoint: String,
    #[serde(default)]
    pub p256dh: Option<String>,
    #[serde(default)]
    pub auth: Option<String>,
}

/// Body of the admin user update call
#[derive(Debug, Clone, Serialize)]
pub struct AdminUserUpdate<'a> {
    pub password: &'a str,
}
