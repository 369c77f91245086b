//! BaaS API client
//!
//! HTTP client for the auth, admin and REST endpoints of the backend
//! platform. Calls made on behalf of the service use the service-role key.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::{
    baas::models::{AdminUserUpdate, AuthUser, Profile, PushSubscription},
    config::Config,
    error::{AppError, AppResult},
};

/// BaaS API client
pub struct BaasClient {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    auth_key: String,
}

impl BaasClient {
    /// Create a new BaaS client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.supabase_url.clone(),
            service_key: config.supabase_service_role_key.clone(),
            auth_key: config.auth_api_key().to_string(),
        }
    }

    /// Resolve the user owning a bearer token
    #[instrument(skip_all)]
    pub async fn get_user(&self, token: &str) -> AppResult<AuthUser> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.auth_key)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "Auth user response status");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AppError::InvalidToken);
        }
        let response = Self::ensure_success(response, "auth user").await?;

        let user: AuthUser = response.json().await?;
        Ok(user)
    }

    /// Fetch a profile row by user id
    #[instrument(skip(self))]
    pub async fn get_profile(&self, user_id: &str) -> AppResult<Option<Profile>> {
        let url = format!("{}/rest/v1/profiles", self.base_url);

        let response = self
            .client
            .get(&url)
            .headers(self.service_headers())
            .query(&[
                ("id", format!("eq.{}", user_id)),
                ("select", "id,is_admin,subscription_tier".to_string()),
            ])
            .send()
            .await?;

        let response = Self::ensure_success(response, "profile lookup").await?;
        let mut rows: Vec<Profile> = response.json().await?;
        Ok(rows.pop())
    }

    /// Set a new password through the admin API
    #[instrument(skip(self, password))]
    pub async fn update_user_password(&self, user_id: &str, password: &str) -> AppResult<()> {
        let url = format!("{}/auth/v1/admin/users/{}", self.base_url, user_id);

        let response = self
            .client
            .put(&url)
            .headers(self.service_headers())
            .json(&AdminUserUpdate { password })
            .send()
            .await?;

        Self::ensure_success(response, "admin password update").await?;
        Ok(())
    }

    /// Delete a user through the admin API
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> AppResult<()> {
        let url = format!("{}/auth/v1/admin/users/{}", self.base_url, user_id);

        let response = self
            .client
            .delete(&url)
            .headers(self.service_headers())
            .send()
            .await?;

        Self::ensure_success(response, "admin user delete").await?;
        Ok(())
    }

    /// Insert a single row into a table
    #[instrument(skip(self, row))]
    pub async fn insert_row<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> AppResult<()> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);

        let response = self
            .client
            .post(&url)
            .headers(self.service_headers())
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        Self::ensure_success(response, table).await?;
        Ok(())
    }

    /// Push subscriptions registered by a user
    #[instrument(skip(self))]
    pub async fn list_push_subscriptions(&self, user_id: &str) -> AppResult<Vec<PushSubscription>> {
        let url = format!("{}/rest/v1/push_subscriptions", self.base_url);

        let response = self
            .client
            .get(&url)
            .headers(self.service_headers())
            .query(&[
                ("user_id", format!("eq.{}", user_id)),
                ("select", "id,user_id,endpoint,p256dh,auth".to_string()),
            ])
            .send()
            .await?;

        let response = Self::ensure_success(response, "push subscriptions").await?;
        Ok(response.json().await?)
    }

    /// Remove a push subscription
    #[instrument(skip(self))]
    pub async fn delete_push_subscription(&self, id: &str) -> AppResult<()> {
        let url = format!("{}/rest/v1/push_subscriptions", self.base_url);

        let response = self
            .client
            .delete(&url)
            .headers(self.service_headers())
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;

        Self::ensure_success(response, "push subscription delete").await?;
        Ok(())
    }

    /// Check that the auth service answers
    pub async fn ping(&self) -> AppResult<()> {
        let url = format!("{}/auth/v1/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.auth_key)
            .send()
            .await?;

        Self::ensure_success(response, "auth health").await?;
        Ok(())
    }

    /// Headers for calls made as the service role
    fn service_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.service_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.service_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    async fn ensure_success(
        response: reqwest::Response,
        context: &str,
    ) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        error!(status = %status, body = %text, context, "BaaS request failed");

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("{} not found", context)));
        }

        Err(AppError::UpstreamError(format!(
            "BaaS {} error {}: {}",
            context, status, text
        )))
    }
}
