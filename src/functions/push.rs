//! Push notification sender
//!
//! Reads the target user's stored subscriptions and POSTs the payload to
//! every endpoint concurrently. Endpoints answering 404 or 410 are gone for
//! good and their subscription rows are removed.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use futures::future::join_all;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{caller_profile, AppJson};
use crate::{
    baas::PushSubscription,
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedUser,
    offline::events::PushPayload,
    routes::metrics::record_push_deliveries,
    AppState,
};

/// Seconds a push service keeps an undelivered message
pub const PUSH_TTL_SECS: u32 = 86_400;

#[derive(Debug, Clone, Deserialize)]
pub struct SendPushRequest {
    pub user_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl SendPushRequest {
    fn payload(&self) -> PushPayload {
        PushPayload {
            title: Some(self.title.clone()),
            body: Some(self.body.clone()),
            url: self.url.clone(),
            tag: self.tag.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendPushResponse {
    pub success: bool,
    pub sent: usize,
    pub failed: usize,
    pub removed: usize,
}

/// Result of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    Failed,
    Gone,
}

fn classify_status(status: StatusCode) -> Delivery {
    if status.is_success() {
        Delivery::Sent
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        Delivery::Gone
    } else {
        Delivery::Failed
    }
}

async fn deliver(
    client: &reqwest::Client,
    vapid_public_key: Option<&str>,
    subscription: &PushSubscription,
    payload: &PushPayload,
) -> Delivery {
    let mut request = client
        .post(&subscription.endpoint)
        .header("TTL", PUSH_TTL_SECS.to_string())
        .header("Urgency", "normal")
        .json(payload);
    if let Some(key) = vapid_public_key {
        request = request.header("Crypto-Key", format!("p256ecdsa={}", key));
    }

    match request.send().await {
        Ok(response) => {
            let delivery = classify_status(response.status());
            debug!(
                subscription_id = %subscription.id,
                status = %response.status(),
                "Push endpoint answered"
            );
            delivery
        }
        Err(e) => {
            warn!(subscription_id = %subscription.id, error = %e, "Push delivery failed");
            Delivery::Failed
        }
    }
}

/// POST /functions/send-push
pub async fn send_push(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    AppJson(request): AppJson<SendPushRequest>,
) -> AppResult<Json<SendPushResponse>> {
    if request.user_id.trim().is_empty() || request.title.trim().is_empty() {
        return Err(AppError::BadRequest(
            "user_id and title are required".to_string(),
        ));
    }

    // Sending to someone else is an admin action
    if request.user_id != user.user_id && !caller_profile(&state, &user).await?.is_admin {
        return Err(AppError::Forbidden);
    }

    let subscriptions = state
        .baas
        .list_push_subscriptions(&request.user_id)
        .await?;
    info!(
        step = "deliver",
        target = %request.user_id,
        subscriptions = subscriptions.len(),
        "Sending push notification"
    );

    let payload = request.payload();
    let vapid = state.config.vapid_public_key.as_deref();
    let outcomes = join_all(
        subscriptions
            .iter()
            .map(|s| deliver(&state.http_client, vapid, s, &payload)),
    )
    .await;

    let mut sent = 0;
    let mut failed = 0;
    let mut removed = 0;
    for (subscription, outcome) in subscriptions.iter().zip(outcomes) {
        match outcome {
            Delivery::Sent => sent += 1,
            Delivery::Failed => failed += 1,
            Delivery::Gone => {
                failed += 1;
                match state.baas.delete_push_subscription(&subscription.id).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(
                        subscription_id = %subscription.id,
                        error = %e,
                        "Failed to remove stale subscription"
                    ),
                }
            }
        }
    }

    record_push_deliveries("sent", sent as u64);
    record_push_deliveries("failed", failed as u64);
    info!(step = "done", sent, failed, removed, "Push notification sent");

    Ok(Json(SendPushResponse {
        success: true,
        sent,
        failed,
        removed,
    }))
}
