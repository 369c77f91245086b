//! Background sync, push and notification-click handling

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::network::Network;
use super::policy::FetchRequest;

/// Title used when a push arrives without one
pub const DEFAULT_TITLE: &str = "Love Beyond Borders";
pub const DEFAULT_BODY: &str = "You have a new update";
pub const DEFAULT_ICON: &str = "/icons/icon-192x192.png";
pub const DEFAULT_BADGE: &str = "/icons/badge-72x72.png";

/// Tag under which failed API writes are queued for replay
pub const OUTBOX_SYNC_TAG: &str = "sync-requests";

/// Requests the outbox holds unless configured otherwise
pub const DEFAULT_OUTBOX_CAPACITY: usize = 100;

/// Payload sent by the push function and read by the worker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
}

/// Options for the notification shown on push
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationOptions {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// Build notification options from a raw push payload
///
/// Missing or non-JSON payloads fall back to defaults; a plain-text
/// payload becomes the body.
pub fn notification_from_push(payload: Option<&[u8]>) -> NotificationOptions {
    let parsed = match payload {
        None => PushPayload::default(),
        Some(bytes) => serde_json::from_slice::<PushPayload>(bytes).unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(bytes).trim().to_string();
            PushPayload {
                body: (!text.is_empty()).then_some(text),
                ..Default::default()
            }
        }),
    };

    NotificationOptions {
        title: parsed.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        body: parsed.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
        icon: parsed.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
        badge: parsed.badge.unwrap_or_else(|| DEFAULT_BADGE.to_string()),
        tag: parsed.tag,
        data: NotificationData {
            url: parsed.url.unwrap_or_else(|| "/".to_string()),
        },
        actions: vec![
            NotificationAction {
                action: "open".to_string(),
                title: "Open".to_string(),
            },
            NotificationAction {
                action: "dismiss".to_string(),
                title: "Dismiss".to_string(),
            },
        ],
    }
}

/// URL to focus or open when a notification is clicked, `None` to do nothing
pub fn notification_click_target(
    action: Option<&str>,
    data: &NotificationData,
    origin: &reqwest::Url,
) -> Option<reqwest::Url> {
    if action == Some("dismiss") {
        return None;
    }
    let target = origin.join(&data.url).ok()?;
    // Never navigate a client off-origin.
    if target.origin() != origin.origin() {
        return origin.join("/").ok();
    }
    Some(target)
}

/// Requests waiting for connectivity
#[derive(Debug, Clone)]
pub struct QueuedRequest {
    pub tag: String,
    pub request: FetchRequest,
}

/// Outcome of draining the outbox for one tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub sent: usize,
    pub failed: usize,
}

/// Bounded queue of writes replayed on `sync`
///
/// Once full, new requests are refused and the queued ones are kept.
#[derive(Debug)]
pub struct Outbox {
    items: Mutex<Vec<QueuedRequest>>,
    capacity: usize,
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Outbox {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_OUTBOX_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue a request, returning false when the outbox is full
    pub fn enqueue(&self, tag: &str, request: FetchRequest) -> bool {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        if items.len() >= self.capacity {
            warn!(tag, capacity = self.capacity, url = %request.url, "Outbox full, request not queued");
            return false;
        }
        items.push(QueuedRequest {
            tag: tag.to_string(),
            request,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replay every request queued under `tag`
    ///
    /// Requests that fail at the transport level or get a 5xx are put back;
    /// anything else is considered delivered.
    pub async fn drain(&self, tag: &str, network: &dyn Network) -> SyncReport {
        let batch: Vec<QueuedRequest> = {
            let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
            let (batch, rest): (Vec<QueuedRequest>, Vec<QueuedRequest>) =
                std::mem::take(&mut *items)
                    .into_iter()
                    .partition(|item| item.tag == tag);
            *items = rest;
            batch
        };

        let mut report = SyncReport::default();
        let mut retry = Vec::new();

        for item in batch {
            match network.fetch(&item.request).await {
                Ok(response) if response.status < 500 => {
                    debug!(tag, url = %item.request.url, status = response.status, "Replayed queued request");
                    report.sent += 1;
                }
                Ok(response) => {
                    warn!(tag, url = %item.request.url, status = response.status, "Queued request rejected, keeping it");
                    report.failed += 1;
                    retry.push(item);
                }
                Err(e) => {
                    warn!(tag, url = %item.request.url, error = %e, "Queued request still failing");
                    report.failed += 1;
                    retry.push(item);
                }
            }
        }

        if !retry.is_empty() {
            self.items
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .extend(retry);
        }

        report
    }
}
