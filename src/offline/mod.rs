//! Offline cache engine
//!
//! The Rust side of the app's service worker: named caches, the
//! install/activate lifecycle, the per-request routing policy and the
//! background-sync, push and notification-click events.

pub mod cache;
pub mod events;
pub mod handler;
pub mod network;
pub mod policy;
pub mod worker;

pub use cache::{Cache, CacheStorage, CachedResponse, RequestKey};
pub use events::{notification_click_target, notification_from_push, PushPayload, SyncReport};
pub use network::{HttpNetwork, Network, NetworkError};
pub use policy::{classify, FetchRequest, RequestMode, Route};
pub use worker::{FetchOutcome, InstallError, OfflineWorker, ResponseSource, WorkerSettings};
