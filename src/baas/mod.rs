//! BaaS integration module
//!
//! Client and models for the managed auth, admin and REST API.

pub mod client;
pub mod models;

pub use client::BaasClient;
pub use models::{AdminAuditEntry, AuthUser, Profile, PushSubscription, SecurityAuditEntry};
