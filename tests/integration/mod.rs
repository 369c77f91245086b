//! Integration tests for Borders
//!
//! These tests run the real router against wiremock upstreams and verify the
//! complete request/response flow, including authentication, rate limiting,
//! feature gating and the offline fallback.

mod account;
mod audit;
mod auth;
mod books;
mod quotes;
mod rate_limiting;
