//! Common test utilities for Borders
//!
//! This module provides shared test fixtures, mock servers, and helper functions
//! used across the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue};
use axum_test::TestServer;

use borders::{
    rate_limit::{ManualClock, RateLimiter},
    routes, AppState, Config,
};

use crate::mocks::{MockBaasServer, MockBooksServer, MockChatServer, MockOrigin};

/// Test configuration constants
pub mod constants {
    pub const TEST_SERVICE_KEY: &str = "test-service-role-key";
    pub const TEST_ANON_KEY: &str = "test-anon-key";
    pub const TEST_OPENAI_API_KEY: &str = "test-openai-api-key";
    pub const TEST_PERPLEXITY_API_KEY: &str = "test-perplexity-api-key";
    pub const TEST_ASSOCIATE_TAG: &str = "lbb-test-20";
    pub const TEST_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ1c2VyXzEyMyJ9.test";
    pub const TEST_USER_ID: &str = "user_123";
    pub const TEST_EMAIL: &str = "test@test.com";
    pub const ADMIN_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJhZG1pbl8xIn0.test";
    pub const ADMIN_USER_ID: &str = "admin_1";
    pub const ADMIN_EMAIL: &str = "admin@test.com";
    /// Starting point of the manual rate limiter clock
    pub const CLOCK_START_MS: u64 = 1_700_000_000_000;
}

/// Config pointing every upstream at a mock server
pub fn test_config(baas: &str, openai: &str, perplexity: &str, books: &str, origin: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        supabase_url: baas.to_string(),
        supabase_service_role_key: constants::TEST_SERVICE_KEY.to_string(),
        supabase_anon_key: Some(constants::TEST_ANON_KEY.to_string()),
        openai_api_url: openai.to_string(),
        openai_api_key: Some(constants::TEST_OPENAI_API_KEY.to_string()),
        openai_model: "gpt-4o-mini".to_string(),
        perplexity_api_url: perplexity.to_string(),
        perplexity_api_key: Some(constants::TEST_PERPLEXITY_API_KEY.to_string()),
        perplexity_model: "sonar-small".to_string(),
        google_books_url: books.to_string(),
        amazon_associate_tag: constants::TEST_ASSOCIATE_TAG.to_string(),
        vapid_public_key: Some("BTestVapidPublicKey".to_string()),
        origin_url: origin.to_string(),
        outbox_capacity: 100,
        offline_body_limit_bytes: 64 * 1024,
        auth_cache_ttl_seconds: 60,
    }
}

/// Authorization header for a bearer token
pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value"),
    )
}

/// Test harness running the real router against mock upstreams
///
/// # Example
///
/// ```ignore
/// let harness = TestHarness::new().await;
/// harness.login_as_test_user().await;
///
/// let (name, value) = bearer(constants::TEST_TOKEN);
/// let response = harness.server
///     .post("/functions/book-lookup")
///     .add_header(name, value)
///     .json(&json!({"title": "The 5 Love Languages"}))
///     .await;
/// ```
pub struct TestHarness {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub clock: Arc<ManualClock>,
    pub baas: MockBaasServer,
    pub openai: MockChatServer,
    pub perplexity: MockChatServer,
    pub books: MockBooksServer,
    pub origin: MockOrigin,
}

impl TestHarness {
    /// Create a new test harness
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a harness after adjusting the generated config
    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let baas = MockBaasServer::start().await;
        let openai = MockChatServer::start().await;
        let perplexity = MockChatServer::start().await;
        let books = MockBooksServer::start().await;
        let origin = MockOrigin::start().await;

        let mut config = test_config(
            &baas.uri(),
            &openai.uri(),
            &perplexity.uri(),
            &books.uri(),
            &origin.uri(),
        );
        adjust(&mut config);

        let clock = Arc::new(ManualClock::new(constants::CLOCK_START_MS));
        let rate_limiter = Arc::new(RateLimiter::with_clock(clock.clone()));

        let state = Arc::new(
            AppState::new_for_testing(config, rate_limiter).expect("Failed to build app state"),
        );
        let app = routes::create_router(state.clone());
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            state,
            clock,
            baas,
            openai,
            perplexity,
            books,
            origin,
        }
    }

    /// Register the regular test user with a free-tier profile
    pub async fn login_as_test_user(&self) {
        self.baas
            .mock_user(constants::TEST_TOKEN, constants::TEST_USER_ID, constants::TEST_EMAIL)
            .await;
        self.baas
            .mock_profile(constants::TEST_USER_ID, false, Some("free"))
            .await;
        self.baas.mock_invalid_token().await;
    }

    /// Register the regular test user on the premium tier
    pub async fn login_as_premium_user(&self) {
        self.baas
            .mock_user(constants::TEST_TOKEN, constants::TEST_USER_ID, constants::TEST_EMAIL)
            .await;
        self.baas
            .mock_profile(constants::TEST_USER_ID, false, Some("premium"))
            .await;
        self.baas.mock_invalid_token().await;
    }

    /// Register an admin user
    pub async fn login_as_admin(&self) {
        self.baas
            .mock_user(constants::ADMIN_TOKEN, constants::ADMIN_USER_ID, constants::ADMIN_EMAIL)
            .await;
        self.baas
            .mock_profile(constants::ADMIN_USER_ID, true, Some("premium"))
            .await;
    }
}
