//! Mock infrastructure for testing external services
//!
//! This module provides mock servers and test helpers for external dependencies:
//! - BaaS (auth, admin user API, REST tables)
//! - Chat completions, Google Books and push services
//! - The web app origin served through the offline worker
//!
//! All mocks are designed to be reusable across different test files and support
//! various response scenarios (success, errors, edge cases).

pub mod origin;

pub use baas::*;
pub use origin::*;
pub use upstream::*;
