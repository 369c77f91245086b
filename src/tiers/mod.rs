//! Subscription tiers and feature gating
//!
//! Maps features to the subscription tier that unlocks them, and resolves
//! per-tier usage limits.

pub mod features;
pub mod tier;

pub use features::{
    feature_gate, get_feature_limit, has_feature_access, FeatureGate, FEATURE_GATES,
};
pub use tier::Tier;
