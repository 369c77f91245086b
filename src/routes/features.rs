//! Feature gate endpoints
//!
//! Resolves the static gate table for a tier so the client does not have to
//! ship its own copy.

use axum::{
    extract::{Path, Query},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    tiers::{feature_gate, get_feature_limit, has_feature_access, FeatureGate, Tier, FEATURE_GATES},
};

#[derive(Debug, Deserialize)]
pub struct TierQuery {
    pub tier: Option<String>,
}

impl TierQuery {
    fn tier(&self) -> AppResult<Tier> {
        match self.tier.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(Tier::default()),
        }
    }
}

/// A feature resolved for one tier
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FeatureAccess {
    pub feature: &'static str,
    pub required_tier: Tier,
    pub has_access: bool,
    pub limit: Option<u32>,
}

impl FeatureAccess {
    fn resolve(gate: &FeatureGate, tier: Tier) -> Self {
        Self {
            feature: gate.name,
            required_tier: gate.required_tier,
            has_access: has_feature_access(tier, gate.name),
            limit: get_feature_limit(tier, gate.name),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeatureListResponse {
    pub tier: Tier,
    pub features: Vec<FeatureAccess>,
}

/// GET /v1/features
pub async fn list_features(Query(query): Query<TierQuery>) -> AppResult<Json<FeatureListResponse>> {
    let tier = query.tier()?;
    let features = FEATURE_GATES
        .iter()
        .map(|gate| FeatureAccess::resolve(gate, tier))
        .collect();

    Ok(Json(FeatureListResponse { tier, features }))
}

/// GET /v1/features/:feature
pub async fn get_feature(
    Path(feature): Path<String>,
    Query(query): Query<TierQuery>,
) -> AppResult<Json<FeatureAccess>> {
    let tier = query.tier()?;
    let gate = feature_gate(&feature)
        .ok_or_else(|| AppError::NotFound(format!("Unknown feature: {}", feature)))?;

    Ok(Json(FeatureAccess::resolve(gate, tier)))
}
