//! Static feature gate table
//!
//! Read-only configuration; resolution is a pure lookup.

use serde::Serialize;

use super::tier::Tier;

/// Gate for a single feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureGate {
    pub name: &'static str,
    /// Lowest tier with access
    pub required_tier: Tier,
    /// Usage limit for callers at exactly `required_tier`; `None` is unlimited
    pub limit: Option<u32>,
    /// Tier from which the limit no longer applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlimited_tier: Option<Tier>,
}

impl FeatureGate {
    const fn new(
        name: &'static str,
        required_tier: Tier,
        limit: Option<u32>,
        unlimited_tier: Option<Tier>,
    ) -> Self {
        Self {
            name,
            required_tier,
            limit,
            unlimited_tier,
        }
    }
}

pub const FEATURE_GATES: &[FeatureGate] = &[
    FeatureGate::new("daily_matches", Tier::Free, Some(5), Some(Tier::Premium)),
    FeatureGate::new("messages_per_day", Tier::Free, Some(20), Some(Tier::Premium)),
    FeatureGate::new("love_games", Tier::Free, Some(3), Some(Tier::Premium)),
    FeatureGate::new("book_recommendations", Tier::Free, Some(5), None),
    FeatureGate::new("daily_quote", Tier::Free, Some(1), None),
    FeatureGate::new("mood_tracking", Tier::Free, None, Some(Tier::Free)),
    FeatureGate::new("ai_advisor", Tier::Premium, Some(50), None),
    FeatureGate::new("relationship_insights", Tier::Premium, Some(10), None),
    FeatureGate::new("video_calls", Tier::Premium, None, Some(Tier::Premium)),
    FeatureGate::new("advanced_filters", Tier::Premium, None, None),
    FeatureGate::new("see_who_likes_you", Tier::Premium, None, None),
];

/// Look up the gate for a feature
pub fn feature_gate(feature: &str) -> Option<&'static FeatureGate> {
    FEATURE_GATES.iter().find(|gate| gate.name == feature)
}

/// Whether `tier` may use `feature`; unknown features are denied
pub fn has_feature_access(tier: Tier, feature: &str) -> bool {
    feature_gate(feature)
        .map(|gate| tier.rank() >= gate.required_tier.rank())
        .unwrap_or(false)
}

/// Usage limit for `feature` at `tier`, `None` meaning unlimited
///
/// Callers ranked above the required tier are unlimited, as are callers
/// meeting the gate's `unlimited_tier`. Everyone else gets the static limit.
pub fn get_feature_limit(tier: Tier, feature: &str) -> Option<u32> {
    let gate = feature_gate(feature)?;

    if tier.rank() > gate.required_tier.rank() {
        return None;
    }
    if let Some(unlimited) = gate.unlimited_tier {
        if tier.rank() >= unlimited.rank() {
            return None;
        }
    }

    gate.limit
}
