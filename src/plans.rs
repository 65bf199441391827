use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Quota sentinel: `-1` means the tier has no cap on that dimension.
pub const UNLIMITED: i64 = -1;

/// Subscription tier. The set is closed; anything else coming in from
/// storage or a request is rejected with [`UnknownPlanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Basic,
    Premium,
}

/// Per-tier quotas for a single sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    pub max_rows: i64,
    pub max_custom_columns: i64,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown plan tier: {0}")]
pub struct UnknownPlanError(pub String);

impl FromStr for PlanTier {
    type Err = UnknownPlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PlanTier::Free),
            "basic" => Ok(PlanTier::Basic),
            "premium" => Ok(PlanTier::Premium),
            other => Err(UnknownPlanError(other.to_string())),
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PlanTier {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Basic => "basic",
            PlanTier::Premium => "premium",
        }
    }

    /// Static quota lookup. Pure; no side effects.
    pub fn limits(self) -> PlanLimits {
        match self {
            PlanTier::Free => PlanLimits {
                max_rows: 10,
                max_custom_columns: 3,
            },
            PlanTier::Basic => PlanLimits {
                max_rows: 50,
                max_custom_columns: 10,
            },
            PlanTier::Premium => PlanLimits {
                max_rows: UNLIMITED,
                max_custom_columns: UNLIMITED,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_parse_and_roundtrip() {
        for name in ["free", "basic", "premium"] {
            let tier: PlanTier = name.parse().expect("known tier");
            assert_eq!(tier.as_str(), name);
        }
    }

    #[test]
    fn unknown_tier_is_rejected() {
        let err = "enterprise".parse::<PlanTier>().unwrap_err();
        assert!(err.to_string().contains("enterprise"));
    }

    #[test]
    fn free_and_basic_have_finite_quotas() {
        assert_eq!(
            PlanTier::Free.limits(),
            PlanLimits { max_rows: 10, max_custom_columns: 3 }
        );
        assert_eq!(
            PlanTier::Basic.limits(),
            PlanLimits { max_rows: 50, max_custom_columns: 10 }
        );
    }

    #[test]
    fn premium_is_unlimited() {
        let limits = PlanTier::Premium.limits();
        assert_eq!(limits.max_rows, UNLIMITED);
        assert_eq!(limits.max_custom_columns, UNLIMITED);
    }
}
