//! Pricing algorithm tags.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The closed set of pricing strategies a booking can be priced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingAlgorithm {
    /// Base fee plus weight, scaled by market demand and urgency.
    Dynamic,
    /// Haversine distance at the carrier's per-km rate.
    Distance,
    /// Weight scaled by how well it fits the carrier's vehicle.
    #[serde(rename = "weight")]
    WeightFit,
}

impl PricingAlgorithm {
    pub const ALL: [PricingAlgorithm; 3] = [Self::Dynamic, Self::Distance, Self::WeightFit];

    /// The wire and storage tag: `dynamic`, `distance`, or `weight`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Dynamic => "dynamic",
            Self::Distance => "distance",
            Self::WeightFit => "weight",
        }
    }

    /// Human-readable name for confirmations and quotes.
    pub fn label(self) -> &'static str {
        match self {
            Self::Dynamic => "Dynamic (market/urgency)",
            Self::Distance => "Location (haversine)",
            Self::WeightFit => "Vehicle weight fit",
        }
    }
}

impl fmt::Display for PricingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PricingAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.tag() == s)
            .ok_or_else(|| {
                format!("unknown pricing algorithm: {s} (expected dynamic, distance, or weight)")
            })
    }
}
