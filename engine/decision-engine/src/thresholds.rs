//! Position-specific performance thresholds
//!
//! Every scoring call site goes through [`thresholds`] so league-wide
//! comparisons stay consistent.

use serde::{Deserialize, Serialize};

use crate::models::PerformanceTier;

/// Fantasy point cut-offs for one roster position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionThresholds {
    pub elite: f64,
    pub strong: f64,
    pub good: f64,
    pub average: f64,
}

const QB: PositionThresholds = PositionThresholds {
    elite: 25.0,
    strong: 20.0,
    good: 15.0,
    average: 10.0,
};

const RB_FLEX: PositionThresholds = PositionThresholds {
    elite: 20.0,
    strong: 15.0,
    good: 10.0,
    average: 6.0,
};

const TE: PositionThresholds = PositionThresholds {
    elite: 15.0,
    strong: 12.0,
    good: 8.0,
    average: 5.0,
};

const K: PositionThresholds = PositionThresholds {
    elite: 12.0,
    strong: 9.0,
    good: 6.0,
    average: 3.0,
};

const DST: PositionThresholds = PositionThresholds {
    elite: 15.0,
    strong: 10.0,
    good: 6.0,
    average: 2.0,
};

/// Positions eligible to fill a FLEX slot
pub const FLEX_ELIGIBLE: [&str; 3] = ["RB", "WR", "TE"];

/// Thresholds for a position; unknown positions fall back to RB/FLEX
pub fn thresholds(position: &str) -> PositionThresholds {
    match position {
        "QB" => QB,
        "RB" | "WR" | "FLEX" => RB_FLEX,
        "TE" => TE,
        "K" => K,
        "D/ST" | "DST" | "DEF" => DST,
        _ => RB_FLEX,
    }
}

impl PositionThresholds {
    /// Tier for a point total, checked from elite downward with ties going up
    pub fn tier(&self, points: f64) -> PerformanceTier {
        if points >= self.elite {
            PerformanceTier::Elite
        } else if points >= self.strong {
            PerformanceTier::Strong
        } else if points >= self.good {
            PerformanceTier::Good
        } else if points >= self.average {
            PerformanceTier::Average
        } else if points > 0.0 {
            PerformanceTier::Poor
        } else {
            PerformanceTier::Scoreless
        }
    }

    /// Lower bound of a tier, if it has one
    pub fn floor(&self, tier: PerformanceTier) -> Option<f64> {
        match tier {
            PerformanceTier::Elite => Some(self.elite),
            PerformanceTier::Strong => Some(self.strong),
            PerformanceTier::Good => Some(self.good),
            PerformanceTier::Average => Some(self.average),
            PerformanceTier::Poor | PerformanceTier::Scoreless => None,
        }
    }
}

/// Whether a bench player could have filled the started player's slot
pub fn is_eligible(slot_position: &str, bench_position: &str) -> bool {
    slot_position == bench_position
        || (slot_position == "FLEX" && FLEX_ELIGIBLE.contains(&bench_position))
}
