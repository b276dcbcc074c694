//! Decision scorer
//!
//! Rates one start/sit decision on a 0-10 scale. The score rewards sound
//! choices independently of raw fantasy output: a tier base from the points
//! scored, an adjustment against the projection, a comparison with the best
//! eligible bench alternative, and optional situational signals.

use serde::{Deserialize, Serialize};

use crate::models::{
    round1, BenchImpact, BenchRecord, DecisionScore, GameScript, PerformanceTier, PlayerRecord,
    ScoreComponent,
};
use crate::thresholds::{is_eligible, thresholds, PositionThresholds};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Projection misses inside this band are noise
pub const PROJECTION_NOISE: f64 = 2.0;
const PROJECTION_BONUS_RATE: f64 = 0.10;
const PROJECTION_BONUS_CAP: f64 = 1.0;
const PROJECTION_PENALTY_RATE: f64 = 0.15;
const PROJECTION_PENALTY_CAP: f64 = -1.5;

/// Bonus for starting a player who matched or beat every eligible bench option
pub const BENCH_BONUS: f64 = 1.5;

const INJURY_RISK_THRESHOLD: f64 = 0.7;
const INJURY_AVOIDED_BONUS: f64 = 1.0;
const INJURED_START_PENALTY: f64 = -2.5;
const MATCHUP_STRONG: f64 = 0.8;
const MATCHUP_WEAK: f64 = 0.3;
const MATCHUP_DELTA: f64 = 0.5;
const FAVORABLE_SCRIPT_POINTS: f64 = 15.0;
const FAVORABLE_SCRIPT_BONUS: f64 = 0.5;
const UNFAVORABLE_SCRIPT_POINTS: f64 = 10.0;
const UNFAVORABLE_SCRIPT_BONUS: f64 = 1.0;

/// Base score for each performance tier
pub fn base_score(tier: PerformanceTier) -> f64 {
    match tier {
        PerformanceTier::Elite => 8.0,
        PerformanceTier::Strong => 7.0,
        PerformanceTier::Good => 6.0,
        PerformanceTier::Average => 5.0,
        PerformanceTier::Poor => 3.0,
        PerformanceTier::Scoreless => 1.0,
    }
}

/// Signed adjustment for beating or missing a projection
///
/// Overshooting is rewarded less than undershooting is punished.
pub fn projection_adjustment(diff: f64) -> f64 {
    if diff.abs() <= PROJECTION_NOISE {
        0.0
    } else if diff > 0.0 {
        (diff * PROJECTION_BONUS_RATE).min(PROJECTION_BONUS_CAP)
    } else {
        (diff * PROJECTION_PENALTY_RATE).max(PROJECTION_PENALTY_CAP)
    }
}

/// How badly a start/sit decision missed the best bench option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissSeverity {
    Minor,
    Moderate,
    Significant,
    Major,
}

impl MissSeverity {
    pub fn from_gap(gap: f64) -> Self {
        if gap > 15.0 {
            MissSeverity::Major
        } else if gap > 10.0 {
            MissSeverity::Significant
        } else if gap > 5.0 {
            MissSeverity::Moderate
        } else {
            MissSeverity::Minor
        }
    }

    pub fn penalty(&self) -> f64 {
        match self {
            MissSeverity::Minor => -0.5,
            MissSeverity::Moderate => -1.5,
            MissSeverity::Significant => -2.0,
            MissSeverity::Major => -2.5,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MissSeverity::Minor => "minor",
            MissSeverity::Moderate => "moderate",
            MissSeverity::Significant => "significant",
            MissSeverity::Major => "major",
        }
    }
}

/// Which optional steps the scorer applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Adjust against the player's projection
    pub projection_aware: bool,
    /// Apply injury/matchup/game-script signals when present on the record
    pub situational: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            projection_aware: true,
            situational: true,
        }
    }
}

/// Scores started players against their bench alternatives and projections
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionScorer {
    config: ScoringConfig,
}

impl DecisionScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ScoringConfig {
        self.config
    }

    /// Score one started player
    ///
    /// Total over any input: a missing projection counts as zero, and bench
    /// candidates that could not fill the slot are ignored.
    pub fn score(
        &self,
        started: &PlayerRecord,
        bench: &[BenchRecord],
        projected: Option<f64>,
    ) -> DecisionScore {
        let position = started.position.as_str();
        let points = if started.points.is_finite() { started.points } else { 0.0 };
        let projected = projected.filter(|p| p.is_finite()).unwrap_or(0.0);
        let limits = thresholds(position);

        let mut breakdown = Vec::with_capacity(6);

        // Step 1: tier base
        let tier = limits.tier(points);
        let base = base_score(tier);
        breakdown.push(ScoreComponent {
            component: format!("Base Score ({})", tier),
            points: base,
            description: describe_tier(points, tier, &limits, position),
        });

        // Step 2: projection
        let projection_diff = points - projected;
        let projection_adj = if self.config.projection_aware {
            projection_adjustment(projection_diff)
        } else {
            0.0
        };
        if projection_adj != 0.0 {
            let beat = projection_adj > 0.0;
            let component = if beat { "Projection Bonus" } else { "Projection Miss" };
            breakdown.push(ScoreComponent {
                component: component.to_string(),
                points: projection_adj,
                description: format!(
                    "{} {:.1} projection by {:.1} pts",
                    if beat { "Beat" } else { "Missed" },
                    projected,
                    projection_diff.abs()
                ),
            });
        }

        // Step 3: bench alternative
        let best = best_alternative(position, bench);
        let (bench_adj, bench_impact) = match best {
            None => (0.0, BenchImpact::NoAlternatives),
            Some(alt) if points >= alt.points => (
                BENCH_BONUS,
                BenchImpact::Beat {
                    alternative: alt.name.clone(),
                    alternative_points: alt.points,
                    margin: points - alt.points,
                },
            ),
            Some(alt) => {
                let gap = alt.points - points;
                (
                    MissSeverity::from_gap(gap).penalty(),
                    BenchImpact::Missed {
                        alternative: alt.name.clone(),
                        alternative_points: alt.points,
                        missed_points: gap,
                    },
                )
            }
        };
        breakdown.push(bench_component(bench_adj, &bench_impact));

        // Step 4: situational signals
        let situational = if self.config.situational {
            situational_components(started, points)
        } else {
            Vec::new()
        };
        let situational_adj: f64 = situational.iter().map(|c| c.points).sum();
        breakdown.extend(situational);

        // Step 5: clamp and round
        let raw = base + projection_adj + bench_adj + situational_adj;
        let total = round1(raw.clamp(MIN_SCORE, MAX_SCORE));

        let reasoning = reasoning(tier, projection_adj, bench_adj, situational_adj, &bench_impact);
        let feedback = feedback(points, total, &bench_impact);

        DecisionScore {
            player: started.name.clone(),
            position: started.position.clone(),
            points,
            projected,
            projection_diff,
            tier,
            base_score: base,
            projection_adjustment: projection_adj,
            bench_adjustment: bench_adj,
            situational_adjustment: situational_adj,
            total,
            bench_impact,
            reasoning,
            feedback,
            breakdown,
        }
    }
}

/// Highest-scoring bench player able to fill the slot; the earliest wins ties
fn best_alternative<'a>(position: &str, bench: &'a [BenchRecord]) -> Option<&'a BenchRecord> {
    bench
        .iter()
        .filter(|candidate| is_eligible(position, &candidate.position))
        .fold(None, |best: Option<&BenchRecord>, candidate| match best {
            Some(current) if candidate.points <= current.points => Some(current),
            _ => Some(candidate),
        })
}

fn describe_tier(
    points: f64,
    tier: PerformanceTier,
    limits: &PositionThresholds,
    position: &str,
) -> String {
    match tier {
        PerformanceTier::Elite => {
            format!("{:.1} pts >= {} elite line ({:.0})", points, position, limits.elite)
        }
        PerformanceTier::Strong => format!(
            "{:.1} pts in {} strong range ({:.0}-{:.0})",
            points, position, limits.strong, limits.elite
        ),
        PerformanceTier::Good => format!(
            "{:.1} pts in {} good range ({:.0}-{:.0})",
            points, position, limits.good, limits.strong
        ),
        PerformanceTier::Average => format!(
            "{:.1} pts in {} average range ({:.0}-{:.0})",
            points, position, limits.average, limits.good
        ),
        PerformanceTier::Poor => {
            format!("{:.1} pts below {} average line ({:.0})", points, position, limits.average)
        }
        PerformanceTier::Scoreless => "No points scored".to_string(),
    }
}

fn bench_component(adjustment: f64, impact: &BenchImpact) -> ScoreComponent {
    match impact {
        BenchImpact::NoAlternatives => ScoreComponent {
            component: "Bench Impact".to_string(),
            points: 0.0,
            description: "No bench alternatives to compare".to_string(),
        },
        BenchImpact::Beat { alternative, alternative_points, margin } => ScoreComponent {
            component: "Bench Bonus".to_string(),
            points: adjustment,
            description: format!(
                "Outscored {} ({:.1}) by {:.1} pts",
                alternative, alternative_points, margin
            ),
        },
        BenchImpact::Missed { alternative, alternative_points, missed_points } => ScoreComponent {
            component: "Bench Miss".to_string(),
            points: adjustment,
            description: format!(
                "{} ({:.1}) scored {:.1} pts more, {} miss",
                alternative,
                alternative_points,
                missed_points,
                MissSeverity::from_gap(*missed_points).label()
            ),
        },
    }
}

fn situational_components(started: &PlayerRecord, points: f64) -> Vec<ScoreComponent> {
    let mut components = Vec::new();

    if let Some(risk) = started.injury_risk.filter(|r| *r > INJURY_RISK_THRESHOLD) {
        if points > 0.0 {
            components.push(ScoreComponent {
                component: "Injury Risk".to_string(),
                points: INJURY_AVOIDED_BONUS,
                description: format!(
                    "Started through {:.0}% injury risk and produced",
                    risk * 100.0
                ),
            });
        } else {
            components.push(ScoreComponent {
                component: "Injury Risk".to_string(),
                points: INJURED_START_PENALTY,
                description: format!(
                    "Started a {:.0}% injury risk who did not score",
                    risk * 100.0
                ),
            });
        }
    }

    match started.matchup_quality {
        Some(quality) if quality > MATCHUP_STRONG => components.push(ScoreComponent {
            component: "Matchup".to_string(),
            points: MATCHUP_DELTA,
            description: format!("Exploited a strong matchup ({:.0}%)", quality * 100.0),
        }),
        Some(quality) if quality < MATCHUP_WEAK => components.push(ScoreComponent {
            component: "Matchup".to_string(),
            points: -MATCHUP_DELTA,
            description: format!("Started into a poor matchup ({:.0}%)", quality * 100.0),
        }),
        _ => {}
    }

    match started.game_script {
        Some(GameScript::Favorable) if points > FAVORABLE_SCRIPT_POINTS => {
            components.push(ScoreComponent {
                component: "Game Script".to_string(),
                points: FAVORABLE_SCRIPT_BONUS,
                description: "Capitalized on a favorable game script".to_string(),
            })
        }
        Some(GameScript::Unfavorable) if points > UNFAVORABLE_SCRIPT_POINTS => {
            components.push(ScoreComponent {
                component: "Game Script".to_string(),
                points: UNFAVORABLE_SCRIPT_BONUS,
                description: "Produced despite an unfavorable game script".to_string(),
            })
        }
        _ => {}
    }

    components
}

fn reasoning(
    tier: PerformanceTier,
    projection_adj: f64,
    bench_adj: f64,
    situational_adj: f64,
    impact: &BenchImpact,
) -> String {
    let mut reasoning = format!("{} base", tier);
    if projection_adj > 0.0 {
        reasoning.push_str(" + Beat projection");
    } else if projection_adj < 0.0 {
        reasoning.push_str(" - Missed projection");
    }
    match impact {
        BenchImpact::NoAlternatives => reasoning.push_str(" (no bench)"),
        _ if bench_adj >= 0.0 => reasoning.push_str(" + Beat bench"),
        _ => reasoning.push_str(" - Bench miss"),
    }
    if situational_adj > 0.0 {
        reasoning.push_str(" + Situational edge");
    } else if situational_adj < 0.0 {
        reasoning.push_str(" - Situational risk");
    }
    reasoning
}

fn feedback(points: f64, total: f64, impact: &BenchImpact) -> String {
    let missed = impact.missed_points();
    if points > 20.0 {
        "ELITE performance! Great player selection.".to_string()
    } else if total >= 8.5 {
        if missed <= 0.0 {
            "Excellent decision! Great process and outcome.".to_string()
        } else {
            "Great process, but missed some points. Keep this approach.".to_string()
        }
    } else if total >= 6.0 {
        if points > 10.0 {
            "Solid decision that delivered good points.".to_string()
        } else {
            "Decent decision, could optimize further.".to_string()
        }
    } else if points <= 0.0 {
        "Poor choice, player didn't score. Check injury reports.".to_string()
    } else {
        "Suboptimal decision. Review alternatives.".to_string()
    }
}
