//! Week aggregation
//!
//! Rolls every started player's decision score into one team-week summary.

use crate::models::{
    round1, BenchRecord, DecisionScore, Insight, PlayerRecord, TopPlayer, WeekSummary,
    WeeklyRoster,
};
use crate::scorer::DecisionScorer;

/// Process score reported when no decision could be scored
pub const NEUTRAL_PROCESS_SCORE: f64 = 5.0;
/// Decisions at or above this score count as elite
pub const ELITE_DECISION: f64 = 8.0;
/// Beating a projection by more than this is called out
pub const PROJECTION_BEAT: f64 = 5.0;
/// Bench misses above this become the week's "big miss"
pub const BIG_MISS: f64 = 5.0;
/// Maximum entries per insight kind
pub const MAX_INSIGHTS: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct WeekAggregator {
    scorer: DecisionScorer,
}

impl WeekAggregator {
    pub fn new(scorer: DecisionScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &DecisionScorer {
        &self.scorer
    }

    pub fn aggregate_roster(&self, roster: &WeeklyRoster, week: u32) -> Option<WeekSummary> {
        self.aggregate(&roster.lineup, &roster.bench, week)
    }

    /// Summarize one week, or `None` when nobody was started
    pub fn aggregate(
        &self,
        lineup: &[PlayerRecord],
        bench: &[BenchRecord],
        week: u32,
    ) -> Option<WeekSummary> {
        if lineup.is_empty() {
            return None;
        }

        let decisions: Vec<DecisionScore> = lineup
            .iter()
            .map(|player| self.scorer.score(player, bench, Some(player.projected)))
            .collect();

        let total_points: f64 = decisions.iter().map(|d| d.points).sum();
        let total_projected: f64 = decisions.iter().map(|d| d.projected).sum();
        let avg_process_score = average_process_score(&decisions);
        let points_lost_to_bench = points_lost_to_bench(lineup, bench);

        let efficiency = if total_points > 0.0 {
            round1((total_points - points_lost_to_bench) / total_points * 100.0)
        } else {
            0.0
        };

        let top = decisions
            .iter()
            .fold(None, |best: Option<&DecisionScore>, d| match best {
                Some(current) if d.points <= current.points => Some(current),
                _ => Some(d),
            })?;
        let top_player = TopPlayer {
            name: top.player.clone(),
            position: top.position.clone(),
            points: top.points,
        };

        let big_miss = decisions
            .iter()
            .find(|d| d.bench_impact.missed_points() > BIG_MISS)
            .map(|d| d.bench_impact.to_string());

        let elite = decisions.iter().filter(|d| d.total >= ELITE_DECISION).count();
        let misses = decisions.iter().filter(|d| d.bench_adjustment < 0.0).count();
        let beats = decisions.iter().filter(|d| d.projection_diff > PROJECTION_BEAT).count();

        let context = if elite >= 2 {
            "Elite decision-making drives strong week".to_string()
        } else if misses >= 3 {
            "Multiple bench optimization opportunities".to_string()
        } else if beats >= 2 {
            "Projection smashes overcome lineup issues".to_string()
        } else {
            format!(
                "Mixed performance with {:.1}/10 average process score",
                avg_process_score
            )
        };

        let bottom_line = bottom_line(
            elite,
            misses,
            avg_process_score,
            points_lost_to_bench,
            total_points,
            efficiency,
        );

        Some(WeekSummary {
            week,
            total_points,
            total_projected,
            projection_diff: total_points - total_projected,
            avg_process_score,
            points_lost_to_bench,
            efficiency,
            top_player,
            big_miss,
            insights: insights(&decisions),
            context,
            bottom_line,
            decisions,
        })
    }
}

/// Mean of the finite decision totals, neutral when there are none
fn average_process_score(decisions: &[DecisionScore]) -> f64 {
    let valid: Vec<f64> = decisions
        .iter()
        .map(|d| d.total)
        .filter(|t| t.is_finite())
        .collect();
    if valid.is_empty() {
        NEUTRAL_PROCESS_SCORE
    } else {
        valid.iter().sum::<f64>() / valid.len() as f64
    }
}

/// Upside from reshuffling the whole lineup, ignoring slot eligibility
///
/// Best bench scores are paired with worst lineup scores and only positive
/// gaps are summed. This is an upper-bound heuristic, not an optimal swap.
pub fn points_lost_to_bench(lineup: &[PlayerRecord], bench: &[BenchRecord]) -> f64 {
    let mut bench_points: Vec<f64> = bench.iter().map(|b| b.points).collect();
    let mut lineup_points: Vec<f64> = lineup.iter().map(|p| p.points).collect();
    bench_points.sort_by(|a, b| b.total_cmp(a));
    lineup_points.sort_by(|a, b| a.total_cmp(b));

    bench_points
        .iter()
        .zip(lineup_points.iter())
        .map(|(bench, started)| bench - started)
        .filter(|gap| *gap > 0.0)
        .sum()
}

fn insights(decisions: &[DecisionScore]) -> Vec<Insight> {
    let elite = decisions
        .iter()
        .filter(|d| d.total >= ELITE_DECISION)
        .take(MAX_INSIGHTS)
        .map(|d| Insight::EliteDecision {
            player: d.player.clone(),
            position: d.position.clone(),
            score: d.total,
        });

    let misses = decisions
        .iter()
        .filter(|d| d.bench_adjustment < 0.0)
        .take(MAX_INSIGHTS)
        .map(|d| Insight::BenchMiss {
            player: d.player.clone(),
            position: d.position.clone(),
            alternative: d.bench_alternative().unwrap_or_default().to_string(),
            missed_points: d.bench_impact.missed_points(),
        });

    let beats = decisions
        .iter()
        .filter(|d| d.projection_diff > PROJECTION_BEAT)
        .take(MAX_INSIGHTS)
        .map(|d| Insight::ProjectionBeat {
            player: d.player.clone(),
            position: d.position.clone(),
            beat_by: d.projection_diff,
        });

    elite.chain(misses).chain(beats).collect()
}

fn bottom_line(
    elite: usize,
    misses: usize,
    avg_process_score: f64,
    points_lost: f64,
    total_points: f64,
    efficiency: f64,
) -> String {
    let bench_note = if points_lost > BIG_MISS {
        format!(
            "Consider {} lineup optimizations that could have gained {:.1} points.",
            misses, points_lost
        )
    } else {
        "Strong lineup construction with minimal bench regrets.".to_string()
    };
    let grade = if avg_process_score >= 7.0 {
        "excellent"
    } else if avg_process_score >= 6.0 {
        "solid"
    } else if avg_process_score >= 5.0 {
        "average"
    } else {
        "developing"
    };

    format!(
        "You executed {} elite decisions with a {:.1}/10 average process score. {} \
         Your {:.1} points with {:.0}% efficiency demonstrates {} fantasy management.",
        elite, avg_process_score, bench_note, total_points, efficiency, grade
    )
}
