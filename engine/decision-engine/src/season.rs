//! Season aggregation
//!
//! Combines week summaries into a season report: averages, tier counts,
//! standout performances and the positions where bench calls cost the most.

use crate::models::{
    Highlight, HighlightKind, ImprovementArea, ManagerRating, Priority, SeasonSummary, TierCounts,
    WeekPerformance, WeekSummary, WeeklyRosters,
};
use crate::week::WeekAggregator;

/// Week tier boundaries on the average process score
pub const ELITE_WEEK: f64 = 8.0;
pub const STRONG_WEEK: f64 = 6.5;
pub const AVERAGE_WEEK: f64 = 5.0;

const HIGHLIGHT_POINTS: f64 = 20.0;
const ELITE_HIGHLIGHT_POINTS: f64 = 25.0;
const MAX_HIGHLIGHTS: usize = 5;

const AREA_MIN_MISSED: f64 = 5.0;
const HIGH_PRIORITY_MISSED: f64 = 15.0;
const MEDIUM_PRIORITY_MISSED: f64 = 8.0;
const MAX_IMPROVEMENT_AREAS: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonAggregator {
    weeks: WeekAggregator,
}

impl SeasonAggregator {
    pub fn new(weeks: WeekAggregator) -> Self {
        Self { weeks }
    }

    /// Score every non-empty week of a team's rosters, in week order
    pub fn summarize_weeks(&self, rosters: &WeeklyRosters) -> Vec<WeekSummary> {
        rosters
            .iter()
            .filter_map(|(week, roster)| self.weeks.aggregate_roster(roster, *week))
            .collect()
    }

    pub fn aggregate_rosters(&self, rosters: &WeeklyRosters) -> SeasonSummary {
        self.aggregate(&self.summarize_weeks(rosters))
    }

    pub fn aggregate(&self, weeks: &[WeekSummary]) -> SeasonSummary {
        let total_weeks = weeks.len();
        let total_points: f64 = weeks.iter().map(|w| w.total_points).sum();
        let total_process: f64 = weeks.iter().map(|w| w.avg_process_score).sum();
        let (avg_points, avg_process_score) = if total_weeks > 0 {
            (total_points / total_weeks as f64, total_process / total_weeks as f64)
        } else {
            (0.0, 0.0)
        };

        let mut tier_counts = TierCounts::default();
        for week in weeks {
            let score = week.avg_process_score;
            if score >= ELITE_WEEK {
                tier_counts.elite += 1;
            } else if score >= STRONG_WEEK {
                tier_counts.strong += 1;
            } else if score >= AVERAGE_WEEK {
                tier_counts.average += 1;
            } else {
                tier_counts.poor += 1;
            }
        }

        let weekly_performance = weeks
            .iter()
            .map(|w| WeekPerformance {
                week: w.week,
                points: w.total_points,
                top_player: w.top_player.name.clone(),
                top_points: w.top_player.points,
                process_score: w.avg_process_score,
                big_miss: w.big_miss.clone(),
            })
            .collect();

        SeasonSummary {
            total_weeks,
            total_points,
            avg_points,
            avg_process_score,
            points_lost_to_bench: weeks.iter().map(|w| w.points_lost_to_bench).sum(),
            tier_counts,
            rating: rating(avg_process_score),
            weekly_performance,
            highlights: highlights(weeks),
            improvement_areas: improvement_areas(weeks),
        }
    }
}

pub fn rating(avg_process_score: f64) -> ManagerRating {
    if avg_process_score >= 8.0 {
        ManagerRating::Elite
    } else if avg_process_score >= 7.0 {
        ManagerRating::Strong
    } else if avg_process_score >= 6.0 {
        ManagerRating::Solid
    } else if avg_process_score >= 5.0 {
        ManagerRating::Developing
    } else {
        ManagerRating::NeedsImprovement
    }
}

/// Top started performances of the season, best first
fn highlights(weeks: &[WeekSummary]) -> Vec<Highlight> {
    let mut highlights: Vec<Highlight> = weeks
        .iter()
        .flat_map(|w| w.decisions.iter().map(move |d| (w.week, d)))
        .filter(|(_, d)| d.points >= HIGHLIGHT_POINTS)
        .map(|(week, d)| Highlight {
            week,
            player: d.player.clone(),
            position: d.position.clone(),
            points: d.points,
            kind: if d.points >= ELITE_HIGHLIGHT_POINTS {
                HighlightKind::Elite
            } else {
                HighlightKind::Good
            },
        })
        .collect();

    highlights.sort_by(|a, b| b.points.total_cmp(&a.points));
    highlights.truncate(MAX_HIGHLIGHTS);
    highlights
}

/// Positions ranked by cumulative points missed to the bench
fn improvement_areas(weeks: &[WeekSummary]) -> Vec<ImprovementArea> {
    let mut misses: Vec<(String, f64)> = Vec::new();
    for decision in weeks.iter().flat_map(|w| w.decisions.iter()) {
        if decision.bench_adjustment >= 0.0 {
            continue;
        }
        let missed = decision.bench_impact.missed_points();
        match misses.iter_mut().find(|(position, _)| *position == decision.position) {
            Some((_, total)) => *total += missed,
            None => misses.push((decision.position.clone(), missed)),
        }
    }

    misses.retain(|(_, missed)| *missed > AREA_MIN_MISSED);
    misses.sort_by(|a, b| b.1.total_cmp(&a.1));
    misses.truncate(MAX_IMPROVEMENT_AREAS);

    misses
        .into_iter()
        .map(|(position, missed_points)| {
            let priority = if missed_points > HIGH_PRIORITY_MISSED {
                Priority::High
            } else if missed_points > MEDIUM_PRIORITY_MISSED {
                Priority::Medium
            } else {
                Priority::Low
            };
            let (label, description) = position_guidance(&position);
            ImprovementArea {
                area: format!("{} {}", position, label),
                position,
                missed_points,
                priority,
                description: description.to_string(),
            }
        })
        .collect()
}

fn position_guidance(position: &str) -> (&'static str, &'static str) {
    match position {
        "RB" => ("Rotation Timing", "Better start/sit decisions for running backs"),
        "WR" => ("Matchup Analysis", "Exploit favorable receiver matchups"),
        "QB" => ("Streaming Decisions", "Optimize quarterback streaming"),
        "TE" => ("Start/Sit Decisions", "Improve tight end selection"),
        "K" => ("Start/Sit Decisions", "Target dome games and good matchups"),
        "D/ST" => ("Start/Sit Decisions", "Stream defenses more effectively"),
        _ => ("Start/Sit Decisions", "General lineup optimization"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlayerRecord, WeeklyRoster};
    use proptest::prelude::*;

    fn week_with(week: u32, lineup: Vec<PlayerRecord>, bench: Vec<PlayerRecord>) -> WeekSummary {
        WeekAggregator::default().aggregate(&lineup, &bench, week).unwrap()
    }

    fn with_process_score(mut summary: WeekSummary, score: f64) -> WeekSummary {
        summary.avg_process_score = score;
        summary
    }

    #[test]
    fn test_tier_boundaries_are_inclusive_from_the_top() {
        let base = week_with(1, vec![PlayerRecord::new("A", "RB", 10.0, 10.0)], vec![]);
        let weeks: Vec<WeekSummary> = [8.0, 7.99, 6.5, 5.0, 4.99]
            .iter()
            .map(|s| with_process_score(base.clone(), *s))
            .collect();

        let summary = SeasonAggregator::default().aggregate(&weeks);

        assert_eq!(
            summary.tier_counts,
            TierCounts {
                elite: 1,
                strong: 2,
                average: 1,
                poor: 1,
            }
        );
        assert_eq!(summary.tier_counts.total(), summary.total_weeks);
    }

    #[test]
    fn test_empty_season() {
        let summary = SeasonAggregator::default().aggregate(&[]);

        assert_eq!(summary.total_weeks, 0);
        assert_eq!(summary.avg_points, 0.0);
        assert_eq!(summary.tier_counts.total(), 0);
        assert!(summary.highlights.is_empty());
        assert_eq!(summary.rating, ManagerRating::NeedsImprovement);
    }

    #[test]
    fn test_highlights_sorted_and_truncated() {
        let weeks: Vec<WeekSummary> = (1..=4)
            .map(|week| {
                week_with(
                    week,
                    vec![
                        PlayerRecord::new(
                            format!("QB{}", week),
                            "QB",
                            20.0 + week as f64 * 2.0,
                            20.0,
                        ),
                        PlayerRecord::new(format!("WR{}", week), "WR", 12.0, 12.0),
                    ],
                    vec![],
                )
            })
            .collect();

        let summary = SeasonAggregator::default().aggregate(&weeks);

        assert_eq!(summary.highlights.len(), 4);
        assert_eq!(summary.highlights[0].player, "QB4");
        assert_eq!(summary.highlights[0].kind, HighlightKind::Elite);
        assert_eq!(summary.highlights[3].player, "QB1");
        assert_eq!(summary.highlights[3].kind, HighlightKind::Good);
        assert!(summary
            .highlights
            .windows(2)
            .all(|pair| pair[0].points >= pair[1].points));
    }

    #[test]
    fn test_improvement_areas_sum_structured_misses() {
        let weeks = vec![
            week_with(
                1,
                vec![PlayerRecord::new("Starter RB", "RB", 4.0, 10.0)],
                vec![PlayerRecord::new("Bench RB", "RB", 14.0, 8.0)],
            ),
            week_with(
                2,
                vec![PlayerRecord::new("Starter RB", "RB", 6.0, 10.0)],
                vec![PlayerRecord::new("Bench RB", "RB", 13.0, 8.0)],
            ),
            week_with(
                3,
                vec![PlayerRecord::new("Starter WR", "WR", 9.0, 10.0)],
                vec![PlayerRecord::new("Bench WR", "WR", 12.0, 8.0)],
            ),
        ];

        let summary = SeasonAggregator::default().aggregate(&weeks);

        // RB: 10 + 7 = 17 missed; WR: 3 missed is below the cut
        assert_eq!(summary.improvement_areas.len(), 1);
        let area = &summary.improvement_areas[0];
        assert_eq!(area.area, "RB Rotation Timing");
        assert!((area.missed_points - 17.0).abs() < 1e-9);
        assert_eq!(area.priority, Priority::High);
        assert_eq!(area.description, "Better start/sit decisions for running backs");
    }

    #[test]
    fn test_aggregate_rosters_skips_empty_weeks() {
        let mut rosters = WeeklyRosters::new();
        rosters.insert(
            1,
            WeeklyRoster::new(vec![PlayerRecord::new("A", "QB", 22.0, 20.0)], vec![]),
        );
        rosters.insert(2, WeeklyRoster::default());

        let summary = SeasonAggregator::default().aggregate_rosters(&rosters);

        assert_eq!(summary.total_weeks, 1);
        assert_eq!(summary.weekly_performance[0].week, 1);
        assert_eq!(summary.weekly_performance[0].top_player, "A");
    }

    #[test]
    fn test_manager_rating_bands() {
        assert_eq!(rating(8.2), ManagerRating::Elite);
        assert_eq!(rating(7.0), ManagerRating::Strong);
        assert_eq!(rating(6.4), ManagerRating::Solid);
        assert_eq!(rating(5.0), ManagerRating::Developing);
        assert_eq!(rating(3.1), ManagerRating::NeedsImprovement);
    }

    proptest! {
        #[test]
        fn prop_tier_counts_sum_to_total_weeks(
            scores in prop::collection::vec(0.0f64..10.0, 0..20)
        ) {
            let base = week_with(1, vec![PlayerRecord::new("A", "RB", 10.0, 10.0)], vec![]);
            let weeks: Vec<WeekSummary> = scores
                .iter()
                .map(|s| with_process_score(base.clone(), *s))
                .collect();

            let summary = SeasonAggregator::default().aggregate(&weeks);

            prop_assert_eq!(summary.tier_counts.total(), summary.total_weeks);
        }
    }
}
