//! League aggregation
//!
//! Runs the same season pipeline for every team and ranks the results.
//! Teams are scored independently, so the work is spread over rayon's pool.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::models::{LeagueSnapshot, TeamDelta, TeamSeason, TeamStanding};
use crate::season::SeasonAggregator;

#[derive(Debug, Clone, Copy, Default)]
pub struct LeagueAggregator {
    seasons: SeasonAggregator,
}

impl LeagueAggregator {
    pub fn new(seasons: SeasonAggregator) -> Self {
        Self { seasons }
    }

    /// Build a ranked snapshot of every team's season
    ///
    /// Ranks follow average process score, best first. Ties keep input order
    /// and every team gets its own position, so ranks run 1..=n.
    pub fn aggregate(&self, year: i32, teams: &[TeamSeason]) -> LeagueSnapshot {
        let mut standings: Vec<TeamStanding> = teams
            .par_iter()
            .map(|team| {
                let summary = self.seasons.aggregate_rosters(&team.weeks);
                debug!(
                    "Scored team {} over {} weeks: {:.2}",
                    team.team_id, summary.total_weeks, summary.avg_process_score
                );
                TeamStanding {
                    rank: 0,
                    team_id: team.team_id.clone(),
                    team_name: if team.team_name.is_empty() {
                        format!("Team {}", team.team_id)
                    } else {
                        team.team_name.clone()
                    },
                    owner_name: if team.owner_name.is_empty() {
                        "Unknown Owner".to_string()
                    } else {
                        team.owner_name.clone()
                    },
                    summary,
                }
            })
            .collect();

        standings.sort_by(|a, b| {
            b.summary
                .avg_process_score
                .total_cmp(&a.summary.avg_process_score)
        });
        for (index, standing) in standings.iter_mut().enumerate() {
            standing.rank = index + 1;
        }

        info!("Built league snapshot for {} with {} teams", year, standings.len());
        LeagueSnapshot {
            year,
            teams: standings,
        }
    }
}

impl LeagueSnapshot {
    pub fn team(&self, team_id: &str) -> Option<&TeamStanding> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    pub fn leader(&self) -> Option<&TeamStanding> {
        self.teams.first()
    }

    /// Mean of every team's average process score
    pub fn league_average(&self) -> f64 {
        if self.teams.is_empty() {
            return 0.0;
        }
        self.teams
            .iter()
            .map(|t| t.summary.avg_process_score)
            .sum::<f64>()
            / self.teams.len() as f64
    }

    pub fn best_score(&self) -> Option<f64> {
        self.leader().map(|t| t.summary.avg_process_score)
    }

    /// Team with the highest points per game; the first listed wins ties
    pub fn most_points_per_game(&self) -> Option<&TeamStanding> {
        self.teams.iter().fold(None, |best: Option<&TeamStanding>, team| match best {
            Some(current) if team.summary.avg_points <= current.summary.avg_points => {
                Some(current)
            }
            _ => Some(team),
        })
    }

    /// Each team's distance from the league average and from first place
    pub fn deltas(&self) -> Vec<TeamDelta> {
        let average = self.league_average();
        let best = self.best_score().unwrap_or(0.0);
        self.teams
            .iter()
            .map(|t| TeamDelta {
                team_id: t.team_id.clone(),
                vs_average: t.summary.avg_process_score - average,
                vs_leader: t.summary.avg_process_score - best,
            })
            .collect()
    }
}
