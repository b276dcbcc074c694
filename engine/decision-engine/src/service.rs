//! Decision service
//!
//! Entry point for callers: wires the roster source, the shared cache and the
//! scoring pipeline together. Cached results are only written after a load or
//! aggregation has fully completed.

use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{CacheCategory, TimeBoxedCache};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::league::LeagueAggregator;
use crate::loader::{LoadOutcome, LoadProgress, ProgressiveSeasonLoader};
use crate::models::{LeagueSnapshot, WeekSummary};
use crate::scorer::{DecisionScorer, ScoringConfig};
use crate::season::SeasonAggregator;
use crate::source::{HttpRosterSource, RosterSource};
use crate::week::WeekAggregator;

pub struct DecisionService {
    config: EngineConfig,
    cache: Arc<TimeBoxedCache>,
    source: Arc<dyn RosterSource>,
    weeks: WeekAggregator,
    league: LeagueAggregator,
    loader: ProgressiveSeasonLoader,
}

impl DecisionService {
    pub fn new(
        config: EngineConfig,
        cache: Arc<TimeBoxedCache>,
        source: Arc<dyn RosterSource>,
    ) -> Result<Self> {
        Self::with_scoring(config, cache, source, ScoringConfig::default())
    }

    pub fn with_scoring(
        config: EngineConfig,
        cache: Arc<TimeBoxedCache>,
        source: Arc<dyn RosterSource>,
        scoring: ScoringConfig,
    ) -> Result<Self> {
        config.validate()?;

        let weeks = WeekAggregator::new(DecisionScorer::new(scoring));
        let seasons = SeasonAggregator::new(weeks);
        let loader = ProgressiveSeasonLoader::new(
            source.clone(),
            cache.clone(),
            seasons,
            config.loader.clone(),
        );

        Ok(Self {
            config,
            cache,
            source,
            weeks,
            league: LeagueAggregator::new(seasons),
            loader,
        })
    }

    /// Service backed by the HTTP league backend and a fresh cache
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let cache = Arc::new(TimeBoxedCache::new(config.cache.clone()));
        let source = Arc::new(HttpRosterSource::new(config.source.clone())?);
        Self::new(config, cache, source)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<TimeBoxedCache> {
        &self.cache
    }

    /// One team's summary for one week
    pub async fn week_summary(&self, team_id: &str, year: i32, week: u32) -> Result<WeekSummary> {
        let key: [&dyn std::fmt::Display; 3] = [&team_id, &year, &week];
        if let Some(summary) = self.cache.get::<WeekSummary>(CacheCategory::WeeklyData, &key)? {
            debug!("Serving week {} for team {} from cache", week, team_id);
            return Ok(summary);
        }

        let rosters = self.source.fetch_week_range(team_id, year, week, week).await?;
        let summary = rosters
            .get(&week)
            .and_then(|roster| self.weeks.aggregate_roster(roster, week))
            .ok_or_else(|| EngineError::NoRoster {
                team_id: team_id.to_string(),
                week,
            })?;

        self.cache.set(CacheCategory::WeeklyData, &summary, &key)?;
        Ok(summary)
    }

    /// Full season for one team, loaded progressively on a cache miss
    ///
    /// `on_progress` is only called when the season is actually loaded.
    pub async fn season_summary<F>(
        &self,
        team_id: &str,
        year: i32,
        on_progress: F,
    ) -> Result<LoadOutcome>
    where
        F: FnMut(&LoadProgress) + Send,
    {
        if let Some(outcome) =
            self.cache.get::<LoadOutcome>(CacheCategory::SeasonData, &[&team_id, &year])?
        {
            debug!("Serving season {} for team {} from cache", year, team_id);
            return Ok(outcome);
        }

        Ok(self.loader.load(team_id, year, on_progress).await?)
    }

    /// Ranked snapshot of every team in the league
    pub async fn league_snapshot(&self, year: i32) -> Result<LeagueSnapshot> {
        let league_id = self.config.source.league_id.as_str();
        if let Some(snapshot) =
            self.cache.get::<LeagueSnapshot>(CacheCategory::LeagueData, &[&league_id, &year])?
        {
            debug!("Serving league {} ({}) from cache", league_id, year);
            return Ok(snapshot);
        }

        let teams = self.source.fetch_league(year, 1, self.config.loader.season_weeks).await?;
        let snapshot = self.league.aggregate(year, &teams);

        self.cache.set(CacheCategory::LeagueData, &snapshot, &[&league_id, &year])?;
        info!("Cached league {} snapshot for {}", league_id, year);
        Ok(snapshot)
    }

    /// Drop cached results, for one category or all of them
    pub fn invalidate(&self, category: Option<CacheCategory>) {
        self.cache.clear(category);
    }
}
