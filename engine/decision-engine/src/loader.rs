//! Progressive season loading
//!
//! A season is assembled from a backend that only serves small, rate-limited
//! slices. A quick fetch of the most recent weeks comes first so callers can
//! render something right away; the remaining weeks follow in sequential
//! chunks. Failed chunks are skipped and reported, not retried.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheCategory, TimeBoxedCache};
use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::models::{SeasonSummary, WeeklyRosters};
use crate::season::SeasonAggregator;
use crate::source::RosterSource;

/// Loader phase reported with every progress update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    QuickFetch,
    ChunkFetch { index: usize, of: usize },
    Complete,
    Failed,
}

/// Entry of the progress feed: a loaded week, a failed chunk, or a week a
/// successful chunk left out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekMarker {
    Loaded(u32),
    Error { start: u32, end: u32 },
    Missing(u32),
}

impl fmt::Display for WeekMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekMarker::Loaded(week) => write!(f, "{}", week),
            WeekMarker::Error { start, end } => write!(f, "Error: {}-{}", start, end),
            WeekMarker::Missing(week) => write!(f, "Missing: {}", week),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: u32,
    pub weeks: Vec<WeekMarker>,
    pub state: LoadState,
}

/// Result of a progressive load that produced a usable season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadOutcome {
    pub team_id: String,
    pub year: i32,
    pub summary: SeasonSummary,
    pub weeks: WeeklyRosters,
    pub attempted_chunks: usize,
    pub failed_chunks: usize,
    /// Weeks requested by a successful chunk that came back without them
    #[serde(default)]
    pub missing_weeks: Vec<u32>,
    /// Some chunks failed or left weeks out, but not enough to reject the season
    pub degraded: bool,
}

impl LoadOutcome {
    pub fn loaded_weeks(&self) -> Vec<u32> {
        self.weeks.keys().copied().collect()
    }
}

/// Orchestrates the quick fetch and chunked follow-up fetches for one team
pub struct ProgressiveSeasonLoader {
    source: Arc<dyn RosterSource>,
    cache: Arc<TimeBoxedCache>,
    seasons: SeasonAggregator,
    config: LoaderConfig,
}

impl ProgressiveSeasonLoader {
    pub fn new(
        source: Arc<dyn RosterSource>,
        cache: Arc<TimeBoxedCache>,
        seasons: SeasonAggregator,
        config: LoaderConfig,
    ) -> Self {
        Self {
            source,
            cache,
            seasons,
            config,
        }
    }

    /// Weeks still missing after `loaded`, split into request-sized chunks
    ///
    /// Every chunk is a contiguous run of at most `chunk_size` weeks, so a
    /// range request never spans a week that is already loaded.
    pub fn plan_chunks(&self, loaded: &WeeklyRosters) -> Vec<Vec<u32>> {
        let size = self.config.chunk_size.max(1) as usize;
        let mut runs: Vec<Vec<u32>> = Vec::new();
        for week in (1..=self.config.season_weeks).filter(|week| !loaded.contains_key(week)) {
            match runs.last_mut() {
                Some(run) if run.last().map(|w| w + 1) == Some(week) => run.push(week),
                _ => runs.push(vec![week]),
            }
        }

        runs.iter()
            .flat_map(|run| run.chunks(size).map(|chunk| chunk.to_vec()))
            .collect()
    }

    /// Load a full season, reporting progress after every upstream call
    ///
    /// Chunks are requested one at a time with a fixed delay before each
    /// call. The callback runs on the loading task, in loader order.
    pub async fn load<F>(
        &self,
        team_id: &str,
        year: i32,
        mut on_progress: F,
    ) -> Result<LoadOutcome, LoadError>
    where
        F: FnMut(&LoadProgress) + Send,
    {
        let total = self.config.season_weeks;
        let mut errors: Vec<WeekMarker> = Vec::new();
        let mut missing: Vec<u32> = Vec::new();

        info!("Starting progressive load for team {} ({})", team_id, year);
        self.throttle().await;
        let quick = match self.source.fetch_recent_weeks(team_id, year).await {
            Ok(weeks) => weeks,
            Err(err) => {
                error!("Quick fetch failed for team {}: {}", team_id, err);
                on_progress(&LoadProgress {
                    loaded: 0,
                    total,
                    weeks: Vec::new(),
                    state: LoadState::Failed,
                });
                return Err(if err.is_auth() {
                    LoadError::Unauthorized(err.to_string())
                } else {
                    LoadError::QuickFetchFailed(err)
                });
            }
        };

        let mut accumulated = WeeklyRosters::new();
        self.merge(&mut accumulated, quick);
        on_progress(&self.progress(&accumulated, &errors, LoadState::QuickFetch));

        let chunks = self.plan_chunks(&accumulated);
        let attempted = chunks.len();
        let mut failed = 0usize;
        if attempted > 0 {
            info!("Loading remaining weeks in {} chunks", attempted);
        }

        for (index, chunk) in chunks.iter().enumerate() {
            let (Some(&start), Some(&end)) = (chunk.iter().min(), chunk.iter().max()) else {
                continue;
            };
            let state = LoadState::ChunkFetch {
                index: index + 1,
                of: attempted,
            };

            self.throttle().await;
            debug!("Loading weeks {}-{}", start, end);
            match self.source.fetch_week_range(team_id, year, start, end).await {
                Ok(weeks) => {
                    let added = self.merge(&mut accumulated, weeks);
                    if added.is_empty() {
                        warn!("No data returned for weeks {}-{}", start, end);
                        failed += 1;
                        errors.push(WeekMarker::Error { start, end });
                    } else {
                        debug!("Loaded weeks {:?}", added);
                        for week in chunk.iter().filter(|w| !accumulated.contains_key(*w)) {
                            warn!("Weeks {}-{} came back without week {}", start, end, week);
                            missing.push(*week);
                            errors.push(WeekMarker::Missing(*week));
                        }
                    }
                }
                Err(err) if err.is_auth() => {
                    error!("Authentication failed while loading weeks {}-{}: {}", start, end, err);
                    on_progress(&self.progress(&accumulated, &errors, LoadState::Failed));
                    return Err(LoadError::Unauthorized(err.to_string()));
                }
                Err(err) => {
                    warn!("Failed to load weeks {}-{}: {}", start, end, err);
                    failed += 1;
                    errors.push(WeekMarker::Error { start, end });
                }
            }
            on_progress(&self.progress(&accumulated, &errors, state));
        }

        if failed * 2 > attempted {
            error!(
                "Too many chunks failed ({} of {}), loaded {}/{} weeks",
                failed,
                attempted,
                accumulated.len(),
                total
            );
            on_progress(&self.progress(&accumulated, &errors, LoadState::Failed));
            return Err(self.insufficient(accumulated, failed, attempted));
        }

        let summary = self.seasons.aggregate_rosters(&accumulated);
        if summary.total_weeks == 0 {
            error!("No usable weeks for team {} ({})", team_id, year);
            on_progress(&self.progress(&accumulated, &errors, LoadState::Failed));
            return Err(self.insufficient(accumulated, failed, attempted));
        }

        on_progress(&self.progress(&accumulated, &errors, LoadState::Complete));
        let outcome = LoadOutcome {
            team_id: team_id.to_string(),
            year,
            summary,
            weeks: accumulated,
            attempted_chunks: attempted,
            failed_chunks: failed,
            degraded: failed > 0 || !missing.is_empty(),
            missing_weeks: missing,
        };

        if let Err(err) = self.cache.set(CacheCategory::SeasonData, &outcome, &[&team_id, &year]) {
            warn!("Failed to cache season for team {}: {}", team_id, err);
        }
        info!(
            "Loaded {}/{} weeks for team {} ({} failed chunks, {} weeks missing)",
            outcome.weeks.len(),
            total,
            team_id,
            failed,
            outcome.missing_weeks.len()
        );

        Ok(outcome)
    }

    /// Merge in-season weeks that are not loaded yet; returns the weeks added
    fn merge(&self, accumulated: &mut WeeklyRosters, incoming: WeeklyRosters) -> Vec<u32> {
        let mut added = Vec::new();
        for (week, roster) in incoming {
            if week == 0 || week > self.config.season_weeks || accumulated.contains_key(&week) {
                continue;
            }
            accumulated.insert(week, roster);
            added.push(week);
        }
        added
    }

    fn progress(
        &self,
        accumulated: &WeeklyRosters,
        errors: &[WeekMarker],
        state: LoadState,
    ) -> LoadProgress {
        let mut weeks: Vec<WeekMarker> = accumulated
            .keys()
            .map(|w| WeekMarker::Loaded(*w))
            .collect();
        weeks.extend(errors.iter().cloned());
        LoadProgress {
            loaded: accumulated.len(),
            total: self.config.season_weeks,
            weeks,
            state,
        }
    }

    fn insufficient(&self, partial: WeeklyRosters, failed: usize, attempted: usize) -> LoadError {
        LoadError::InsufficientData {
            loaded_weeks: partial.len(),
            total_weeks: self.config.season_weeks,
            failed_chunks: failed,
            attempted_chunks: attempted,
            partial,
        }
    }

    async fn throttle(&self) {
        if self.config.request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::error::SourceError;
    use crate::models::{PlayerRecord, TeamSeason, WeeklyRoster};
    use crate::source::SourceResult;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};

    fn roster(week: u32) -> WeeklyRoster {
        WeeklyRoster::new(
            vec![PlayerRecord::new(format!("Starter {}", week), "RB", 12.0, 11.0)],
            vec![PlayerRecord::new(format!("Bench {}", week), "RB", 6.0, 8.0)],
        )
    }

    /// Serves weeks 1..=17, with scripted failures keyed by range start
    struct ScriptedSource {
        quick: SourceResult<Vec<u32>>,
        failures: HashMap<u32, SourceError>,
        gaps: HashSet<u32>,
        range_cap: Option<u32>,
        calls: Mutex<Vec<(u32, u32)>>,
    }

    impl ScriptedSource {
        fn new(quick: Vec<u32>) -> Self {
            Self {
                quick: Ok(quick),
                failures: HashMap::new(),
                gaps: HashSet::new(),
                range_cap: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self, start: u32, err: SourceError) -> Self {
            self.failures.insert(start, err);
            self
        }

        /// Never return `week`, even when it is inside the requested range
        fn omitting(mut self, week: u32) -> Self {
            self.gaps.insert(week);
            self
        }

        /// Truncate ranges longer than `weeks`, as the league server does
        fn capping_ranges(mut self, weeks: u32) -> Self {
            self.range_cap = Some(weeks);
            self
        }
    }

    #[async_trait]
    impl RosterSource for ScriptedSource {
        async fn fetch_recent_weeks(
            &self,
            _team_id: &str,
            _year: i32,
        ) -> SourceResult<WeeklyRosters> {
            let weeks = self.quick.clone()?;
            Ok(weeks.into_iter().map(|w| (w, roster(w))).collect())
        }

        async fn fetch_week_range(
            &self,
            _team_id: &str,
            _year: i32,
            start_week: u32,
            end_week: u32,
        ) -> SourceResult<WeeklyRosters> {
            self.calls.lock().push((start_week, end_week));
            if let Some(err) = self.failures.get(&start_week) {
                return Err(err.clone());
            }
            let end_week = match self.range_cap {
                Some(cap) => end_week.min(start_week + cap - 1),
                None => end_week,
            };
            Ok((start_week..=end_week)
                .filter(|w| !self.gaps.contains(w))
                .map(|w| (w, roster(w)))
                .collect())
        }

        async fn fetch_league(&self, _: i32, _: u32, _: u32) -> SourceResult<Vec<TeamSeason>> {
            Ok(Vec::new())
        }
    }

    fn build_loader(
        source: Arc<ScriptedSource>,
        chunk_size: u32,
    ) -> (ProgressiveSeasonLoader, Arc<TimeBoxedCache>) {
        let cache = Arc::new(TimeBoxedCache::new(CacheConfig::default()));
        let config = LoaderConfig {
            season_weeks: 17,
            chunk_size,
            request_delay_ms: 0,
        };
        let loader = ProgressiveSeasonLoader::new(
            source,
            cache.clone(),
            SeasonAggregator::default(),
            config,
        );
        (loader, cache)
    }

    #[test]
    fn test_plan_chunks_skips_loaded_weeks() {
        let (loader, _) = build_loader(Arc::new(ScriptedSource::new(vec![])), 5);
        let loaded: WeeklyRosters = [15, 16, 17].into_iter().map(|w| (w, roster(w))).collect();

        let chunks = loader.plan_chunks(&loaded);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], vec![1, 2, 3, 4, 5]);
        assert_eq!(chunks[2], vec![11, 12, 13, 14]);
    }

    #[test]
    fn test_plan_chunks_splits_around_mid_season_quick_weeks() {
        let (loader, _) = build_loader(Arc::new(ScriptedSource::new(vec![])), 5);
        let loaded: WeeklyRosters = [4, 5, 6].into_iter().map(|w| (w, roster(w))).collect();

        let chunks = loader.plan_chunks(&loaded);

        assert_eq!(
            chunks,
            vec![
                vec![1, 2, 3],
                vec![7, 8, 9, 10, 11],
                vec![12, 13, 14, 15, 16],
                vec![17],
            ]
        );
    }

    #[tokio::test]
    async fn test_mid_season_quick_fetch_loads_every_week() {
        let source = Arc::new(ScriptedSource::new(vec![4, 5, 6]).capping_ranges(7));
        let (loader, _) = build_loader(source.clone(), 5);

        let outcome = loader.load("3", 2024, |_| {}).await.unwrap();

        assert_eq!(
            *source.calls.lock(),
            vec![(1, 3), (7, 11), (12, 16), (17, 17)]
        );
        assert_eq!(outcome.loaded_weeks(), (1..=17).collect::<Vec<u32>>());
        assert!(outcome.missing_weeks.is_empty());
        assert!(!outcome.degraded);
    }

    #[tokio::test]
    async fn test_week_left_out_of_a_chunk_is_reported() {
        let source = Arc::new(ScriptedSource::new(vec![15, 16, 17]).omitting(8));
        let (loader, _) = build_loader(source, 5);
        let mut updates: Vec<LoadProgress> = Vec::new();

        let outcome = loader
            .load("3", 2024, |p| updates.push(p.clone()))
            .await
            .unwrap();

        assert_eq!(outcome.failed_chunks, 0);
        assert_eq!(outcome.missing_weeks, vec![8]);
        assert!(outcome.degraded);
        assert!(!outcome.weeks.contains_key(&8));
        assert!(updates[2].weeks.contains(&WeekMarker::Missing(8)));
        assert_eq!(updates.last().map(|p| p.state), Some(LoadState::Complete));
    }

    #[tokio::test]
    async fn test_two_of_four_chunks_failing_is_degraded_not_fatal() {
        let source = Arc::new(
            ScriptedSource::new(vec![15, 16, 17])
                .failing(5, SourceError::Unavailable("timeout".to_string()))
                .failing(13, SourceError::Unavailable("502".to_string())),
        );
        let (loader, cache) = build_loader(source.clone(), 4);
        let mut updates: Vec<LoadProgress> = Vec::new();

        let outcome = loader.load("3", 2024, |p| updates.push(p.clone())).await.unwrap();

        let expected: Vec<u32> = (1..=4).chain(9..=12).chain(15..=17).collect();
        assert_eq!(outcome.loaded_weeks(), expected);
        assert_eq!(outcome.attempted_chunks, 4);
        assert_eq!(outcome.failed_chunks, 2);
        assert!(outcome.degraded);

        // quick fetch + one per chunk + completion
        assert_eq!(updates.len(), 6);
        assert_eq!(updates[0].state, LoadState::QuickFetch);
        assert_eq!(updates[0].loaded, 3);
        assert_eq!(updates[4].state, LoadState::ChunkFetch { index: 4, of: 4 });
        assert!(updates[2].weeks.contains(&WeekMarker::Error { start: 5, end: 8 }));
        assert_eq!(updates[5].state, LoadState::Complete);
        assert_eq!(source.calls.lock().len(), 4);

        let cached: Option<LoadOutcome> =
            cache.get(CacheCategory::SeasonData, &[&"3", &2024]).unwrap();
        assert_eq!(cached, Some(outcome));
    }

    #[tokio::test]
    async fn test_majority_failure_keeps_partial_data() {
        let source = Arc::new(
            ScriptedSource::new(vec![15, 16, 17])
                .failing(1, SourceError::Unavailable("reset".to_string()))
                .failing(5, SourceError::Unavailable("reset".to_string()))
                .failing(13, SourceError::NotFound("gone".to_string())),
        );
        let (loader, cache) = build_loader(source, 4);

        let err = loader.load("3", 2024, |_| {}).await.unwrap_err();

        match &err {
            LoadError::InsufficientData { failed_chunks, attempted_chunks, loaded_weeks, .. } => {
                assert_eq!(*failed_chunks, 3);
                assert_eq!(*attempted_chunks, 4);
                assert_eq!(*loaded_weeks, 7);
            }
            other => panic!("Expected InsufficientData, got {:?}", other),
        }
        assert!(err.partial().unwrap().contains_key(&9));
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_remaining_chunks() {
        let source = Arc::new(
            ScriptedSource::new(vec![15, 16, 17])
                .failing(6, SourceError::Unauthorized("401".to_string())),
        );
        let (loader, _) = build_loader(source.clone(), 5);
        let mut states = Vec::new();

        let err = loader.load("3", 2024, |p| states.push(p.state)).await.unwrap_err();

        assert!(matches!(err, LoadError::Unauthorized(_)));
        assert_eq!(*source.calls.lock(), vec![(1, 5), (6, 10)]);
        assert_eq!(states.last(), Some(&LoadState::Failed));
    }

    #[test]
    fn test_quick_fetch_failure_is_fatal() {
        let mut unavailable = ScriptedSource::new(vec![]);
        unavailable.quick = Err(SourceError::Unavailable("down".to_string()));
        let (loader, _) = build_loader(Arc::new(unavailable), 5);

        let err = tokio_test::block_on(loader.load("3", 2024, |_| {})).unwrap_err();
        assert!(matches!(err, LoadError::QuickFetchFailed(_)));

        let mut expired = ScriptedSource::new(vec![]);
        expired.quick = Err(SourceError::Unauthorized("expired".to_string()));
        let (loader, _) = build_loader(Arc::new(expired), 5);

        let err = tokio_test::block_on(loader.load("3", 2024, |_| {})).unwrap_err();
        assert!(matches!(err, LoadError::Unauthorized(_)));
    }

    #[test]
    fn test_later_chunks_never_overwrite_loaded_weeks() {
        let (loader, _) = build_loader(Arc::new(ScriptedSource::new(vec![3])), 5);
        let mut accumulated: WeeklyRosters = [(3, roster(3))].into_iter().collect();
        let mut replacement = roster(3);
        replacement.lineup.clear();

        let incoming: WeeklyRosters =
            [(3, replacement), (4, roster(4)), (40, roster(40))].into_iter().collect();

        let added = loader.merge(&mut accumulated, incoming);

        assert_eq!(added, vec![4]);
        assert!(!accumulated[&3].lineup.is_empty());
        assert!(!accumulated.contains_key(&40));
    }

    #[test]
    fn test_error_marker_display() {
        assert_eq!(WeekMarker::Error { start: 6, end: 10 }.to_string(), "Error: 6-10");
        assert_eq!(WeekMarker::Loaded(4).to_string(), "4");
        assert_eq!(WeekMarker::Missing(8).to_string(), "Missing: 8");
    }
}
