//! Time-boxed in-memory cache
//!
//! Entries are grouped by data category, each with its own TTL. Expired
//! entries are evicted lazily when looked up; there is no background sweep.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::Result;

const KEY_SEPARATOR: &str = "\u{1f}";

/// Kind of data being cached, which decides its TTL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheCategory {
    SeasonData,
    WeeklyData,
    LeagueData,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 3] =
        [CacheCategory::SeasonData, CacheCategory::WeeklyData, CacheCategory::LeagueData];

    fn index(&self) -> usize {
        match self {
            CacheCategory::SeasonData => 0,
            CacheCategory::WeeklyData => 1,
            CacheCategory::LeagueData => 2,
        }
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheCategory::SeasonData => "season_data",
            CacheCategory::WeeklyData => "weekly_data",
            CacheCategory::LeagueData => "league_data",
        })
    }
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: serde_json::Value,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Per-entry view reported by [`TimeBoxedCache::stats`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryStats {
    pub category: CacheCategory,
    pub key: String,
    pub age_secs: i64,
    pub remaining_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub entries: Vec<EntryStats>,
}

/// Expiring cache shared by the loader and the service
pub struct TimeBoxedCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    categories: [Mutex<HashMap<String, CacheEntry>>; 3],
}

impl TimeBoxedCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            categories: [
                Mutex::new(HashMap::new()),
                Mutex::new(HashMap::new()),
                Mutex::new(HashMap::new()),
            ],
        }
    }

    pub fn ttl(&self, category: CacheCategory) -> Duration {
        let secs = match category {
            CacheCategory::SeasonData => self.config.season_ttl_secs,
            CacheCategory::WeeklyData => self.config.weekly_ttl_secs,
            CacheCategory::LeagueData => self.config.league_ttl_secs,
        };
        Duration::seconds(secs as i64)
    }

    /// Join key parts into the lookup key used inside a category
    ///
    /// Parts are separated by the ASCII unit separator, which never appears in
    /// team ids or years, so distinct part lists cannot collide.
    pub fn key(parts: &[&dyn fmt::Display]) -> String {
        parts
            .iter()
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)
    }

    pub fn set<T: Serialize>(
        &self,
        category: CacheCategory,
        data: &T,
        key_parts: &[&dyn fmt::Display],
    ) -> Result<()> {
        let key = Self::key(key_parts);
        let now = self.clock.now();
        let entry = CacheEntry {
            data: serde_json::to_value(data)?,
            created_at: now,
            expires_at: now + self.ttl(category),
        };

        self.categories[category.index()].lock().insert(key.clone(), entry);
        debug!("Cached {} entry {:?}", category, key);
        Ok(())
    }

    /// Look up an entry, evicting it if it has expired
    pub fn get<T: DeserializeOwned>(
        &self,
        category: CacheCategory,
        key_parts: &[&dyn fmt::Display],
    ) -> Result<Option<T>> {
        let key = Self::key(key_parts);
        let now = self.clock.now();

        let data = {
            let mut entries = self.categories[category.index()].lock();
            match entries.get(&key) {
                None => {
                    debug!("Cache miss for {} entry {:?}", category, key);
                    return Ok(None);
                }
                Some(entry) if entry.is_expired(now) => {
                    entries.remove(&key);
                    warn!("Evicted expired {} entry {:?}", category, key);
                    return Ok(None);
                }
                Some(entry) => entry.data.clone(),
            }
        };

        debug!("Cache hit for {} entry {:?}", category, key);
        Ok(Some(serde_json::from_value(data)?))
    }

    /// Clear one category, or everything when `None`
    pub fn clear(&self, category: Option<CacheCategory>) {
        match category {
            Some(category) => {
                let removed = {
                    let mut entries = self.categories[category.index()].lock();
                    let removed = entries.len();
                    entries.clear();
                    removed
                };
                info!("Cleared {} {} cache entries", removed, category);
            }
            None => {
                for category in CacheCategory::ALL {
                    self.categories[category.index()].lock().clear();
                }
                info!("Cleared all cache entries");
            }
        }
    }

    /// Whether an entry is missing or older than `threshold` of its TTL
    pub fn is_stale(
        &self,
        category: CacheCategory,
        threshold: f64,
        key_parts: &[&dyn fmt::Display],
    ) -> bool {
        let key = Self::key(key_parts);
        let entries = self.categories[category.index()].lock();
        let Some(entry) = entries.get(&key) else {
            return true;
        };

        let ttl = (entry.expires_at - entry.created_at).num_milliseconds();
        if ttl <= 0 {
            return true;
        }
        let age = (self.clock.now() - entry.created_at).num_milliseconds();
        age as f64 / ttl as f64 > threshold
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut entries = Vec::new();
        for category in CacheCategory::ALL {
            let map = self.categories[category.index()].lock();
            entries.extend(map.iter().map(|(key, entry)| EntryStats {
                category,
                key: key.clone(),
                age_secs: (now - entry.created_at).num_seconds(),
                remaining_secs: (entry.expires_at - now).num_seconds().max(0),
            }));
        }
        entries.sort_by(|a, b| {
            (a.category.index(), &a.key).cmp(&(b.category.index(), &b.key))
        });

        CacheStats {
            total_entries: entries.len(),
            entries,
        }
    }
}

impl fmt::Debug for TimeBoxedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeBoxedCache")
            .field("config", &self.config)
            .field("entries", &self.stats().total_entries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TopPlayer;

    fn cache() -> (TimeBoxedCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        (TimeBoxedCache::with_clock(CacheConfig::default(), clock.clone()), clock)
    }

    fn sample() -> TopPlayer {
        TopPlayer {
            name: "Lamar Jackson".to_string(),
            position: "QB".to_string(),
            points: 28.16,
        }
    }

    #[test]
    fn test_round_trip_and_expiry() {
        let (cache, clock) = cache();
        cache.set(CacheCategory::WeeklyData, &sample(), &[&"42", &2024, &7]).unwrap();

        let hit: Option<TopPlayer> = cache
            .get(CacheCategory::WeeklyData, &[&"42", &2024, &7])
            .unwrap();
        assert_eq!(hit, Some(sample()));

        clock.advance(Duration::minutes(14));
        assert!(cache
            .get::<TopPlayer>(CacheCategory::WeeklyData, &[&"42", &2024, &7])
            .unwrap()
            .is_some());

        clock.advance(Duration::minutes(1));
        assert!(cache
            .get::<TopPlayer>(CacheCategory::WeeklyData, &[&"42", &2024, &7])
            .unwrap()
            .is_none());
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_categories_have_distinct_ttls() {
        let (cache, clock) = cache();
        for category in CacheCategory::ALL {
            cache.set(category, &sample(), &[&"team"]).unwrap();
        }

        clock.advance(Duration::minutes(31));
        assert!(cache.get::<TopPlayer>(CacheCategory::SeasonData, &[&"team"]).unwrap().is_none());
        assert!(cache.get::<TopPlayer>(CacheCategory::WeeklyData, &[&"team"]).unwrap().is_none());
        assert!(cache.get::<TopPlayer>(CacheCategory::LeagueData, &[&"team"]).unwrap().is_some());
    }

    #[test]
    fn test_keys_are_scoped_by_category_and_parts() {
        let (cache, _) = cache();
        cache.set(CacheCategory::SeasonData, &sample(), &[&"1", &2024]).unwrap();

        let other_category: Option<TopPlayer> =
            cache.get(CacheCategory::LeagueData, &[&"1", &2024]).unwrap();
        let other_year: Option<TopPlayer> =
            cache.get(CacheCategory::SeasonData, &[&"1", &2023]).unwrap();
        assert!(other_category.is_none());
        assert!(other_year.is_none());
        assert_eq!(
            TimeBoxedCache::key(&[&"1", &2024, &"full"]),
            "1\u{1f}2024\u{1f}full"
        );
    }

    #[test]
    fn test_underscored_ids_do_not_collide() {
        let (cache, _) = cache();
        cache.set(CacheCategory::WeeklyData, &sample(), &[&"1_2", &3]).unwrap();

        assert_ne!(
            TimeBoxedCache::key(&[&"1_2", &3]),
            TimeBoxedCache::key(&[&"1", &"2_3"])
        );
        let other: Option<TopPlayer> = cache
            .get(CacheCategory::WeeklyData, &[&"1", &"2_3"])
            .unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn test_clear_by_category_and_all() {
        let (cache, _) = cache();
        cache.set(CacheCategory::SeasonData, &sample(), &[&"a"]).unwrap();
        cache.set(CacheCategory::LeagueData, &sample(), &[&"b"]).unwrap();

        cache.clear(Some(CacheCategory::SeasonData));
        assert_eq!(cache.stats().total_entries, 1);

        cache.clear(None);
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[test]
    fn test_staleness_and_stats() {
        let (cache, clock) = cache();
        assert!(cache.is_stale(CacheCategory::SeasonData, 0.8, &[&"x"]));

        cache.set(CacheCategory::SeasonData, &sample(), &[&"x"]).unwrap();
        clock.advance(Duration::minutes(20));
        assert!(!cache.is_stale(CacheCategory::SeasonData, 0.8, &[&"x"]));

        clock.advance(Duration::minutes(5));
        assert!(cache.is_stale(CacheCategory::SeasonData, 0.8, &[&"x"]));

        let stats = cache.stats();
        assert_eq!(stats.entries[0].age_secs, 25 * 60);
        assert_eq!(stats.entries[0].remaining_secs, 5 * 60);
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        let (cache, _) = cache();
        cache.set(CacheCategory::WeeklyData, &"not a player", &[&"k"]).unwrap();

        assert!(cache.get::<TopPlayer>(CacheCategory::WeeklyData, &[&"k"]).is_err());
    }
}
