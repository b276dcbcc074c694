//! Decision Engine
//!
//! Scores fantasy start/sit decisions on a 0-10 process scale, independent of
//! raw points, and rolls the scores up into week, season and league reports.
//! Seasons are assembled progressively from a rate-limited league backend.

pub mod cache;
pub mod config;
pub mod error;
pub mod league;
pub mod loader;
pub mod logging;
pub mod models;
pub mod scorer;
pub mod season;
pub mod service;
pub mod source;
pub mod thresholds;
pub mod week;

pub use cache::{CacheCategory, Clock, ManualClock, SystemClock, TimeBoxedCache};
pub use config::EngineConfig;
pub use error::{EngineError, LoadError, Result, SourceError};
pub use league::LeagueAggregator;
pub use loader::{LoadOutcome, LoadProgress, LoadState, ProgressiveSeasonLoader, WeekMarker};
pub use models::*;
pub use scorer::{DecisionScorer, ScoringConfig};
pub use season::SeasonAggregator;
pub use service::DecisionService;
pub use source::{HttpRosterSource, RosterSource};
pub use thresholds::{thresholds, PositionThresholds};
pub use week::WeekAggregator;
