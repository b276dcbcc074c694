use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Expected game flow for a started player, when the upstream feed provides one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameScript {
    Favorable,
    Neutral,
    Unfavorable,
}

/// One roster slot's realized outcome for one week
///
/// Bench players share the same shape (see [`BenchRecord`]). Missing or
/// malformed numeric fields decode to zero so one bad record never voids a week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(
        default,
        alias = "playerId",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_label"
    )]
    pub player_id: Option<String>,

    #[serde(default = "default_name", deserialize_with = "lenient_name")]
    pub name: String,

    #[serde(default = "default_position", deserialize_with = "lenient_position")]
    pub position: String,

    #[serde(default, deserialize_with = "lenient_points")]
    pub points: f64,

    #[serde(
        default,
        rename = "projected",
        alias = "projectedPoints",
        deserialize_with = "lenient_points"
    )]
    pub projected: f64,

    /// Probability (0-1) that the player was compromised going in
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_signal")]
    pub injury_risk: Option<f64>,

    /// Matchup quality (0-1), higher is softer
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_signal")]
    pub matchup_quality: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_script")]
    pub game_script: Option<GameScript>,

    /// Roster slot as reported upstream, either a label or a numeric slot id
    #[serde(
        default,
        alias = "slot",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_label"
    )]
    pub lineup_slot: Option<String>,
}

/// A non-started player available as a counterfactual
pub type BenchRecord = PlayerRecord;

impl PlayerRecord {
    pub fn new(
        name: impl Into<String>,
        position: impl Into<String>,
        points: f64,
        projected: f64,
    ) -> Self {
        Self {
            player_id: None,
            name: name.into(),
            position: position.into(),
            points: sanitize(points),
            projected: sanitize(projected),
            injury_risk: None,
            matchup_quality: None,
            game_script: None,
            lineup_slot: None,
        }
    }

    pub fn with_injury_risk(mut self, risk: f64) -> Self {
        self.injury_risk = Some(risk);
        self
    }

    pub fn with_matchup_quality(mut self, quality: f64) -> Self {
        self.matchup_quality = Some(quality);
        self
    }

    pub fn with_game_script(mut self, script: GameScript) -> Self {
        self.game_script = Some(script);
        self
    }
}

/// One team's roster payload for one week
///
/// A null slot list reads as empty and entries that are not player objects
/// are dropped, so a single bad entry only costs that entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRoster {
    #[serde(default, deserialize_with = "lenient_text")]
    pub team_id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub team_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub owner_name: String,
    #[serde(default, deserialize_with = "lenient_players")]
    pub lineup: Vec<PlayerRecord>,
    #[serde(default, deserialize_with = "lenient_players")]
    pub bench: Vec<BenchRecord>,
}

impl WeeklyRoster {
    pub fn new(lineup: Vec<PlayerRecord>, bench: Vec<BenchRecord>) -> Self {
        Self {
            lineup,
            bench,
            ..Default::default()
        }
    }

    /// A roster with nobody started carries nothing to score
    pub fn is_empty(&self) -> bool {
        self.lineup.is_empty()
    }
}

/// Weekly rosters keyed by week number
pub type WeeklyRosters = BTreeMap<u32, WeeklyRoster>;

/// A full season of rosters for one team, as served by the league endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSeason {
    pub team_id: String,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub weeks: WeeklyRosters,
}

/// Performance tier of a raw point total against position thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    Elite,
    Strong,
    Good,
    Average,
    Poor,
    Scoreless,
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PerformanceTier::Elite => "Elite",
            PerformanceTier::Strong => "Strong",
            PerformanceTier::Good => "Good",
            PerformanceTier::Average => "Average",
            PerformanceTier::Poor => "Poor",
            PerformanceTier::Scoreless => "Scoreless",
        };
        f.write_str(label)
    }
}

/// One itemized line of a decision score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub component: String,
    /// Signed point delta contributed by this component
    pub points: f64,
    pub description: String,
}

/// Outcome of the start/sit comparison against the bench
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BenchImpact {
    NoAlternatives,
    Beat {
        alternative: String,
        alternative_points: f64,
        margin: f64,
    },
    Missed {
        alternative: String,
        alternative_points: f64,
        missed_points: f64,
    },
}

impl BenchImpact {
    pub fn alternative(&self) -> Option<&str> {
        match self {
            BenchImpact::NoAlternatives => None,
            BenchImpact::Beat { alternative, .. } | BenchImpact::Missed { alternative, .. } => {
                Some(alternative)
            }
        }
    }

    /// Points the best eligible bench player scored over the starter
    pub fn missed_points(&self) -> f64 {
        match self {
            BenchImpact::Missed { missed_points, .. } => *missed_points,
            _ => 0.0,
        }
    }
}

impl fmt::Display for BenchImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchImpact::NoAlternatives => write!(f, "No alternatives"),
            BenchImpact::Beat { alternative, alternative_points, .. } => {
                write!(f, "Beat {} ({:.1})", alternative, alternative_points)
            }
            BenchImpact::Missed { alternative, missed_points, .. } => {
                write!(f, "{} (+{:.1})", alternative, missed_points)
            }
        }
    }
}

/// Decision quality score for one started player in one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionScore {
    pub player: String,
    pub position: String,
    pub points: f64,
    pub projected: f64,
    pub projection_diff: f64,
    pub tier: PerformanceTier,
    pub base_score: f64,
    pub projection_adjustment: f64,
    pub bench_adjustment: f64,
    pub situational_adjustment: f64,
    /// Always within [0, 10], rounded to one decimal
    pub total: f64,
    pub bench_impact: BenchImpact,
    pub reasoning: String,
    pub feedback: String,
    pub breakdown: Vec<ScoreComponent>,
}

impl DecisionScore {
    pub fn bench_alternative(&self) -> Option<&str> {
        self.bench_impact.alternative()
    }
}

/// Narrative observation derived from a week's decisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    EliteDecision {
        player: String,
        position: String,
        score: f64,
    },
    BenchMiss {
        player: String,
        position: String,
        alternative: String,
        missed_points: f64,
    },
    ProjectionBeat {
        player: String,
        position: String,
        beat_by: f64,
    },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::EliteDecision { player, position, score } => {
                write!(f, "{} choice: {} delivered {:.1}/10 process score", position, player, score)
            }
            Insight::BenchMiss { player, alternative, missed_points, .. } => {
                write!(
                    f,
                    "Starting {} over {} could have gained {:.1} points",
                    alternative, player, missed_points
                )
            }
            Insight::ProjectionBeat { player, beat_by, .. } => {
                write!(f, "{} beat projection by {:.1}", player, beat_by)
            }
        }
    }
}

/// Best started performance of a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPlayer {
    pub name: String,
    pub position: String,
    pub points: f64,
}

/// Aggregate of one team's decisions for one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub week: u32,
    pub total_points: f64,
    pub total_projected: f64,
    pub projection_diff: f64,
    pub avg_process_score: f64,
    pub points_lost_to_bench: f64,
    /// Percent of scored points kept after bench losses
    pub efficiency: f64,
    pub top_player: TopPlayer,
    pub big_miss: Option<String>,
    pub insights: Vec<Insight>,
    pub context: String,
    pub bottom_line: String,
    pub decisions: Vec<DecisionScore>,
}

/// Week counts per process score band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub elite: usize,
    pub strong: usize,
    pub average: usize,
    pub poor: usize,
}

impl TierCounts {
    pub fn total(&self) -> usize {
        self.elite + self.strong + self.average + self.poor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    Elite,
    Good,
}

/// A standout started performance across the season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub week: u32,
    pub player: String,
    pub position: String,
    pub points: f64,
    pub kind: HighlightKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        })
    }
}

/// Position where bench decisions cost the most over the season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementArea {
    pub position: String,
    pub area: String,
    pub missed_points: f64,
    pub priority: Priority,
    pub description: String,
}

/// Per-week line of a season report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPerformance {
    pub week: u32,
    pub points: f64,
    pub top_player: String,
    pub top_points: f64,
    pub process_score: f64,
    pub big_miss: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerRating {
    Elite,
    Strong,
    Solid,
    Developing,
    NeedsImprovement,
}

impl fmt::Display for ManagerRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ManagerRating::Elite => "Elite Manager",
            ManagerRating::Strong => "Strong Manager",
            ManagerRating::Solid => "Solid Manager",
            ManagerRating::Developing => "Developing Manager",
            ManagerRating::NeedsImprovement => "Needs Improvement",
        })
    }
}

/// Aggregate of every week of one team-year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub total_weeks: usize,
    pub total_points: f64,
    pub avg_points: f64,
    pub avg_process_score: f64,
    pub points_lost_to_bench: f64,
    pub tier_counts: TierCounts,
    pub rating: ManagerRating,
    pub weekly_performance: Vec<WeekPerformance>,
    pub highlights: Vec<Highlight>,
    pub improvement_areas: Vec<ImprovementArea>,
}

/// One ranked row of a league snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub rank: usize,
    pub team_id: String,
    pub team_name: String,
    pub owner_name: String,
    pub summary: SeasonSummary,
}

/// Every team's season summary, ordered by process score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub year: i32,
    pub teams: Vec<TeamStanding>,
}

/// How far one team sits from the league average and from first place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDelta {
    pub team_id: String,
    pub vs_average: f64,
    pub vs_leader: f64,
}

/// Round to one decimal place, the precision every score is reported at
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn default_name() -> String {
    "Unknown Player".to_string()
}

fn default_position() -> String {
    "FLEX".to_string()
}

fn value_to_f64(value: Option<serde_json::Value>) -> Option<f64> {
    let parsed = match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn lenient_points<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value_to_f64(value).unwrap_or(0.0))
}

fn lenient_signal<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value_to_f64(value))
}

fn lenient_label<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn text_or(value: Option<serde_json::Value>, fallback: fn() -> String) -> String {
    match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => fallback(),
    }
}

fn lenient_name<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(text_or(value, default_name))
}

fn lenient_position<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(text_or(value, default_position))
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(text_or(value, String::new))
}

fn lenient_players<'de, D>(deserializer: D) -> std::result::Result<Vec<PlayerRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let items = match value {
        Some(serde_json::Value::Array(items)) => items,
        Some(other) if !other.is_null() => {
            warn!("Ignoring roster slot list that is not an array: {}", other);
            return Ok(Vec::new());
        }
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| {
            if !item.is_object() {
                warn!("Dropping roster entry that is not a player: {}", item);
                return None;
            }
            match serde_json::from_value::<PlayerRecord>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Dropping undecodable roster entry: {}", e);
                    None
                }
            }
        })
        .collect())
}

fn lenient_script<'de, D>(deserializer: D) -> std::result::Result<Option<GameScript>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "favorable" => Some(GameScript::Favorable),
            "neutral" => Some(GameScript::Neutral),
            "unfavorable" => Some(GameScript::Unfavorable),
            _ => None,
        },
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_record_defaults_to_zero() {
        let json = r#"{
            "name": "Bijan Robinson",
            "position": "RB",
            "points": null,
            "projected": "n/a"
        }"#;
        let record: PlayerRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.points, 0.0);
        assert_eq!(record.projected, 0.0);
        assert_eq!(record.injury_risk, None);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let record: PlayerRecord = serde_json::from_str("{}").unwrap();

        assert_eq!(record.name, "Unknown Player");
        assert_eq!(record.position, "FLEX");
        assert_eq!(record.points, 0.0);
    }

    #[test]
    fn test_null_labels_use_defaults() {
        let json = r#"{"name": null, "position": 7, "points": 11.0}"#;
        let record: PlayerRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.name, "Unknown Player");
        assert_eq!(record.position, "7");
        assert_eq!(record.points, 11.0);
    }

    #[test]
    fn test_roster_keeps_good_entries_around_bad_ones() {
        let json = r#"{
            "team_id": 4,
            "team_name": null,
            "lineup": [
                {"name": "Puka Nacua", "position": "WR", "points": 17.3},
                null,
                [1, 2]
            ],
            "bench": "none"
        }"#;
        let roster: WeeklyRoster = serde_json::from_str(json).unwrap();

        assert_eq!(roster.team_id, "4");
        assert_eq!(roster.team_name, "");
        assert_eq!(roster.lineup.len(), 1);
        assert_eq!(roster.lineup[0].name, "Puka Nacua");
        assert!(roster.bench.is_empty());
    }

    #[test]
    fn test_projection_alias_and_string_points() {
        let json = r#"{
            "name": "Justin Tucker",
            "position": "K",
            "points": "9.0",
            "projectedPoints": 8.3
        }"#;
        let record: PlayerRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.points, 9.0);
        assert_eq!(record.projected, 8.3);
    }

    #[test]
    fn test_numeric_ids_become_labels() {
        let json = r#"{
            "name": "A",
            "position": "RB",
            "points": 7.5,
            "player_id": 4241457,
            "lineup_slot": 20
        }"#;
        let record: PlayerRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.player_id.as_deref(), Some("4241457"));
        assert_eq!(record.lineup_slot.as_deref(), Some("20"));
    }

    #[test]
    fn test_unknown_game_script_is_ignored() {
        let json = r#"{"name": "A", "position": "WR", "points": 10, "game_script": "chaotic"}"#;
        let record: PlayerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.game_script, None);

        let json = r#"{"name": "A", "position": "WR", "points": 10, "game_script": "Favorable"}"#;
        let record: PlayerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.game_script, Some(GameScript::Favorable));
    }

    #[test]
    fn test_bench_impact_display_carries_number() {
        let impact = BenchImpact::Missed {
            alternative: "Tank Dell".to_string(),
            alternative_points: 17.4,
            missed_points: 6.3,
        };

        assert_eq!(impact.missed_points(), 6.3);
        assert_eq!(impact.to_string(), "Tank Dell (+6.3)");
        assert_eq!(BenchImpact::NoAlternatives.missed_points(), 0.0);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(4.93), 4.9);
        assert_eq!(round1(10.0), 10.0);
        assert_eq!(round1(5.12), 5.1);
    }
}
