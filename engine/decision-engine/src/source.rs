//! Upstream league data
//!
//! [`RosterSource`] is the seam between the engine and the league backend.
//! [`HttpRosterSource`] talks to the backend's secure endpoints; tests plug in
//! in-memory sources instead.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::models::{TeamSeason, WeeklyRoster, WeeklyRosters};

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Provider of per-week roster payloads
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Small, fast slice of the most recent weeks
    async fn fetch_recent_weeks(&self, team_id: &str, year: i32) -> SourceResult<WeeklyRosters>;

    /// Inclusive week range for one team
    async fn fetch_week_range(
        &self,
        team_id: &str,
        year: i32,
        start_week: u32,
        end_week: u32,
    ) -> SourceResult<WeeklyRosters>;

    /// Every team's rosters over an inclusive week range
    async fn fetch_league(
        &self,
        year: i32,
        start_week: u32,
        end_week: u32,
    ) -> SourceResult<Vec<TeamSeason>>;
}

#[derive(Debug, Serialize)]
struct TeamRequest<'a> {
    league_id: &'a str,
    team_id: &'a str,
    year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_week: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_week: Option<u32>,
}

#[derive(Debug, Serialize)]
struct LeagueRequest<'a> {
    league_id: &'a str,
    year: i32,
    start_week: u32,
    end_week: u32,
}

/// League backend client
#[derive(Debug)]
pub struct HttpRosterSource {
    config: SourceConfig,
    client: reqwest::Client,
}

impl HttpRosterSource {
    pub fn new(config: SourceConfig) -> SourceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> SourceResult<Value> {
        let token = self
            .config
            .session_token
            .as_deref()
            .ok_or_else(|| SourceError::Unauthorized("No session token configured".to_string()))?;

        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        debug!("POST {}", url);

        let response = self.client.post(&url).bearer_auth(token).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let message = format!("{} returned {}: {}", endpoint, status, detail);
            return Err(match status.as_u16() {
                401 | 403 => SourceError::Unauthorized(message),
                404 => SourceError::NotFound(message),
                _ => SourceError::Unavailable(message),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RosterSource for HttpRosterSource {
    async fn fetch_recent_weeks(&self, team_id: &str, year: i32) -> SourceResult<WeeklyRosters> {
        let request = TeamRequest {
            league_id: &self.config.league_id,
            team_id,
            year,
            start_week: None,
            end_week: None,
        };
        let body = self.post("secure-team-quick-summary", &request).await?;
        let weeks = parse_team_weeks(&body, team_id)?;
        info!("Quick summary returned {} weeks for team {}", weeks.len(), team_id);
        Ok(weeks)
    }

    async fn fetch_week_range(
        &self,
        team_id: &str,
        year: i32,
        start_week: u32,
        end_week: u32,
    ) -> SourceResult<WeeklyRosters> {
        let request = TeamRequest {
            league_id: &self.config.league_id,
            team_id,
            year,
            start_week: Some(start_week),
            end_week: Some(end_week),
        };
        let body = self.post("secure-team-week-range", &request).await?;
        parse_team_weeks(&body, team_id)
    }

    async fn fetch_league(
        &self,
        year: i32,
        start_week: u32,
        end_week: u32,
    ) -> SourceResult<Vec<TeamSeason>> {
        let request = LeagueRequest {
            league_id: &self.config.league_id,
            year,
            start_week,
            end_week,
        };
        let body = self.post("secure-all-teams-analysis", &request).await?;
        parse_league(&body, end_week)
    }
}

/// Extract one team's rosters from a `weekly_data` response
///
/// Each week holds either `teamRosters[team_id]` or a bare `{lineup, bench}`.
/// Weeks that do not mention the team, or whose payload is not a roster
/// object, are skipped without affecting the others.
pub fn parse_team_weeks(body: &Value, team_id: &str) -> SourceResult<WeeklyRosters> {
    let weekly = body
        .get("weekly_data")
        .and_then(Value::as_object)
        .ok_or_else(|| SourceError::Malformed("Response has no weekly_data".to_string()))?;

    let mut weeks = WeeklyRosters::new();
    for (key, payload) in weekly {
        let Ok(week) = key.trim().parse::<u32>() else {
            warn!("Skipping week with non-numeric key {:?}", key);
            continue;
        };

        let raw = match payload.get("teamRosters") {
            Some(rosters) => match rosters.get(team_id) {
                Some(roster) => roster,
                None => {
                    debug!("Week {} has no roster for team {}", week, team_id);
                    continue;
                }
            },
            None => payload,
        };

        if !raw.is_object() {
            warn!("Skipping week {} with a non-object roster payload", week);
            continue;
        }
        let mut roster: WeeklyRoster = match serde_json::from_value(raw.clone()) {
            Ok(roster) => roster,
            Err(e) => {
                warn!("Skipping undecodable week {}: {}", week, e);
                continue;
            }
        };
        if roster.team_id.is_empty() {
            roster.team_id = team_id.to_string();
        }
        weeks.insert(week, roster);
    }

    Ok(weeks)
}

/// Extract every team's season from a league response
///
/// Weeks past `last_week` are dropped. Teams come back ordered by id.
pub fn parse_league(body: &Value, last_week: u32) -> SourceResult<Vec<TeamSeason>> {
    let teams = body
        .get("teams")
        .and_then(Value::as_object)
        .ok_or_else(|| SourceError::Malformed("Response has no teams".to_string()))?;

    let mut seasons = Vec::with_capacity(teams.len());
    for (id, team) in teams {
        let text = |field: &str| {
            team.get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default()
        };
        let team_id = match text("team_id") {
            from_body if !from_body.is_empty() => from_body,
            _ => id.clone(),
        };

        let mut weeks = if team.get("weekly_data").is_some() {
            parse_team_weeks(team, &team_id)?
        } else {
            WeeklyRosters::new()
        };
        weeks.retain(|week, _| *week <= last_week);

        seasons.push(TeamSeason {
            team_name: text("team_name"),
            owner_name: text("owner_name"),
            team_id,
            weeks,
        });
    }

    seasons.sort_by(|a, b| {
        match (a.team_id.parse::<u64>(), b.team_id.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.team_id.cmp(&b.team_id),
        }
    });
    Ok(seasons)
}
