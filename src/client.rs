//! FPL API client.
//!
//! REST client for the two upstream endpoints the pipeline needs: the
//! paginated classic-league standings listing and the per-team gameweek
//! history. The `StandingsSource` / `HistorySource` traits are the seams
//! the listing fetcher and scheduler consume, so tests can substitute
//! in-memory sources for the live API.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::config::{FPL_API_BASE, HTTP_TIMEOUT_SECS};
use crate::error::LeaderboardError;
use crate::types::{StandingsPage, TeamHistory, TeamStandingEntry};

/// Provider of league standings pages.
pub trait StandingsSource: Send + Sync {
    /// Fetch one standings page (1-based) for a league.
    fn standings_page(
        &self,
        league_id: u64,
        page: u32,
    ) -> impl Future<Output = Result<StandingsPage, LeaderboardError>> + Send;
}

/// Provider of per-team gameweek histories.
pub trait HistorySource: Send + Sync {
    /// Fetch one team's full history. One attempt, no retry.
    fn team_history(
        &self,
        team_id: u64,
    ) -> impl Future<Output = Result<TeamHistory, LeaderboardError>> + Send;
}

// === Wire types ===

#[derive(Deserialize)]
struct StandingsEnvelope {
    standings: StandingsBlock,
}

#[derive(Deserialize)]
struct StandingsBlock {
    #[serde(default)]
    has_next: bool,
    #[serde(default)]
    results: Vec<StandingRow>,
}

#[derive(Deserialize)]
struct StandingRow {
    entry: u64,
    entry_name: String,
    player_name: String,
    total: i64,
    rank: u64,
}

impl From<StandingRow> for TeamStandingEntry {
    fn from(row: StandingRow) -> Self {
        Self {
            team_id: row.entry,
            entry_name: row.entry_name,
            player_name: row.player_name,
            total_points: row.total,
            overall_rank: row.rank,
        }
    }
}

#[derive(Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    current: Vec<HistoryRow>,
}

#[derive(Deserialize)]
struct HistoryRow {
    event: u32,
    points: i32,
    event_transfers_cost: i32,
}

// === Client ===

/// REST client for the FPL API with a fixed per-call timeout.
pub struct FplClient {
    http: reqwest::Client,
    base_url: String,
}

impl FplClient {
    pub fn new() -> Self {
        Self::with_base_url(FPL_API_BASE)
    }

    /// Client against a non-default base URL (staging, local stub).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("status {}", resp.status());
        }
        Ok(resp.json::<T>().await?)
    }
}

impl Default for FplClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StandingsSource for FplClient {
    async fn standings_page(
        &self,
        league_id: u64,
        page: u32,
    ) -> Result<StandingsPage, LeaderboardError> {
        let url = format!(
            "{}/leagues-classic/{}/standings/?page_standings={}",
            self.base_url, league_id, page
        );
        let envelope: StandingsEnvelope = self.get_json(&url).await.map_err(|e| {
            LeaderboardError::ListingUnavailable {
                league_id,
                reason: e.to_string(),
            }
        })?;
        Ok(StandingsPage {
            has_next: envelope.standings.has_next,
            results: envelope
                .standings
                .results
                .into_iter()
                .map(TeamStandingEntry::from)
                .collect(),
        })
    }
}

impl HistorySource for FplClient {
    async fn team_history(&self, team_id: u64) -> Result<TeamHistory, LeaderboardError> {
        let url = format!("{}/entry/{}/history/", self.base_url, team_id);
        let envelope: HistoryEnvelope = self.get_json(&url).await.map_err(|e| {
            LeaderboardError::RecordUnavailable {
                team_id,
                reason: e.to_string(),
            }
        })?;
        Ok(TeamHistory {
            current: envelope
                .current
                .into_iter()
                .map(|row| crate::types::GameweekScore {
                    event: row.event,
                    points: row.points,
                    event_transfers_cost: row.event_transfers_cost,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standings_envelope_parses_fpl_shape() {
        let json = r#"{
            "new_entries": {"results": []},
            "standings": {
                "has_next": true,
                "page": 1,
                "results": [
                    {"id": 9, "entry": 123, "entry_name": "Toon Army",
                     "player_name": "Sam Okoye", "rank": 1, "last_rank": 2,
                     "total": 888, "event_total": 55}
                ]
            }
        }"#;
        let envelope: StandingsEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.standings.has_next);
        let entry: TeamStandingEntry = envelope.standings.results.into_iter().next().unwrap().into();
        assert_eq!(entry.team_id, 123);
        assert_eq!(entry.entry_name, "Toon Army");
        assert_eq!(entry.total_points, 888);
        assert_eq!(entry.overall_rank, 1);
    }

    #[test]
    fn history_envelope_parses_fpl_shape() {
        let json = r#"{
            "current": [
                {"event": 1, "points": 65, "total_points": 65,
                 "event_transfers": 0, "event_transfers_cost": 0, "rank": 1000},
                {"event": 2, "points": 40, "total_points": 105,
                 "event_transfers": 2, "event_transfers_cost": 4, "rank": 2000}
            ],
            "past": [],
            "chips": []
        }"#;
        let envelope: HistoryEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.current.len(), 2);
        assert_eq!(envelope.current[1].points, 40);
        assert_eq!(envelope.current[1].event_transfers_cost, 4);
    }

    #[test]
    fn missing_standings_fields_default() {
        // A last page may omit has_next entirely
        let json = r#"{"standings": {"results": []}}"#;
        let envelope: StandingsEnvelope = serde_json::from_str(json).unwrap();
        assert!(!envelope.standings.has_next);
        assert!(envelope.standings.results.is_empty());
    }
}
