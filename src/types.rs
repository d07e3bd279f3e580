//! Core domain types for standings, histories and the ranked leaderboard.

use serde::{Deserialize, Serialize};

/// One team as listed on a league standings page.
///
/// Immutable once read; unique per team id within a league. `total_points`
/// and `overall_rank` are cumulative season values carried through to the
/// leaderboard unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamStandingEntry {
    /// FPL entry id ("team id")
    pub team_id: u64,
    /// Team (squad) display name
    pub entry_name: String,
    /// Owner display name
    pub player_name: String,
    /// Cumulative season points
    pub total_points: i64,
    /// Cumulative overall rank
    pub overall_rank: u64,
}

/// One standings page plus its continuation signal.
#[derive(Debug, Clone)]
pub struct StandingsPage {
    pub results: Vec<TeamStandingEntry>,
    pub has_next: bool,
}

/// One gameweek's entry in a team's history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GameweekScore {
    /// 1-based gameweek index
    pub event: u32,
    /// Raw points scored in the gameweek
    pub points: i32,
    /// Transfer cost deducted for the gameweek
    pub event_transfers_cost: i32,
}

/// A team's per-gameweek history, ordered by gameweek.
///
/// May be shorter than the requested gameweek when the team joined late.
/// That is a valid state, not an error: the team is simply not on the
/// leaderboard for that gameweek.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamHistory {
    pub current: Vec<GameweekScore>,
}

impl TeamHistory {
    /// The history entry for a 1-based gameweek, if the team existed then.
    pub fn gameweek(&self, gw: u32) -> Option<&GameweekScore> {
        if gw == 0 {
            return None;
        }
        self.current.get(gw as usize - 1)
    }
}

/// One ranked leaderboard row. Field names are the stable wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub manager_name: String,
    pub player_name: String,
    pub team_id: u64,
    pub gw_points: i32,
    pub transfer_cost: i32,
    pub net_points: i32,
    pub total_points: i64,
    pub overall_rank: u64,
}

impl LeaderboardRow {
    /// Combine a standing entry with the requested gameweek's score.
    pub fn from_parts(standing: &TeamStandingEntry, score: &GameweekScore) -> Self {
        Self {
            manager_name: standing.entry_name.clone(),
            player_name: standing.player_name.clone(),
            team_id: standing.team_id,
            gw_points: score.points,
            transfer_cost: score.event_transfers_cost,
            net_points: score.points - score.event_transfers_cost,
            total_points: standing.total_points,
            overall_rank: standing.overall_rank,
        }
    }
}

/// The final aggregation result for one league and gameweek.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    pub league_id: u64,
    pub gameweek: u32,
    pub total_managers: usize,
    pub leaderboard: Vec<LeaderboardRow>,
}

impl Leaderboard {
    pub fn new(league_id: u64, gameweek: u32, leaderboard: Vec<LeaderboardRow>) -> Self {
        Self {
            league_id,
            gameweek,
            total_managers: leaderboard.len(),
            leaderboard,
        }
    }
}
