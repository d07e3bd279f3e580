//! Concurrent per-team aggregation and leaderboard ranking.
//!
//! The scheduler fans one history lookup per team out over a fixed
//! concurrency budget, in fixed-size submission batches so at most one
//! batch's calls and results are in flight at a time. Individual lookup
//! failures and too-short histories shrink the leaderboard; they never
//! fail the job.

use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::client::{HistorySource, StandingsSource};
use crate::config::{self, HTTP_TIMEOUT_SECS};
use crate::error::LeaderboardError;
use crate::listing::fetch_league_listing;
use crate::progress::{ProgressEvent, ProgressTracker};
use crate::types::{Leaderboard, LeaderboardRow, TeamStandingEntry};

/// Sort rows by raw gameweek points, descending. The sort is stable and
/// there is no secondary key: tied scores keep their listing order.
pub fn rank_rows(rows: &mut [LeaderboardRow]) {
    rows.sort_by(|a, b| b.gw_points.cmp(&a.gw_points));
}

/// Overall latency budget for the fan-out phase: worst case every call in
/// every wave runs to its timeout, plus slack for scheduling.
fn fanout_budget(teams: usize, concurrency: usize) -> Duration {
    let waves = (teams / concurrency.max(1)) as u64 + 2;
    Duration::from_secs(waves * HTTP_TIMEOUT_SECS)
}

/// Fan out history lookups for every team and record one outcome per team.
///
/// Every team increments the tracker's processed counter exactly once,
/// whether its lookup produced a row, covered too few gameweeks, or failed.
/// Throttled progress events go to `events` when a channel is attached.
pub async fn aggregate_gameweek<S: HistorySource>(
    source: &S,
    teams: &[TeamStandingEntry],
    gameweek: u32,
    tracker: &ProgressTracker,
    events: Option<&mpsc::Sender<ProgressEvent>>,
) {
    let concurrency = config::history_concurrency();
    let batch_size = config::history_batch_size();

    for batch in teams.chunks(batch_size) {
        // Owned entries: borrowed items would tie each lookup future to the
        // batch slice and the combined future could no longer be spawned
        let mut outcomes = stream::iter(batch.iter().cloned())
            .map(|team| async move {
                let result = source.team_history(team.team_id).await;
                (team, result)
            })
            .buffer_unordered(concurrency);

        while let Some((team, result)) = outcomes.next().await {
            let row = match result {
                Ok(history) => history
                    .gameweek(gameweek)
                    .map(|score| LeaderboardRow::from_parts(&team, score)),
                Err(e) => {
                    warn!("[AGGREGATE] dropping team {}: {}", team.team_id, e);
                    None
                }
            };
            let tick = tracker.record_unit(row);
            if tick.emit {
                if let Some(tx) = events {
                    let _ = tx
                        .send(ProgressEvent::Progress {
                            processed: tick.processed,
                            total: tick.total,
                            percent: crate::progress::percent(tick.processed, tick.total),
                        })
                        .await;
                }
            }
        }
    }
}

/// Run one full aggregation job: listing fetch, bounded fan-out, ranking.
///
/// This is the single computation path behind all delivery policies; they
/// differ only in how they read the tracker and the event channel.
pub async fn run_pipeline<C>(
    client: &C,
    league_id: u64,
    gameweek: u32,
    tracker: &ProgressTracker,
    events: Option<&mpsc::Sender<ProgressEvent>>,
) -> Result<Leaderboard, LeaderboardError>
where
    C: StandingsSource + HistorySource,
{
    let teams = match fetch_league_listing(client, league_id).await {
        Ok(teams) => teams,
        Err(e) => {
            tracker.fail(e.to_string());
            if let Some(tx) = events {
                let _ = tx.send(ProgressEvent::Error { message: e.to_string() }).await;
            }
            return Err(e);
        }
    };

    tracker.begin(teams.len() as u64);

    let budget = fanout_budget(teams.len(), config::history_concurrency());
    let fanout = aggregate_gameweek(client, &teams, gameweek, tracker, events);
    if tokio::time::timeout(budget, fanout).await.is_err() {
        let err = LeaderboardError::Timeout { budget_secs: budget.as_secs() };
        tracker.fail(err.to_string());
        if let Some(tx) = events {
            let _ = tx.send(ProgressEvent::Error { message: err.to_string() }).await;
        }
        return Err(err);
    }

    let leaderboard = tracker.complete(league_id, gameweek);
    info!(
        "[AGGREGATE] league {} gw {}: ranked {} of {} teams",
        league_id,
        gameweek,
        leaderboard.total_managers,
        teams.len()
    );
    if let Some(tx) = events {
        let _ = tx
            .send(ProgressEvent::Complete { leaderboard: leaderboard.clone() })
            .await;
    }
    Ok(leaderboard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(team_id: u64, gw_points: i32) -> LeaderboardRow {
        LeaderboardRow {
            manager_name: format!("team-{team_id}"),
            player_name: format!("owner-{team_id}"),
            team_id,
            gw_points,
            transfer_cost: 0,
            net_points: gw_points,
            total_points: 0,
            overall_rank: team_id,
        }
    }

    #[test]
    fn ranking_is_descending_by_raw_points() {
        let mut rows = vec![row(1, 40), row(2, 72), row(3, 55)];
        rank_rows(&mut rows);
        assert_eq!(
            rows.iter().map(|r| r.team_id).collect::<Vec<_>>(),
            vec![2, 3, 1]
        );
    }

    #[test]
    fn ranking_keeps_input_order_on_ties() {
        let mut rows = vec![row(10, 50), row(11, 60), row(12, 50), row(13, 50)];
        rank_rows(&mut rows);
        assert_eq!(
            rows.iter().map(|r| r.team_id).collect::<Vec<_>>(),
            vec![11, 10, 12, 13]
        );
    }

    #[test]
    fn fanout_budget_scales_with_team_count() {
        let small = fanout_budget(10, 8);
        let large = fanout_budget(800, 8);
        assert!(large > small);
        // 800 teams at concurrency 8 is 100 waves of up to 10s each
        assert!(large >= Duration::from_secs(1000));
    }
}
