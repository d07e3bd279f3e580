//! Error taxonomy for the aggregation pipeline.
//!
//! Only `ListingUnavailable` ever fails a whole job. A failed or too-short
//! per-team history shrinks the leaderboard and is never surfaced to the
//! caller; `UnknownJob` is a caller error against the poll registry.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// First standings page could not be fetched. Fatal for the job.
    #[error("failed to fetch standings for league {league_id}: {reason}")]
    ListingUnavailable { league_id: u64, reason: String },

    /// One team's history fetch failed (timeout, non-success status or
    /// malformed payload). Absorbed by the scheduler, never job-fatal.
    #[error("failed to fetch history for team {team_id}: {reason}")]
    RecordUnavailable { team_id: u64, reason: String },

    /// Poll against an id that was never issued or has expired.
    #[error("unknown job id {0}")]
    UnknownJob(Uuid),

    /// The job exceeded its overall latency budget.
    #[error("aggregation timed out after {budget_secs}s")]
    Timeout { budget_secs: u64 },
}
