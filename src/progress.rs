//! Shared progress state for one aggregation job.
//!
//! A single mutex guards the counter pair, the status tag and the
//! in-progress result rows, so a unit's row append and its processed
//! increment are one atomic step. Readers always observe a consistent
//! pair and `processed <= total`.

use std::sync::Mutex;

use serde::Serialize;

use crate::config::PROGRESS_EMIT_EVERY;
use crate::types::{Leaderboard, LeaderboardRow};

/// Job lifecycle tag. Strictly linear:
/// not-started -> in-progress -> {completed | failed}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Point-in-time view of a job, safe to hand to any caller.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub status: JobStatus,
    pub processed: u64,
    pub total: u64,
    /// Floor of processed/total as a percentage; 0 when total is 0
    pub percent: u8,
    /// Present only once status is completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboard: Option<Leaderboard>,
    /// Present only once status is failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Event on the incremental push stream. Exactly one terminal event
/// (`complete` or `error`) ends every stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress { processed: u64, total: u64, percent: u8 },
    Complete { leaderboard: Leaderboard },
    Error { message: String },
}

/// Outcome of recording one unit completion.
#[derive(Debug, Clone, Copy)]
pub struct UnitTick {
    pub processed: u64,
    pub total: u64,
    /// True when this completion should produce a progress event
    /// (throttle boundary or final unit)
    pub emit: bool,
}

struct ProgressInner {
    status: JobStatus,
    processed: u64,
    total: u64,
    rows: Vec<LeaderboardRow>,
    leaderboard: Option<Leaderboard>,
    error: Option<String>,
}

/// Concurrency-safe progress state, written only by the scheduler's
/// completion path and read by whichever emitter policy serves the caller.
pub struct ProgressTracker {
    inner: Mutex<ProgressInner>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ProgressInner {
                status: JobStatus::NotStarted,
                processed: 0,
                total: 0,
                rows: Vec::new(),
                leaderboard: None,
                error: None,
            }),
        }
    }

    /// Fix the unit total and move to in-progress. Called once, after the
    /// listing fetch resolves how many teams the job covers.
    pub fn begin(&self, total: u64) {
        let mut inner = self.inner.lock().unwrap();
        debug_assert_eq!(inner.status, JobStatus::NotStarted);
        inner.status = JobStatus::InProgress;
        inner.total = total;
    }

    /// Record exactly one unit completion, appending the derived row (if the
    /// unit produced one) and bumping the processed counter in one step.
    ///
    /// No-op after the job reached a terminal state (a late completion after
    /// a job-level timeout must not mutate a failed job).
    pub fn record_unit(&self, row: Option<LeaderboardRow>) -> UnitTick {
        let mut inner = self.inner.lock().unwrap();
        if inner.status.is_terminal() {
            return UnitTick { processed: inner.processed, total: inner.total, emit: false };
        }
        if let Some(row) = row {
            inner.rows.push(row);
        }
        inner.processed += 1;
        debug_assert!(inner.processed <= inner.total);
        let emit = inner.processed == inner.total
            || inner.processed % PROGRESS_EMIT_EVERY == 0;
        UnitTick { processed: inner.processed, total: inner.total, emit }
    }

    /// Rank the collected rows and seal the job as completed. Ignored if the
    /// job already reached a terminal state: a failed job stays failed and
    /// the stored leaderboard (if any) is returned unchanged.
    pub fn complete(&self, league_id: u64, gameweek: u32) -> Leaderboard {
        let mut inner = self.inner.lock().unwrap();
        if inner.status.is_terminal() {
            return inner
                .leaderboard
                .clone()
                .unwrap_or_else(|| Leaderboard::new(league_id, gameweek, Vec::new()));
        }
        let mut rows = std::mem::take(&mut inner.rows);
        crate::aggregate::rank_rows(&mut rows);
        let leaderboard = Leaderboard::new(league_id, gameweek, rows);
        inner.leaderboard = Some(leaderboard.clone());
        inner.status = JobStatus::Completed;
        leaderboard
    }

    /// Seal the job as failed. Ignored if already terminal.
    pub fn fail(&self, message: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        if inner.status.is_terminal() {
            return;
        }
        inner.status = JobStatus::Failed;
        inner.error = Some(message.into());
    }

    pub fn status(&self) -> JobStatus {
        self.inner.lock().unwrap().status
    }

    /// Consistent point-in-time snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let inner = self.inner.lock().unwrap();
        ProgressSnapshot {
            status: inner.status,
            processed: inner.processed,
            total: inner.total,
            percent: percent(inner.processed, inner.total),
            leaderboard: inner.leaderboard.clone(),
            error: inner.error.clone(),
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Floor percentage; 0 when total is 0.
pub fn percent(processed: u64, total: u64) -> u8 {
    if total == 0 {
        0
    } else {
        (processed * 100 / total) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn percent_floors_and_handles_zero_total() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(119, 120), 99);
    }

    #[test]
    fn status_machine_is_linear() {
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.status(), JobStatus::NotStarted);
        tracker.begin(2);
        assert_eq!(tracker.status(), JobStatus::InProgress);
        tracker.record_unit(None);
        tracker.record_unit(None);
        tracker.complete(1, 1);
        assert_eq!(tracker.status(), JobStatus::Completed);
        // Terminal state is sticky
        tracker.fail("late failure");
        assert_eq!(tracker.status(), JobStatus::Completed);
        assert!(tracker.snapshot().error.is_none());
    }

    #[test]
    fn complete_after_failure_keeps_the_failed_state() {
        let tracker = ProgressTracker::new();
        tracker.begin(3);
        tracker.record_unit(None);
        tracker.fail("timed out");
        let board = tracker.complete(7, 1);
        assert!(board.leaderboard.is_empty());
        assert_eq!(tracker.status(), JobStatus::Failed);
        assert_eq!(tracker.snapshot().error.as_deref(), Some("timed out"));
    }

    #[test]
    fn record_unit_after_failure_is_a_no_op() {
        let tracker = ProgressTracker::new();
        tracker.begin(5);
        tracker.record_unit(None);
        tracker.fail("timed out");
        let tick = tracker.record_unit(None);
        assert_eq!(tick.processed, 1);
        assert!(!tick.emit);
        assert_eq!(tracker.snapshot().processed, 1);
    }

    #[test]
    fn emit_fires_on_throttle_boundary_and_final_unit() {
        let tracker = ProgressTracker::new();
        tracker.begin(25);
        let mut emitted = Vec::new();
        for _ in 0..25 {
            let tick = tracker.record_unit(None);
            if tick.emit {
                emitted.push(tick.processed);
            }
        }
        assert_eq!(emitted, vec![10, 20, 25]);
    }

    #[test]
    fn concurrent_completions_count_exactly_once_each() {
        let tracker = Arc::new(ProgressTracker::new());
        tracker.begin(400);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let tracker = Arc::clone(&tracker);
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    let tick = tracker.record_unit(None);
                    assert!(tick.processed <= tick.total);
                }
            }));
        }
        // Concurrent readers must never see processed > total
        for _ in 0..100 {
            let snap = tracker.snapshot();
            assert!(snap.processed <= snap.total);
        }
        for handle in handles {
            handle.join().unwrap();
        }
        let snap = tracker.snapshot();
        assert_eq!(snap.processed, 400);
        assert_eq!(snap.percent, 100);
    }
}
