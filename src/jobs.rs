//! Job registry and the three delivery policies.
//!
//! One pipeline, three ways to consume it: block until done (`run_sync`),
//! detach under a job id and poll snapshots (`start` + `poll`), or receive
//! throttled progress events over a channel ending in exactly one terminal
//! event (`stream`). All three agree on percentages and final content.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregate::run_pipeline;
use crate::client::{HistorySource, StandingsSource};
use crate::config::{self, STREAM_CHANNEL_CAPACITY};
use crate::error::LeaderboardError;
use crate::progress::{ProgressEvent, ProgressSnapshot, ProgressTracker};
use crate::types::Leaderboard;

struct JobEntry {
    tracker: Arc<ProgressTracker>,
    finished_at: Mutex<Option<Instant>>,
}

/// Owner of background aggregation jobs.
///
/// Each job's progress state is reachable only through its id. Finished
/// jobs are kept for `expiry` so late pollers can still read the result,
/// then evicted on the next registry access. Detaching a job does not
/// cancel its in-flight work; a job nobody polls again runs to completion
/// and is dropped once expired.
pub struct JobRegistry<C> {
    client: Arc<C>,
    jobs: Mutex<FxHashMap<Uuid, Arc<JobEntry>>>,
    expiry: Duration,
}

impl<C> JobRegistry<C>
where
    C: StandingsSource + HistorySource + 'static,
{
    pub fn new(client: Arc<C>) -> Self {
        Self::with_expiry(client, Duration::from_secs(config::job_expiry_secs()))
    }

    pub fn with_expiry(client: Arc<C>, expiry: Duration) -> Self {
        Self {
            client,
            jobs: Mutex::new(FxHashMap::default()),
            expiry,
        }
    }

    /// Synchronous policy: run the whole job on the caller's task and
    /// return the final leaderboard or the listing error.
    pub async fn run_sync(
        &self,
        league_id: u64,
        gameweek: u32,
    ) -> Result<Leaderboard, LeaderboardError> {
        let tracker = ProgressTracker::new();
        run_pipeline(self.client.as_ref(), league_id, gameweek, &tracker, None).await
    }

    /// Poll policy, half one: detach the job into the background and hand
    /// back the id to poll with.
    pub fn start(&self, league_id: u64, gameweek: u32) -> Uuid {
        let job_id = Uuid::new_v4();
        let entry = Arc::new(JobEntry {
            tracker: Arc::new(ProgressTracker::new()),
            finished_at: Mutex::new(None),
        });
        self.jobs.lock().unwrap().insert(job_id, Arc::clone(&entry));

        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            info!("[JOB] {} started: league {} gw {}", job_id, league_id, gameweek);
            let result =
                run_pipeline(client.as_ref(), league_id, gameweek, &entry.tracker, None).await;
            *entry.finished_at.lock().unwrap() = Some(Instant::now());
            match result {
                Ok(leaderboard) => info!(
                    "[JOB] {} completed with {} managers",
                    job_id, leaderboard.total_managers
                ),
                Err(e) => warn!("[JOB] {} failed: {}", job_id, e),
            }
        });
        job_id
    }

    /// Poll policy, half two: snapshot a job's progress. Once the status is
    /// completed the snapshot carries the final leaderboard.
    pub fn poll(&self, job_id: Uuid) -> Result<ProgressSnapshot, LeaderboardError> {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.retain(|_, entry| {
            match *entry.finished_at.lock().unwrap() {
                Some(finished) => finished.elapsed() < self.expiry,
                None => true,
            }
        });
        jobs.get(&job_id)
            .map(|entry| entry.tracker.snapshot())
            .ok_or(LeaderboardError::UnknownJob(job_id))
    }

    /// Streaming policy: progress events followed by exactly one terminal
    /// event. Dropping the receiver abandons delivery but not the job.
    pub fn stream(&self, league_id: u64, gameweek: u32) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            let tracker = ProgressTracker::new();
            // Terminal events (complete or error) are emitted inside the
            // pipeline, so the Err case needs no extra send here.
            let _ = run_pipeline(client.as_ref(), league_id, gameweek, &tracker, Some(&tx)).await;
        });
        rx
    }
}
