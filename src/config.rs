//! Aggregation pipeline configuration.
//!
//! Constants for the upstream API, concurrency budgets, timeouts and
//! progress cadence, plus environment variable overrides for the knobs
//! worth tuning at runtime.

/// FPL API base URL
pub const FPL_API_BASE: &str = "https://fantasy.premierleague.com/api";

/// Per-call HTTP timeout (seconds) for both standings and history requests
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Default number of concurrent history lookups
pub const HISTORY_CONCURRENCY: usize = 8;

/// Default submission batch size: at most one batch of history lookups is
/// in flight at a time, bounding peak memory for very large leagues
pub const HISTORY_BATCH_SIZE: usize = 50;

/// Emit a progress event at most once per this many unit completions
/// (the final unit always emits)
pub const PROGRESS_EMIT_EVERY: u64 = 10;

/// Finished jobs are evicted from the registry after this many seconds
pub const JOB_EXPIRY_SECS: u64 = 300;

/// Capacity of the progress event channel for the streaming policy
pub const STREAM_CHANNEL_CAPACITY: usize = 64;

/// Concurrent history lookups (set GW_CONCURRENCY=n to override)
pub fn history_concurrency() -> usize {
    static CACHED: std::sync::OnceLock<usize> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("GW_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(HISTORY_CONCURRENCY)
    })
}

/// Submission batch size (set GW_BATCH_SIZE=n to override)
pub fn history_batch_size() -> usize {
    static CACHED: std::sync::OnceLock<usize> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("GW_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(HISTORY_BATCH_SIZE)
    })
}

/// Job expiry for the poll-by-id registry (set GW_JOB_EXPIRY_SECS=n to override)
pub fn job_expiry_secs() -> u64 {
    static CACHED: std::sync::OnceLock<u64> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("GW_JOB_EXPIRY_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(JOB_EXPIRY_SECS)
    })
}
