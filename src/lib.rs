//! Gameweek leaderboard aggregation for FPL classic leagues.
//!
//! Fetches the full (paginated) league standings, fans out per-team history
//! lookups under a fixed concurrency budget, and ranks the requested
//! gameweek's scores into a leaderboard, reporting incremental progress
//! while the aggregation runs.

pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod jobs;
pub mod listing;
pub mod progress;
pub mod types;
