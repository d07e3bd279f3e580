//! Gameweek leaderboard CLI.
//!
//! Aggregates one FPL classic league for one gameweek and prints the ranked
//! leaderboard, with live progress while the per-team lookups run.
//!
//! Usage: gw-leaderboard <league_id> <gameweek> [--policy sync|poll|stream] [--json]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gw_leaderboard::client::FplClient;
use gw_leaderboard::jobs::JobRegistry;
use gw_leaderboard::progress::ProgressEvent;
use gw_leaderboard::types::Leaderboard;

struct Args {
    league_id: u64,
    gameweek: u32,
    policy: String,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut policy = String::from("stream");
    let mut json = false;

    let mut argv = std::env::args().skip(1);
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--policy" => {
                policy = argv.next().context("--policy needs a value")?;
            }
            "--json" => json = true,
            "--help" | "-h" => {
                bail!("usage: gw-leaderboard <league_id> <gameweek> [--policy sync|poll|stream] [--json]")
            }
            other => positional.push(other.to_string()),
        }
    }

    if positional.len() != 2 {
        bail!("usage: gw-leaderboard <league_id> <gameweek> [--policy sync|poll|stream] [--json]");
    }
    Ok(Args {
        league_id: positional[0].parse().context("league_id must be an integer")?,
        gameweek: positional[1].parse().context("gameweek must be an integer")?,
        policy,
        json,
    })
}

fn print_leaderboard(board: &Leaderboard, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(board)?);
        return Ok(());
    }
    println!(
        "League {} / GW {} ({} managers)",
        board.league_id, board.gameweek, board.total_managers
    );
    println!(
        "{:<4} {:<28} {:<22} {:>4} {:>4} {:>4} {:>7} {:>10}",
        "#", "manager", "player", "gw", "hit", "net", "total", "rank"
    );
    for (i, row) in board.leaderboard.iter().enumerate() {
        println!(
            "{:<4} {:<28} {:<22} {:>4} {:>4} {:>4} {:>7} {:>10}",
            i + 1,
            row.manager_name,
            row.player_name,
            row.gw_points,
            row.transfer_cost,
            row.net_points,
            row.total_points,
            row.overall_rank
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;
    let registry = JobRegistry::new(Arc::new(FplClient::new()));

    match args.policy.as_str() {
        "sync" => {
            let board = registry.run_sync(args.league_id, args.gameweek).await?;
            print_leaderboard(&board, args.json)?;
        }
        "poll" => {
            let job_id = registry.start(args.league_id, args.gameweek);
            info!("[MAIN] job {} started", job_id);
            loop {
                let snapshot = registry.poll(job_id)?;
                eprintln!(
                    "progress: {}/{} ({}%)",
                    snapshot.processed, snapshot.total, snapshot.percent
                );
                if snapshot.status.is_terminal() {
                    if let Some(message) = snapshot.error {
                        bail!("aggregation failed: {message}");
                    }
                    let board = snapshot.leaderboard.context("completed without leaderboard")?;
                    print_leaderboard(&board, args.json)?;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
        "stream" => {
            let mut rx = registry.stream(args.league_id, args.gameweek);
            while let Some(event) = rx.recv().await {
                match event {
                    ProgressEvent::Progress { processed, total, percent } => {
                        eprintln!("progress: {processed}/{total} ({percent}%)");
                    }
                    ProgressEvent::Complete { leaderboard } => {
                        print_leaderboard(&leaderboard, args.json)?;
                    }
                    ProgressEvent::Error { message } => {
                        bail!("aggregation failed: {message}");
                    }
                }
            }
        }
        other => bail!("unknown policy '{other}', expected sync, poll or stream"),
    }

    Ok(())
}
