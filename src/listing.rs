//! Paginated league standings retrieval.
//!
//! Walks the standings pages sequentially (each page's continuation flag
//! gates the next request) and stitches them into one ordered team listing.

use tracing::{info, warn};

use crate::client::StandingsSource;
use crate::error::LeaderboardError;
use crate::types::TeamStandingEntry;

/// Fetch the complete team listing for a league.
///
/// Stops at the first empty page or the first page with `has_next == false`.
/// A failure on page 1 is fatal (`ListingUnavailable`). A failure on a later
/// page ends pagination early and returns the pages accumulated so far; the
/// upstream gives no way to resume mid-listing, so a truncated listing beats
/// losing the whole job.
pub async fn fetch_league_listing<S: StandingsSource>(
    source: &S,
    league_id: u64,
) -> Result<Vec<TeamStandingEntry>, LeaderboardError> {
    let mut teams: Vec<TeamStandingEntry> = Vec::new();
    let mut page: u32 = 1;

    loop {
        match source.standings_page(league_id, page).await {
            Ok(standings) => {
                if standings.results.is_empty() {
                    break;
                }
                teams.extend(standings.results);
                if !standings.has_next {
                    break;
                }
                page += 1;
            }
            Err(e) if page == 1 => {
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "[LISTING] league {}: page {} failed ({}), continuing with {} teams",
                    league_id,
                    page,
                    e,
                    teams.len()
                );
                break;
            }
        }
    }

    info!(
        "[LISTING] league {}: {} teams across {} page(s)",
        league_id,
        teams.len(),
        page
    );
    Ok(teams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StandingsPage;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted page source: one canned outcome per page number.
    struct PagedSource {
        pages: Vec<Result<StandingsPage, ()>>,
        requested: AtomicU32,
    }

    impl PagedSource {
        fn new(pages: Vec<Result<StandingsPage, ()>>) -> Self {
            Self { pages, requested: AtomicU32::new(0) }
        }

        fn pages_requested(&self) -> u32 {
            self.requested.load(Ordering::SeqCst)
        }
    }

    impl StandingsSource for PagedSource {
        async fn standings_page(
            &self,
            league_id: u64,
            page: u32,
        ) -> Result<StandingsPage, LeaderboardError> {
            self.requested.fetch_add(1, Ordering::SeqCst);
            match self.pages.get(page as usize - 1) {
                Some(Ok(p)) => Ok(p.clone()),
                _ => Err(LeaderboardError::ListingUnavailable {
                    league_id,
                    reason: "status 503".into(),
                }),
            }
        }
    }

    fn page_of(ids: &[u64], has_next: bool) -> StandingsPage {
        StandingsPage {
            has_next,
            results: ids
                .iter()
                .map(|&id| TeamStandingEntry {
                    team_id: id,
                    entry_name: format!("team-{id}"),
                    player_name: format!("owner-{id}"),
                    total_points: 100,
                    overall_rank: id,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn concatenates_pages_until_has_next_is_false() {
        let source = PagedSource::new(vec![
            Ok(page_of(&[1, 2], true)),
            Ok(page_of(&[3, 4], true)),
            Ok(page_of(&[5], false)),
        ]);
        let teams = fetch_league_listing(&source, 7).await.unwrap();
        assert_eq!(
            teams.iter().map(|t| t.team_id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        // Stops exactly at the has_next=false page, not one early or late
        assert_eq!(source.pages_requested(), 3);
    }

    #[tokio::test]
    async fn stops_at_first_empty_page() {
        let source = PagedSource::new(vec![
            Ok(page_of(&[1], true)),
            Ok(page_of(&[], true)),
            Ok(page_of(&[9], false)),
        ]);
        let teams = fetch_league_listing(&source, 7).await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(source.pages_requested(), 2);
    }

    #[tokio::test]
    async fn first_page_failure_is_fatal() {
        let source = PagedSource::new(vec![Err(())]);
        let err = fetch_league_listing(&source, 7).await.unwrap_err();
        assert!(matches!(
            err,
            LeaderboardError::ListingUnavailable { league_id: 7, .. }
        ));
    }

    #[tokio::test]
    async fn later_page_failure_degrades_to_partial_listing() {
        let source = PagedSource::new(vec![Ok(page_of(&[1, 2], true)), Err(())]);
        let teams = fetch_league_listing(&source, 7).await.unwrap();
        assert_eq!(teams.len(), 2);
    }
}
