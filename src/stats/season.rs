//! Season statistics rebuild
//!
//! Regenerates every snapshot for a season from scratch: delete, then one
//! snapshot per (date, team) over the cross product of distinct game dates
//! and teams. Every team gets a snapshot on every game date, including
//! dates it did not play, so downstream consumers can join any team against
//! any date.

use std::collections::HashSet;
use std::sync::{LazyLock, Mutex};

use crate::stats::snapshot::build_snapshot;
use crate::stats::{GameRepository, SnapshotStore};
use crate::{HoopsError, Result};

/// Outcome of one season rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RebuildSummary {
    /// Distinct game dates in the season
    pub dates: usize,
    /// Distinct teams in the season
    pub teams: usize,
    /// Snapshots written
    pub written: usize,
    /// (team, date) pairs that failed and were skipped
    pub failed: usize,
}

static ACTIVE_REBUILDS: LazyLock<Mutex<HashSet<String>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Exclusive claim on rebuilding one season, released on drop. Rebuilds of
/// different seasons run independently.
struct SeasonGuard(String);

impl SeasonGuard {
    fn acquire(season: &str) -> Result<Self> {
        let mut active = ACTIVE_REBUILDS.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(season.to_string()) {
            return Err(HoopsError::RebuildInProgress(season.to_string()));
        }
        Ok(SeasonGuard(season.to_string()))
    }
}

impl Drop for SeasonGuard {
    fn drop(&mut self) {
        let mut active = ACTIVE_REBUILDS.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.0);
    }
}

/// Rebuild every snapshot for a season.
///
/// Dates are processed ascending and teams in the repository's enumeration
/// order, so repeated runs over the same games produce identical snapshot
/// sets. A failure on a single (team, date) pair is logged and counted;
/// only a failing delete step aborts the rebuild.
pub fn rebuild_season<R, S>(games: &R, store: &S, season: &str) -> Result<RebuildSummary>
where
    R: GameRepository,
    S: SnapshotStore,
{
    let _guard = SeasonGuard::acquire(season)?;

    let deleted = store.delete_season(season)?;
    log::info!("Deleted {} existing snapshots for season {}", deleted, season);

    let dates = games.distinct_game_dates(season)?;
    if dates.is_empty() {
        log::warn!("No completed games found for season {}", season);
        return Ok(RebuildSummary::default());
    }
    let teams = games.distinct_teams(season)?;

    let mut summary = RebuildSummary {
        dates: dates.len(),
        teams: teams.len(),
        written: 0,
        failed: 0,
    };

    for date in &dates {
        log::debug!("Processing {} for {} teams", date, teams.len());
        for team in &teams {
            let result = games
                .completed_games_before(team, season, *date)
                .and_then(|prior| store.upsert(&build_snapshot(team, *date, season, &prior)));
            match result {
                Ok(()) => summary.written += 1,
                Err(e) => {
                    log::warn!("Failed to build snapshot for {} on {}: {}", team, date, e);
                    summary.failed += 1;
                }
            }
        }
    }

    log::info!(
        "Season {} rebuild: {} snapshots written, {} failed ({} dates, {} teams)",
        season,
        summary.written,
        summary.failed,
        summary.dates,
        summary.teams
    );
    Ok(summary)
}
