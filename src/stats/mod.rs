//! Team historical statistics engine
//!
//! Derives point-in-time performance snapshots from completed games. The
//! engine only sees storage through the repository traits below; SQLite is
//! one adapter behind them.

pub mod season;
pub mod snapshot;
pub mod streak;

pub use season::{rebuild_season, RebuildSummary};
pub use snapshot::{build_snapshot, MetricAverages, QuarterAverages, TeamSnapshot, WindowStats};
pub use streak::update_streaks;

use crate::{Game, Result};
use chrono::NaiveDate;

/// Read access to completed games
pub trait GameRepository {
    /// Completed games involving a team in a season strictly before a date,
    /// most recent first
    fn completed_games_before(
        &self,
        team: &str,
        season: &str,
        before: NaiveDate,
    ) -> Result<Vec<Game>>;

    /// Distinct dates on which any completed game occurred in a season,
    /// ascending
    fn distinct_game_dates(&self, season: &str) -> Result<Vec<NaiveDate>>;

    /// Distinct team names appearing (home or away) in a season's games,
    /// in stable order
    fn distinct_teams(&self, season: &str) -> Result<Vec<String>>;
}

/// Persistence for computed snapshots
pub trait SnapshotStore {
    /// Remove every snapshot for a season; returns the number deleted
    fn delete_season(&self, season: &str) -> Result<usize>;

    /// Insert or replace one snapshot, keyed on (team, date, season)
    fn upsert(&self, snapshot: &TeamSnapshot) -> Result<()>;

    /// Distinct team names with snapshots in a season
    fn snapshot_teams(&self, season: &str) -> Result<Vec<String>>;

    /// A team's snapshots for a season, ascending by date
    fn snapshots_for_team(&self, team: &str, season: &str) -> Result<Vec<TeamSnapshot>>;
}
