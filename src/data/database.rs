//! SQLite database management for games and snapshots
//!
//! Every optional average maps to a nullable column: NULL means "no data",
//! never zero.

use crate::stats::{
    GameRepository, MetricAverages, QuarterAverages, SnapshotStore, TeamSnapshot, WindowStats,
};
use crate::{AdvancedMetrics, Game, Result, TeamLine};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const GAME_COLUMNS: &str = "date, season, external_id, overtime, home_name, away_name, \
     home_points, away_points, \
     home_q1, home_q2, home_q3, home_q4, away_q1, away_q2, away_q3, away_q4, \
     home_pace, home_efg, home_tov, home_orb, home_ftfga, home_ortg, \
     away_pace, away_efg, away_tov, away_orb, away_ftfga, away_ortg";

const SNAPSHOT_COLUMNS: &str = "team_name, date, season, games_played, wins, day_diff, overtime, \
     win_streak, loss_streak, points_avg, points_against_avg, \
     pace_avg, efg_avg, tov_avg, orb_avg, ftfga_avg, ortg_avg, \
     q1_avg, q2_avg, q3_avg, q4_avg, \
     last1_wins, points_avg1, points_against_avg1, \
     pace_avg1, efg_avg1, tov_avg1, orb_avg1, ftfga_avg1, ortg_avg1, \
     last3_wins, points_avg3, points_against_avg3, \
     pace_avg3, efg_avg3, tov_avg3, orb_avg3, ftfga_avg3, ortg_avg3, \
     last5_wins, points_avg5, points_against_avg5, \
     pace_avg5, efg_avg5, tov_avg5, orb_avg5, ftfga_avg5, ortg_avg5, \
     last10_wins, points_avg10, points_against_avg10, \
     pace_avg10, efg_avg10, tov_avg10, orb_avg10, ftfga_avg10, ortg_avg10, \
     q1_avg5, q2_avg5, q3_avg5, q4_avg5, \
     q1_avg10, q2_avg10, q3_avg10, q4_avg10";

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                season TEXT NOT NULL,
                external_id TEXT,
                overtime TEXT,
                home_name TEXT NOT NULL,
                away_name TEXT NOT NULL,
                home_points INTEGER,
                away_points INTEGER,
                home_q1 INTEGER, home_q2 INTEGER, home_q3 INTEGER, home_q4 INTEGER,
                away_q1 INTEGER, away_q2 INTEGER, away_q3 INTEGER, away_q4 INTEGER,
                home_pace REAL, home_efg REAL, home_tov REAL,
                home_orb REAL, home_ftfga REAL, home_ortg REAL,
                away_pace REAL, away_efg REAL, away_tov REAL,
                away_orb REAL, away_ftfga REAL, away_ortg REAL,
                UNIQUE(date, home_name, away_name)
            );

            CREATE TABLE IF NOT EXISTS team_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                team_name TEXT NOT NULL,
                date TEXT NOT NULL,
                season TEXT NOT NULL,
                games_played INTEGER NOT NULL,
                wins INTEGER NOT NULL,
                day_diff INTEGER,
                overtime TEXT,
                win_streak INTEGER NOT NULL DEFAULT 0,
                loss_streak INTEGER NOT NULL DEFAULT 0,
                points_avg REAL, points_against_avg REAL,
                pace_avg REAL, efg_avg REAL, tov_avg REAL,
                orb_avg REAL, ftfga_avg REAL, ortg_avg REAL,
                q1_avg REAL, q2_avg REAL, q3_avg REAL, q4_avg REAL,
                last1_wins INTEGER, points_avg1 REAL, points_against_avg1 REAL,
                pace_avg1 REAL, efg_avg1 REAL, tov_avg1 REAL,
                orb_avg1 REAL, ftfga_avg1 REAL, ortg_avg1 REAL,
                last3_wins INTEGER, points_avg3 REAL, points_against_avg3 REAL,
                pace_avg3 REAL, efg_avg3 REAL, tov_avg3 REAL,
                orb_avg3 REAL, ftfga_avg3 REAL, ortg_avg3 REAL,
                last5_wins INTEGER, points_avg5 REAL, points_against_avg5 REAL,
                pace_avg5 REAL, efg_avg5 REAL, tov_avg5 REAL,
                orb_avg5 REAL, ftfga_avg5 REAL, ortg_avg5 REAL,
                last10_wins INTEGER, points_avg10 REAL, points_against_avg10 REAL,
                pace_avg10 REAL, efg_avg10 REAL, tov_avg10 REAL,
                orb_avg10 REAL, ftfga_avg10 REAL, ortg_avg10 REAL,
                q1_avg5 REAL, q2_avg5 REAL, q3_avg5 REAL, q4_avg5 REAL,
                q1_avg10 REAL, q2_avg10 REAL, q3_avg10 REAL, q4_avg10 REAL,
                UNIQUE(team_name, date, season)
            );

            CREATE INDEX IF NOT EXISTS idx_games_season_date ON games(season, date);
            CREATE INDEX IF NOT EXISTS idx_games_teams ON games(home_name, away_name);
            CREATE INDEX IF NOT EXISTS idx_snapshots_team_date
                ON team_snapshots(team_name, date);
            "#,
        )?;
        Ok(())
    }

    // ==================== Game Operations ====================

    /// Insert or update a game record, backfilling fields that arrive late
    /// (quarter lines and advanced metrics) without clobbering known values
    pub fn upsert_game(&self, game: &Game) -> Result<()> {
        let sql = format!(
            r#"
            INSERT INTO games ({GAME_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                    ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28)
            ON CONFLICT(date, home_name, away_name) DO UPDATE SET
                season = excluded.season,
                external_id = COALESCE(excluded.external_id, external_id),
                overtime = COALESCE(excluded.overtime, overtime),
                home_points = COALESCE(excluded.home_points, home_points),
                away_points = COALESCE(excluded.away_points, away_points),
                home_q1 = COALESCE(excluded.home_q1, home_q1),
                home_q2 = COALESCE(excluded.home_q2, home_q2),
                home_q3 = COALESCE(excluded.home_q3, home_q3),
                home_q4 = COALESCE(excluded.home_q4, home_q4),
                away_q1 = COALESCE(excluded.away_q1, away_q1),
                away_q2 = COALESCE(excluded.away_q2, away_q2),
                away_q3 = COALESCE(excluded.away_q3, away_q3),
                away_q4 = COALESCE(excluded.away_q4, away_q4),
                home_pace = COALESCE(excluded.home_pace, home_pace),
                home_efg = COALESCE(excluded.home_efg, home_efg),
                home_tov = COALESCE(excluded.home_tov, home_tov),
                home_orb = COALESCE(excluded.home_orb, home_orb),
                home_ftfga = COALESCE(excluded.home_ftfga, home_ftfga),
                home_ortg = COALESCE(excluded.home_ortg, home_ortg),
                away_pace = COALESCE(excluded.away_pace, away_pace),
                away_efg = COALESCE(excluded.away_efg, away_efg),
                away_tov = COALESCE(excluded.away_tov, away_tov),
                away_orb = COALESCE(excluded.away_orb, away_orb),
                away_ftfga = COALESCE(excluded.away_ftfga, away_ftfga),
                away_ortg = COALESCE(excluded.away_ortg, away_ortg)
            "#
        );
        self.conn.execute(
            &sql,
            params![
                game.date.format("%Y-%m-%d").to_string(),
                game.season,
                game.external_id,
                game.overtime,
                game.home.name,
                game.away.name,
                game.home.points,
                game.away.points,
                game.home.quarters[0],
                game.home.quarters[1],
                game.home.quarters[2],
                game.home.quarters[3],
                game.away.quarters[0],
                game.away.quarters[1],
                game.away.quarters[2],
                game.away.quarters[3],
                game.home.metrics.pace,
                game.home.metrics.efg,
                game.home.metrics.tov,
                game.home.metrics.orb,
                game.home.metrics.ftfga,
                game.home.metrics.ortg,
                game.away.metrics.pace,
                game.away.metrics.efg,
                game.away.metrics.tov,
                game.away.metrics.orb,
                game.away.metrics.ftfga,
                game.away.metrics.ortg,
            ],
        )?;
        Ok(())
    }

    /// Insert multiple game records
    pub fn upsert_games(&self, games: &[Game]) -> Result<usize> {
        let mut count = 0;
        for game in games {
            self.upsert_game(game)?;
            count += 1;
        }
        Ok(count)
    }

    fn row_to_game(row: &rusqlite::Row) -> rusqlite::Result<Game> {
        let date_str: String = row.get(0)?;
        Ok(Game {
            date: parse_date(0, &date_str)?,
            season: row.get(1)?,
            external_id: row.get(2)?,
            overtime: row.get(3)?,
            home: TeamLine {
                name: row.get(4)?,
                points: row.get(6)?,
                quarters: [row.get(8)?, row.get(9)?, row.get(10)?, row.get(11)?],
                metrics: AdvancedMetrics {
                    pace: row.get(16)?,
                    efg: row.get(17)?,
                    tov: row.get(18)?,
                    orb: row.get(19)?,
                    ftfga: row.get(20)?,
                    ortg: row.get(21)?,
                },
            },
            away: TeamLine {
                name: row.get(5)?,
                points: row.get(7)?,
                quarters: [row.get(12)?, row.get(13)?, row.get(14)?, row.get(15)?],
                metrics: AdvancedMetrics {
                    pace: row.get(22)?,
                    efg: row.get(23)?,
                    tov: row.get(24)?,
                    orb: row.get(25)?,
                    ftfga: row.get(26)?,
                    ortg: row.get(27)?,
                },
            },
        })
    }

    // ==================== Snapshot Operations ====================

    fn row_to_snapshot(row: &rusqlite::Row) -> rusqlite::Result<TeamSnapshot> {
        let date_str: String = row.get(1)?;
        Ok(TeamSnapshot {
            team: row.get(0)?,
            date: parse_date(1, &date_str)?,
            season: row.get(2)?,
            games_played: row.get(3)?,
            wins: row.get(4)?,
            day_diff: row.get(5)?,
            overtime: row.get(6)?,
            win_streak: row.get(7)?,
            loss_streak: row.get(8)?,
            points_avg: row.get(9)?,
            points_against_avg: row.get(10)?,
            efficiency: metrics_from_row(row, 11)?,
            quarters: quarters_from_row(row, 17)?,
            last1: window_from_row(row, 21)?,
            last3: window_from_row(row, 30)?,
            last5: window_from_row(row, 39)?,
            last10: window_from_row(row, 48)?,
            quarters_last5: quarters_from_row(row, 57)?,
            quarters_last10: quarters_from_row(row, 61)?,
        })
    }

    /// The single most recent snapshot for a team strictly before a date,
    /// the record a predictor reads ahead of a target game
    pub fn latest_snapshot_before(
        &self,
        team: &str,
        season: &str,
        before: NaiveDate,
    ) -> Result<Option<TeamSnapshot>> {
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM team_snapshots
             WHERE team_name = ?1 AND season = ?2 AND date < ?3
             ORDER BY date DESC
             LIMIT 1"
        );
        let snapshot = self
            .conn
            .query_row(
                &sql,
                params![team, season, before.format("%Y-%m-%d").to_string()],
                Self::row_to_snapshot,
            )
            .optional()?;
        Ok(snapshot)
    }

    // ==================== Status ====================

    /// Summary counts for the CLI status command
    pub fn status(&self) -> Result<DatabaseStatus> {
        let game_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?;

        let snapshot_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM team_snapshots", [], |row| row.get(0))?;

        let team_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM (SELECT home_name AS name FROM games
             UNION SELECT away_name FROM games)",
            [],
            |row| row.get(0),
        )?;

        let min_date: Option<String> = self
            .conn
            .query_row("SELECT MIN(date) FROM games", [], |row| row.get(0))
            .optional()?
            .flatten();

        let max_date: Option<String> = self
            .conn
            .query_row("SELECT MAX(date) FROM games", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(DatabaseStatus {
            game_count: game_count as usize,
            snapshot_count: snapshot_count as usize,
            team_count: team_count as usize,
            earliest_game: min_date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
            latest_game: max_date.and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        })
    }
}

impl GameRepository for Database {
    fn completed_games_before(
        &self,
        team: &str,
        season: &str,
        before: NaiveDate,
    ) -> Result<Vec<Game>> {
        let sql = format!(
            "SELECT {GAME_COLUMNS} FROM games
             WHERE (home_name = ?1 OR away_name = ?1)
               AND season = ?2 AND date < ?3
               AND home_points IS NOT NULL AND away_points IS NOT NULL
             ORDER BY date DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let games = stmt
            .query_map(
                params![team, season, before.format("%Y-%m-%d").to_string()],
                Self::row_to_game,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(games)
    }

    fn distinct_game_dates(&self, season: &str) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT date FROM games
             WHERE season = ?1
               AND home_points IS NOT NULL AND away_points IS NOT NULL
             ORDER BY date",
        )?;
        let dates = stmt
            .query_map(params![season], |row| {
                let date_str: String = row.get(0)?;
                parse_date(0, &date_str)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(dates)
    }

    fn distinct_teams(&self, season: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM (
                 SELECT home_name AS name FROM games
                 WHERE season = ?1
                   AND home_points IS NOT NULL AND away_points IS NOT NULL
                 UNION
                 SELECT away_name FROM games
                 WHERE season = ?1
                   AND home_points IS NOT NULL AND away_points IS NOT NULL
             ) ORDER BY name",
        )?;
        let teams = stmt
            .query_map(params![season], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(teams)
    }
}

impl SnapshotStore for Database {
    fn delete_season(&self, season: &str) -> Result<usize> {
        let deleted = self
            .conn
            .execute("DELETE FROM team_snapshots WHERE season = ?1", params![season])?;
        Ok(deleted)
    }

    fn upsert(&self, snapshot: &TeamSnapshot) -> Result<()> {
        // Snapshots are always full rows, so a replace is a clean rewrite
        let sql = format!(
            "INSERT OR REPLACE INTO team_snapshots ({SNAPSHOT_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                     ?, ?, ?, ?, ?, ?, ?, ?, ?,
                     ?, ?, ?, ?, ?, ?, ?, ?, ?,
                     ?, ?, ?, ?, ?, ?, ?, ?, ?,
                     ?, ?, ?, ?, ?, ?, ?, ?, ?,
                     ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        let w1 = window_params(snapshot.last1.as_ref());
        let w3 = window_params(snapshot.last3.as_ref());
        let w5 = window_params(snapshot.last5.as_ref());
        let w10 = window_params(snapshot.last10.as_ref());
        let q = quarter_params(snapshot.quarters.as_ref());
        let q5 = quarter_params(snapshot.quarters_last5.as_ref());
        let q10 = quarter_params(snapshot.quarters_last10.as_ref());

        self.conn.execute(
            &sql,
            params![
                snapshot.team,
                snapshot.date.format("%Y-%m-%d").to_string(),
                snapshot.season,
                snapshot.games_played,
                snapshot.wins,
                snapshot.day_diff,
                snapshot.overtime,
                snapshot.win_streak,
                snapshot.loss_streak,
                snapshot.points_avg,
                snapshot.points_against_avg,
                snapshot.efficiency.pace,
                snapshot.efficiency.efg,
                snapshot.efficiency.tov,
                snapshot.efficiency.orb,
                snapshot.efficiency.ftfga,
                snapshot.efficiency.ortg,
                q.0,
                q.1,
                q.2,
                q.3,
                w1.0,
                w1.1,
                w1.2,
                w1.3,
                w1.4,
                w1.5,
                w1.6,
                w1.7,
                w1.8,
                w3.0,
                w3.1,
                w3.2,
                w3.3,
                w3.4,
                w3.5,
                w3.6,
                w3.7,
                w3.8,
                w5.0,
                w5.1,
                w5.2,
                w5.3,
                w5.4,
                w5.5,
                w5.6,
                w5.7,
                w5.8,
                w10.0,
                w10.1,
                w10.2,
                w10.3,
                w10.4,
                w10.5,
                w10.6,
                w10.7,
                w10.8,
                q5.0,
                q5.1,
                q5.2,
                q5.3,
                q10.0,
                q10.1,
                q10.2,
                q10.3,
            ],
        )?;
        Ok(())
    }

    fn snapshot_teams(&self, season: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT team_name FROM team_snapshots
             WHERE season = ?1 ORDER BY team_name",
        )?;
        let teams = stmt
            .query_map(params![season], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    fn snapshots_for_team(&self, team: &str, season: &str) -> Result<Vec<TeamSnapshot>> {
        let sql = format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM team_snapshots
             WHERE team_name = ?1 AND season = ?2
             ORDER BY date"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let snapshots = stmt
            .query_map(params![team, season], Self::row_to_snapshot)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(snapshots)
    }
}

/// Summary counts for the status command
#[derive(Debug, Clone)]
pub struct DatabaseStatus {
    pub game_count: usize,
    pub snapshot_count: usize,
    pub team_count: usize,
    pub earliest_game: Option<NaiveDate>,
    pub latest_game: Option<NaiveDate>,
}

fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn metrics_from_row(row: &rusqlite::Row, base: usize) -> rusqlite::Result<MetricAverages> {
    Ok(MetricAverages {
        pace: row.get(base)?,
        efg: row.get(base + 1)?,
        tov: row.get(base + 2)?,
        orb: row.get(base + 3)?,
        ftfga: row.get(base + 4)?,
        ortg: row.get(base + 5)?,
    })
}

fn quarters_from_row(
    row: &rusqlite::Row,
    base: usize,
) -> rusqlite::Result<Option<QuarterAverages>> {
    let quarters: [Option<f64>; 4] = [
        row.get(base)?,
        row.get(base + 1)?,
        row.get(base + 2)?,
        row.get(base + 3)?,
    ];
    Ok(match quarters {
        [Some(q1), Some(q2), Some(q3), Some(q4)] => Some(QuarterAverages { q1, q2, q3, q4 }),
        _ => None,
    })
}

fn window_from_row(row: &rusqlite::Row, base: usize) -> rusqlite::Result<Option<WindowStats>> {
    let wins: Option<u32> = row.get(base)?;
    let points_avg: Option<f64> = row.get(base + 1)?;
    let points_against_avg: Option<f64> = row.get(base + 2)?;
    Ok(match (wins, points_avg, points_against_avg) {
        (Some(wins), Some(points_avg), Some(points_against_avg)) => Some(WindowStats {
            wins,
            points_avg,
            points_against_avg,
            efficiency: metrics_from_row(row, base + 3)?,
        }),
        _ => None,
    })
}

type WindowParams = (
    Option<u32>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

fn window_params(window: Option<&WindowStats>) -> WindowParams {
    (
        window.map(|w| w.wins),
        window.map(|w| w.points_avg),
        window.map(|w| w.points_against_avg),
        window.and_then(|w| w.efficiency.pace),
        window.and_then(|w| w.efficiency.efg),
        window.and_then(|w| w.efficiency.tov),
        window.and_then(|w| w.efficiency.orb),
        window.and_then(|w| w.efficiency.ftfga),
        window.and_then(|w| w.efficiency.ortg),
    )
}

fn quarter_params(
    quarters: Option<&QuarterAverages>,
) -> (Option<f64>, Option<f64>, Option<f64>, Option<f64>) {
    (
        quarters.map(|q| q.q1),
        quarters.map(|q| q.q2),
        quarters.map(|q| q.q3),
        quarters.map(|q| q.q4),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn make_game(d: NaiveDate, home: &str, hp: Option<i32>, away: &str, ap: Option<i32>) -> Game {
        Game {
            date: d,
            season: "2024".to_string(),
            external_id: None,
            overtime: None,
            home: TeamLine {
                name: home.to_string(),
                points: hp,
                quarters: [None; 4],
                metrics: AdvancedMetrics::default(),
            },
            away: TeamLine {
                name: away.to_string(),
                points: ap,
                quarters: [None; 4],
                metrics: AdvancedMetrics::default(),
            },
        }
    }

    #[test]
    fn test_create_database() {
        let db = Database::in_memory().unwrap();
        let status = db.status().unwrap();
        assert_eq!(status.game_count, 0);
        assert_eq!(status.snapshot_count, 0);
    }

    #[test]
    fn test_game_round_trip() {
        let db = Database::in_memory().unwrap();
        let mut game = make_game(date(1), "BOS", Some(112), "MIA", Some(104));
        game.external_id = Some("202401010BOS".to_string());
        game.overtime = Some("OT".to_string());
        game.home.quarters = [Some(30), Some(25), Some(28), Some(29)];
        game.home.metrics.pace = Some(99.5);
        game.away.metrics.ortg = Some(108.3);
        db.upsert_game(&game).unwrap();

        let games = db
            .completed_games_before("BOS", "2024", date(2))
            .unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0], game);
    }

    #[test]
    fn test_upsert_backfills_without_clobbering() {
        let db = Database::in_memory().unwrap();
        let mut game = make_game(date(1), "BOS", Some(112), "MIA", Some(104));
        game.home.metrics.pace = Some(99.5);
        db.upsert_game(&game).unwrap();

        // Second pass carries the quarter line but not the metrics
        let mut update = make_game(date(1), "BOS", Some(112), "MIA", Some(104));
        update.home.quarters = [Some(30), Some(25), Some(28), Some(29)];
        db.upsert_game(&update).unwrap();

        let games = db.completed_games_before("BOS", "2024", date(2)).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].home.metrics.pace, Some(99.5));
        assert_eq!(games[0].home.quarters[0], Some(30));
    }

    #[test]
    fn test_completed_games_filtering_and_order() {
        let db = Database::in_memory().unwrap();
        db.upsert_game(&make_game(date(1), "BOS", Some(100), "MIA", Some(90)))
            .unwrap();
        db.upsert_game(&make_game(date(3), "MIA", Some(95), "BOS", Some(97)))
            .unwrap();
        // Not yet played
        db.upsert_game(&make_game(date(5), "BOS", None, "NYK", None))
            .unwrap();

        let games = db.completed_games_before("BOS", "2024", date(10)).unwrap();
        assert_eq!(games.len(), 2);
        // Most recent first
        assert_eq!(games[0].date, date(3));
        assert_eq!(games[1].date, date(1));

        // Strictly before
        let games = db.completed_games_before("BOS", "2024", date(3)).unwrap();
        assert_eq!(games.len(), 1);
    }

    #[test]
    fn test_distinct_dates_and_teams() {
        let db = Database::in_memory().unwrap();
        db.upsert_game(&make_game(date(3), "MIA", Some(95), "NYK", Some(88)))
            .unwrap();
        db.upsert_game(&make_game(date(1), "BOS", Some(100), "MIA", Some(90)))
            .unwrap();
        db.upsert_game(&make_game(date(5), "BOS", None, "NYK", None))
            .unwrap();

        let dates = db.distinct_game_dates("2024").unwrap();
        assert_eq!(dates, vec![date(1), date(3)]);

        // NYK only ever appears away, and still shows up
        let teams = db.distinct_teams("2024").unwrap();
        assert_eq!(teams, vec!["BOS", "MIA", "NYK"]);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let db = Database::in_memory().unwrap();
        let mut snapshot = TeamSnapshot::empty("BOS", date(5), "2024");
        snapshot.games_played = 3;
        snapshot.wins = 2;
        snapshot.day_diff = Some(2);
        snapshot.overtime = Some("2OT".to_string());
        snapshot.points_avg = Some(104.5);
        snapshot.points_against_avg = Some(99.0);
        snapshot.efficiency.pace = Some(98.2);
        snapshot.quarters = Some(QuarterAverages {
            q1: 27.0,
            q2: 26.5,
            q3: 25.0,
            q4: 26.0,
        });
        snapshot.last1 = Some(WindowStats {
            wins: 1,
            points_avg: 110.0,
            points_against_avg: 100.0,
            efficiency: MetricAverages {
                pace: Some(98.0),
                ..Default::default()
            },
        });
        snapshot.last3 = Some(WindowStats {
            wins: 2,
            points_avg: 104.5,
            points_against_avg: 99.0,
            efficiency: MetricAverages::default(),
        });

        db.upsert(&snapshot).unwrap();
        let read = db.snapshots_for_team("BOS", "2024").unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0], snapshot);
    }

    #[test]
    fn test_snapshot_upsert_replaces() {
        let db = Database::in_memory().unwrap();
        let mut snapshot = TeamSnapshot::empty("BOS", date(5), "2024");
        db.upsert(&snapshot).unwrap();

        snapshot.win_streak = 3;
        db.upsert(&snapshot).unwrap();

        let read = db.snapshots_for_team("BOS", "2024").unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].win_streak, 3);
    }

    #[test]
    fn test_delete_season_scoped() {
        let db = Database::in_memory().unwrap();
        db.upsert(&TeamSnapshot::empty("BOS", date(5), "2024")).unwrap();
        db.upsert(&TeamSnapshot::empty("BOS", date(5), "2023")).unwrap();

        let deleted = db.delete_season("2024").unwrap();
        assert_eq!(deleted, 1);
        assert!(db.snapshots_for_team("BOS", "2024").unwrap().is_empty());
        assert_eq!(db.snapshots_for_team("BOS", "2023").unwrap().len(), 1);
    }

    #[test]
    fn test_latest_snapshot_before() {
        let db = Database::in_memory().unwrap();
        for d in [1, 3, 5] {
            let mut snapshot = TeamSnapshot::empty("BOS", date(d), "2024");
            snapshot.games_played = d;
            db.upsert(&snapshot).unwrap();
        }

        let latest = db.latest_snapshot_before("BOS", "2024", date(5)).unwrap();
        assert_eq!(latest.unwrap().date, date(3));

        let none = db.latest_snapshot_before("BOS", "2024", date(1)).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_status_counts() {
        let db = Database::in_memory().unwrap();
        db.upsert_game(&make_game(date(1), "BOS", Some(100), "MIA", Some(90)))
            .unwrap();
        db.upsert_game(&make_game(date(3), "MIA", Some(95), "NYK", Some(88)))
            .unwrap();
        db.upsert(&TeamSnapshot::empty("BOS", date(5), "2024")).unwrap();

        let status = db.status().unwrap();
        assert_eq!(status.game_count, 2);
        assert_eq!(status.team_count, 3);
        assert_eq!(status.snapshot_count, 1);
        assert_eq!(status.earliest_game, Some(date(1)));
        assert_eq!(status.latest_game, Some(date(3)));
    }
}
