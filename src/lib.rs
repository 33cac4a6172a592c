//! NBA team form tracking
//!
//! Ingests completed box scores and derives per-team, per-date rolling
//! statistics snapshots for a downstream match predictor.

pub mod data;
pub mod stats;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Advanced efficiency figures for one side of a box score.
///
/// Each field is absent until the box-score backfill has run for the game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedMetrics {
    /// Possessions per 48 minutes
    pub pace: Option<f64>,
    /// Effective field-goal percentage
    pub efg: Option<f64>,
    /// Turnover percentage
    pub tov: Option<f64>,
    /// Offensive rebound percentage
    pub orb: Option<f64>,
    /// Free throws per field-goal attempt
    pub ftfga: Option<f64>,
    /// Offensive rating (points per 100 possessions)
    pub ortg: Option<f64>,
}

/// One side of a game: team name, final score, quarter line, efficiency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLine {
    pub name: String,
    /// Final score, null until the game has been played
    pub points: Option<i32>,
    /// Per-quarter points; individual quarters may be missing when the
    /// source page lacks box-score granularity
    pub quarters: [Option<i32>; 4],
    pub metrics: AdvancedMetrics,
}

impl TeamLine {
    /// The quarter line, only when all four values are present
    pub fn complete_quarters(&self) -> Option<[i32; 4]> {
        match self.quarters {
            [Some(q1), Some(q2), Some(q3), Some(q4)] => Some([q1, q2, q3, q4]),
            _ => None,
        }
    }
}

/// A single game record as scraped from the box-score source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub date: NaiveDate,
    pub season: String,
    /// Source page identifier for the box score
    pub external_id: Option<String>,
    /// Overtime marker ("OT", "2OT", ...) when the game went past regulation
    pub overtime: Option<String>,
    pub home: TeamLine,
    pub away: TeamLine,
}

impl Game {
    /// A game is completed once both final scores are recorded
    pub fn is_completed(&self) -> bool {
        self.home.points.is_some() && self.away.points.is_some()
    }

    /// Check if a team was playing at home
    pub fn is_home(&self, team: &str) -> Option<bool> {
        if self.home.name == team {
            Some(true)
        } else if self.away.name == team {
            Some(false)
        } else {
            None
        }
    }

    /// Get the box-score line for a specific team
    pub fn line_for(&self, team: &str) -> Option<&TeamLine> {
        match self.is_home(team)? {
            true => Some(&self.home),
            false => Some(&self.away),
        }
    }

    /// Get the opponent's box-score line for a specific team
    pub fn line_against(&self, team: &str) -> Option<&TeamLine> {
        match self.is_home(team)? {
            true => Some(&self.away),
            false => Some(&self.home),
        }
    }

    /// Final score for a specific team
    pub fn points_for(&self, team: &str) -> Option<i32> {
        self.line_for(team)?.points
    }

    /// Final score against a specific team
    pub fn points_against(&self, team: &str) -> Option<i32> {
        self.line_against(team)?.points
    }

    /// Check if the given team won this game
    pub fn did_win(&self, team: &str) -> Option<bool> {
        Some(self.points_for(team)? > self.points_against(team)?)
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum HoopsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("A statistics rebuild for season {0} is already running")]
    RebuildInProgress(String),
}

pub type Result<T> = std::result::Result<T, HoopsError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub league: LeagueConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueConfig {
    pub current_season: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "data/hoops.db".to_string(),
            },
            league: LeagueConfig {
                current_season: "2024".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HoopsError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| HoopsError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HoopsError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
