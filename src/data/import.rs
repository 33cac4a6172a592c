//! Game import from JSON exports
//!
//! The scraper pipeline that produces these files lives outside this crate;
//! the importer only loads its output into the database.

use std::path::Path;

use crate::data::Database;
use crate::{Game, HoopsError, Result};

/// Load a JSON array of games from a file and upsert them into the database.
///
/// Returns the number of games loaded.
pub fn import_games<P: AsRef<Path>>(db: &Database, path: P) -> Result<usize> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let games: Vec<Game> = serde_json::from_str(&content)
        .map_err(|e| HoopsError::Parse(format!("Invalid game file {}: {}", path.display(), e)))?;

    let count = db.upsert_games(&games)?;
    log::info!("Imported {} games from {}", count, path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::GameRepository;
    use chrono::NaiveDate;

    #[test]
    fn test_import_games_from_json() {
        let json = r#"[
            {
                "date": "2024-01-01",
                "season": "2024",
                "external_id": "202401010BOS",
                "overtime": null,
                "home": {
                    "name": "BOS",
                    "points": 112,
                    "quarters": [30, 25, 28, 29],
                    "metrics": {
                        "pace": 99.5, "efg": 0.55, "tov": 0.12,
                        "orb": 0.25, "ftfga": 0.2, "ortg": 112.0
                    }
                },
                "away": {
                    "name": "MIA",
                    "points": 104,
                    "quarters": [26, 27, 25, 26],
                    "metrics": {
                        "pace": null, "efg": null, "tov": null,
                        "orb": null, "ftfga": null, "ortg": null
                    }
                }
            }
        ]"#;

        let dir = std::env::temp_dir().join("hoops-import-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("games.json");
        std::fs::write(&path, json).unwrap();

        let db = Database::in_memory().unwrap();
        let count = import_games(&db, &path).unwrap();
        assert_eq!(count, 1);

        let before = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let games = db.completed_games_before("BOS", "2024", before).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].home.points, Some(112));
        assert_eq!(games[0].home.metrics.pace, Some(99.5));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        let dir = std::env::temp_dir().join("hoops-import-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let db = Database::in_memory().unwrap();
        let err = import_games(&db, &path).unwrap_err();
        assert!(matches!(err, HoopsError::Parse(_)));

        std::fs::remove_file(&path).ok();
    }
}
