//! NBA team form tracking CLI
//!
//! Loads completed games into SQLite and regenerates per-team rolling
//! statistics snapshots for a season.

use clap::{Parser, Subcommand};
use hoops::{Config, Result};

#[derive(Parser)]
#[command(name = "hoops")]
#[command(about = "NBA team rolling statistics for match prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Import games from a JSON export
    Import {
        /// Path to a JSON array of games
        file: String,
    },
    /// Statistics commands
    Stats {
        #[command(subcommand)]
        action: StatsCommands,
    },
    /// Show a team's snapshots for a season
    History {
        /// Team name
        team: String,
        /// Season (defaults to the configured current season)
        #[arg(long)]
        season: Option<String>,
    },
    /// Show database status
    Status,
}

#[derive(Subcommand)]
enum StatsCommands {
    /// Rebuild a season's snapshots, then recompute streaks
    Generate {
        /// Season (defaults to the configured current season)
        #[arg(long)]
        season: Option<String>,
    },
    /// Recompute win/loss streaks only
    Streaks {
        /// Season (defaults to the configured current season)
        #[arg(long)]
        season: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Import { file } => commands::import(&config, &file),
        Commands::Stats { action } => match action {
            StatsCommands::Generate { season } => commands::stats_generate(&config, season),
            StatsCommands::Streaks { season } => commands::stats_streaks(&config, season),
        },
        Commands::History { team, season } => commands::history(&config, &team, season),
        Commands::Status => commands::status(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use hoops::data::import::import_games;
    use hoops::data::Database;
    use hoops::stats;

    fn season_or_default(config: &Config, season: Option<String>) -> String {
        season.unwrap_or_else(|| config.league.current_season.clone())
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'hoops import <games.json>' to load game data");
        println!("  3. Run 'hoops stats generate' to compute team statistics");
        Ok(())
    }

    pub fn import(config: &Config, file: &str) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let count = import_games(&db, file)?;
        println!("Stored {} games in database", count);
        Ok(())
    }

    pub fn stats_generate(config: &Config, season: Option<String>) -> Result<()> {
        let season = season_or_default(config, season);
        let db = Database::open(&config.data.database_path)?;

        println!("Rebuilding statistics for season {}...", season);
        let summary = stats::rebuild_season(&db, &db, &season)?;
        println!(
            "Wrote {} snapshots ({} dates x {} teams, {} failed)",
            summary.written, summary.dates, summary.teams, summary.failed
        );

        let updated = stats::update_streaks(&db, &season)?;
        println!("Updated streaks on {} snapshots", updated);
        Ok(())
    }

    pub fn stats_streaks(config: &Config, season: Option<String>) -> Result<()> {
        let season = season_or_default(config, season);
        let db = Database::open(&config.data.database_path)?;

        let updated = stats::update_streaks(&db, &season)?;
        println!("Updated streaks on {} snapshots", updated);
        Ok(())
    }

    pub fn history(config: &Config, team: &str, season: Option<String>) -> Result<()> {
        use hoops::stats::SnapshotStore;

        let season = season_or_default(config, season);
        let db = Database::open(&config.data.database_path)?;

        let snapshots = db.snapshots_for_team(team, &season)?;
        if snapshots.is_empty() {
            println!("No snapshots for {} in season {}", team, season);
            return Ok(());
        }

        let fmt_avg = |v: Option<f64>| match v {
            Some(v) => format!("{:.1}", v),
            None => "-".to_string(),
        };

        println!(
            "{:<12} {:>5} {:>5} {:>8} {:>8} {:>5} {:>5} {:>5}",
            "Date", "GP", "W", "PTS", "OPP", "L5", "WStr", "LStr"
        );
        for s in &snapshots {
            println!(
                "{:<12} {:>5} {:>5} {:>8} {:>8} {:>5} {:>5} {:>5}",
                s.date.format("%Y-%m-%d").to_string(),
                s.games_played,
                s.wins,
                fmt_avg(s.points_avg),
                fmt_avg(s.points_against_avg),
                s.last5.map(|w| w.wins.to_string()).unwrap_or_else(|| "-".to_string()),
                s.win_streak,
                s.loss_streak
            );
        }
        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let status = db.status()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:       {}", config.data.database_path);
        println!("  Teams:      {}", status.team_count);
        println!("  Games:      {}", status.game_count);
        println!("  Snapshots:  {}", status.snapshot_count);
        if let (Some(earliest), Some(latest)) = (status.earliest_game, status.latest_game) {
            println!("  Range:      {} to {}", earliest, latest);
        }
        Ok(())
    }
}
