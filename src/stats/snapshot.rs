//! Point-in-time team performance snapshots
//!
//! The builder is a pure function of a team's prior completed games: no
//! storage access, no shared state between (team, date) pairs. Short-window
//! aggregates cover the 1/3/5/10 most recent games and are only produced
//! when that many prior games exist; season-to-date aggregates always use
//! every prior game.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{AdvancedMetrics, Game};

/// Averages of the six advanced efficiency metrics over some set of games.
///
/// A metric missing on a game is excluded from that metric's sum and
/// divisor, so each average reflects only games that actually carry the
/// figure. Absent means no game in the set had it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricAverages {
    pub pace: Option<f64>,
    pub efg: Option<f64>,
    pub tov: Option<f64>,
    pub orb: Option<f64>,
    pub ftfga: Option<f64>,
    pub ortg: Option<f64>,
}

/// Average points scored per quarter, over games with a complete quarter line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuarterAverages {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub q4: f64,
}

/// Aggregates over one fully populated window of recent games
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Wins within the window
    pub wins: u32,
    /// Average points scored
    pub points_avg: f64,
    /// Average points allowed
    pub points_against_avg: f64,
    pub efficiency: MetricAverages,
}

/// One team's rolling statistics as of a date, using only games strictly
/// before that date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub team: String,
    pub date: NaiveDate,
    pub season: String,

    /// Completed games so far this season
    pub games_played: u32,
    /// Cumulative wins so far this season
    pub wins: u32,
    /// Days since the most recent prior game
    pub day_diff: Option<i64>,
    /// Overtime marker of the most recent prior game
    pub overtime: Option<String>,

    /// Consecutive win count, filled by the streak pass
    pub win_streak: u32,
    /// Consecutive loss count, filled by the streak pass
    pub loss_streak: u32,

    pub points_avg: Option<f64>,
    pub points_against_avg: Option<f64>,
    pub efficiency: MetricAverages,
    pub quarters: Option<QuarterAverages>,

    pub last1: Option<WindowStats>,
    pub last3: Option<WindowStats>,
    pub last5: Option<WindowStats>,
    pub last10: Option<WindowStats>,
    pub quarters_last5: Option<QuarterAverages>,
    pub quarters_last10: Option<QuarterAverages>,
}

impl TeamSnapshot {
    /// Snapshot for a team with no prior completed games: counts are zero
    /// and every average is absent
    pub fn empty(team: &str, date: NaiveDate, season: &str) -> Self {
        TeamSnapshot {
            team: team.to_string(),
            date,
            season: season.to_string(),
            games_played: 0,
            wins: 0,
            day_diff: None,
            overtime: None,
            win_streak: 0,
            loss_streak: 0,
            points_avg: None,
            points_against_avg: None,
            efficiency: MetricAverages::default(),
            quarters: None,
            last1: None,
            last3: None,
            last5: None,
            last10: None,
            quarters_last5: None,
            quarters_last10: None,
        }
    }
}

/// One prior game seen from a single team's perspective
struct GameView<'a> {
    date: NaiveDate,
    points_for: i32,
    points_against: i32,
    won: bool,
    quarters: Option<[i32; 4]>,
    metrics: &'a AdvancedMetrics,
    overtime: Option<&'a str>,
}

/// Resolve the team's side of each game, dropping records that violate the
/// completed-game contract (logged, not fatal).
fn resolve_views<'a>(team: &str, games: &'a [Game]) -> Vec<GameView<'a>> {
    let mut views = Vec::with_capacity(games.len());
    for game in games {
        let (Some(line), Some(opponent)) = (game.line_for(team), game.line_against(team)) else {
            log::warn!("Game on {} does not involve {}, skipping", game.date, team);
            continue;
        };
        let (Some(points_for), Some(points_against)) = (line.points, opponent.points) else {
            log::warn!(
                "Completed game on {} is missing a final score for {}, skipping",
                game.date,
                team
            );
            continue;
        };
        views.push(GameView {
            date: game.date,
            points_for,
            points_against,
            won: points_for > points_against,
            quarters: line.complete_quarters(),
            metrics: &line.metrics,
            overtime: game.overtime.as_deref(),
        });
    }
    views
}

/// Running sum and count for one metric; games without the metric do not
/// move the divisor
#[derive(Default)]
struct MetricAccum {
    sum: f64,
    count: u32,
}

impl MetricAccum {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn average(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.sum / self.count as f64)
        } else {
            None
        }
    }
}

fn window_stats(games: &[GameView]) -> WindowStats {
    let mut wins = 0u32;
    let mut points_for = 0i64;
    let mut points_against = 0i64;
    let mut pace = MetricAccum::default();
    let mut efg = MetricAccum::default();
    let mut tov = MetricAccum::default();
    let mut orb = MetricAccum::default();
    let mut ftfga = MetricAccum::default();
    let mut ortg = MetricAccum::default();

    for game in games {
        if game.won {
            wins += 1;
        }
        points_for += game.points_for as i64;
        points_against += game.points_against as i64;
        pace.add(game.metrics.pace);
        efg.add(game.metrics.efg);
        tov.add(game.metrics.tov);
        orb.add(game.metrics.orb);
        ftfga.add(game.metrics.ftfga);
        ortg.add(game.metrics.ortg);
    }

    let count = games.len() as f64;
    WindowStats {
        wins,
        points_avg: points_for as f64 / count,
        points_against_avg: points_against as f64 / count,
        efficiency: MetricAverages {
            pace: pace.average(),
            efg: efg.average(),
            tov: tov.average(),
            orb: orb.average(),
            ftfga: ftfga.average(),
            ortg: ortg.average(),
        },
    }
}

/// Per-quarter scoring averages over the games carrying a complete quarter
/// line; games with any quarter missing contribute to neither the sums nor
/// the divisor.
fn quarter_averages(games: &[GameView]) -> Option<QuarterAverages> {
    let mut sums = [0i64; 4];
    let mut with_quarters = 0u32;

    for game in games {
        if let Some(quarters) = game.quarters {
            for (sum, q) in sums.iter_mut().zip(quarters) {
                *sum += q as i64;
            }
            with_quarters += 1;
        }
    }

    if with_quarters == 0 {
        return None;
    }
    let count = with_quarters as f64;
    Some(QuarterAverages {
        q1: sums[0] as f64 / count,
        q2: sums[1] as f64 / count,
        q3: sums[2] as f64 / count,
        q4: sums[3] as f64 / count,
    })
}

/// Build the snapshot for one (team, date) pair.
///
/// `prior_games` holds every completed game involving the team in the
/// season with a date strictly before `date`, most recent first. Window
/// math only looks at the 10 most recent; season-to-date aggregates use
/// the whole list.
pub fn build_snapshot(
    team: &str,
    date: NaiveDate,
    season: &str,
    prior_games: &[Game],
) -> TeamSnapshot {
    let mut snapshot = TeamSnapshot::empty(team, date, season);

    let views = resolve_views(team, prior_games);
    let Some(latest) = views.first() else {
        return snapshot;
    };

    snapshot.day_diff = Some((date - latest.date).num_days());
    snapshot.overtime = latest.overtime.map(str::to_string);
    snapshot.games_played = views.len() as u32;

    let season_stats = window_stats(&views);
    snapshot.wins = season_stats.wins;
    snapshot.points_avg = Some(season_stats.points_avg);
    snapshot.points_against_avg = Some(season_stats.points_against_avg);
    snapshot.efficiency = season_stats.efficiency;
    snapshot.quarters = quarter_averages(&views);

    let recent = &views[..views.len().min(10)];
    if !recent.is_empty() {
        snapshot.last1 = Some(window_stats(&recent[..1]));
    }
    if recent.len() >= 3 {
        snapshot.last3 = Some(window_stats(&recent[..3]));
    }
    if recent.len() >= 5 {
        snapshot.last5 = Some(window_stats(&recent[..5]));
        snapshot.quarters_last5 = quarter_averages(&recent[..5]);
    }
    if recent.len() >= 10 {
        snapshot.last10 = Some(window_stats(recent));
        snapshot.quarters_last10 = quarter_averages(recent);
    }

    snapshot
}
