use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Result, anyhow};
use rayon::prelude::*;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::error::TimelineError;
use crate::feature_store;
use crate::game_store;
use crate::timeline::{BuildOptions, GameTimeline, build_timeline};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeasonId(String);

impl SeasonId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn start_year(&self) -> u16 {
        self.0[..4].parse().unwrap_or_default()
    }
}

impl FromStr for SeasonId {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(anyhow!("season must be 8 digits like 20202021, got `{raw}`"));
        }
        let first = raw[..4].parse::<u16>()?;
        let second = raw[4..].parse::<u16>()?;
        if !(2000..=2029).contains(&first) {
            return Err(anyhow!("season {raw} starts outside 2000-2029"));
        }
        if second != first + 1 {
            return Err(anyhow!("season {raw} must span consecutive years"));
        }
        Ok(Self(raw.to_string()))
    }
}

impl fmt::Display for SeasonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct GameFailure {
    pub game_id: u64,
    pub label: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SeasonSummary {
    pub season: SeasonId,
    pub games_total: usize,
    pub accumulated: usize,
    pub already_present: usize,
    pub records_written: usize,
    pub failures: Vec<GameFailure>,
}

/// Builds and stores timelines for every game directory of a season. Games run
/// in parallel, one engine instance each; a failing game is recorded and the
/// rest carry on.
pub fn accumulate_season(
    conn: &mut Connection,
    data_dir: &Path,
    season: &SeasonId,
    options: &BuildOptions,
    threads: usize,
    force: bool,
) -> Result<SeasonSummary> {
    let season_dir = game_store::season_dir(data_dir, season);
    let games = game_store::list_games(&season_dir)?;
    let run_id = feature_store::begin_run(conn, season)?;

    let mut summary = SeasonSummary {
        season: season.clone(),
        games_total: games.len(),
        accumulated: 0,
        already_present: 0,
        records_written: 0,
        failures: Vec::new(),
    };

    let mut pending: Vec<(u64, PathBuf)> = Vec::new();
    for (game_id, dir) in games {
        if !force && feature_store::has_game(conn, game_id)? {
            info!(game_id, "features already stored; skipping");
            summary.already_present += 1;
            continue;
        }
        pending.push((game_id, dir));
    }

    let built = with_pool(threads, || {
        pending
            .par_iter()
            .map(|(game_id, dir)| (*game_id, build_game(dir, *game_id, options)))
            .collect::<Vec<_>>()
    });

    for (game_id, outcome) in built {
        let stored = outcome.and_then(|timeline| {
            feature_store::replace_game(conn, season, &timeline).map_err(|err| GameFailure {
                game_id,
                label: "store",
                message: format!("{err:#}"),
            })
        });
        match stored {
            Ok(written) => {
                summary.records_written += written;
                summary.accumulated += 1;
            }
            Err(failure) => {
                warn!(
                    game_id,
                    label = failure.label,
                    error = %failure.message,
                    "game timeline failed"
                );
                summary.failures.push(failure);
            }
        }
    }

    feature_store::finish_run(conn, run_id, &summary)?;
    Ok(summary)
}

fn build_game(
    dir: &Path,
    game_id: u64,
    options: &BuildOptions,
) -> std::result::Result<GameTimeline, GameFailure> {
    let tables = game_store::load_game(dir, game_id).map_err(|err| GameFailure {
        game_id,
        label: "load",
        message: format!("{err:#}"),
    })?;
    build_timeline(&tables, options).map_err(|err: TimelineError| GameFailure {
        game_id,
        label: err.label(),
        message: err.to_string(),
    })
}

fn with_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
