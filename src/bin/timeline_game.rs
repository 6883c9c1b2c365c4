use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use rink_timeline::config;
use rink_timeline::game_store;
use rink_timeline::timeline::{FEATURE_COLUMNS, build_timeline};

// Builds one game's timeline from its raw table directory and prints it as
// tab-separated rows. Nothing is written to the feature store.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(env_filter).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let dir = config::positional_args(&args)
        .first()
        .map(|dir| PathBuf::from(*dir))
        .ok_or_else(|| {
            anyhow!("usage: timeline_game <game-dir> [--skip-budget N] [--skew-epsilon E]")
        })?;
    let game_id = dir
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.parse::<u64>().ok())
        .context("game directory name must be the numeric game id")?;

    let options = config::resolve_build(&args)?;
    let tables = game_store::load_game(&dir, game_id)?;
    let timeline = build_timeline(&tables, &options)
        .with_context(|| format!("build timeline for game {game_id}"))?;

    println!("{}", FEATURE_COLUMNS.join("\t"));
    for record in &timeline.records {
        let row = record
            .values()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>();
        println!("{}", row.join("\t"));
    }
    eprintln!(
        "game {}: {} records, {} live events skipped",
        timeline.game_id,
        timeline.records.len(),
        timeline.skipped
    );
    Ok(())
}
