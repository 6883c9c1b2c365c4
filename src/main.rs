use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use rink_timeline::config::AccumulateConfig;
use rink_timeline::{feature_store, season};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = AccumulateConfig::resolve(&args)?;
    if config.seasons.is_empty() {
        return Err(anyhow!(
            "no seasons given; pass --season 20202021 or set TIMELINE_SEASONS"
        ));
    }

    let mut conn = feature_store::open_db(&config.db_path)?;
    let mut failed_games = 0usize;

    for season_id in &config.seasons {
        let summary = season::accumulate_season(
            &mut conn,
            &config.data_dir,
            season_id,
            &config.build,
            config.threads,
            config.force,
        )?;

        println!("Season {}", summary.season);
        println!(
            "  games: {} total, {} accumulated, {} already stored, {} failed",
            summary.games_total,
            summary.accumulated,
            summary.already_present,
            summary.failures.len()
        );
        println!("  records written: {}", summary.records_written);
        for failure in summary.failures.iter().take(10) {
            println!(
                "   - game {} [{}]: {}",
                failure.game_id, failure.label, failure.message
            );
        }
        failed_games += summary.failures.len();
    }

    println!("DB: {}", config.db_path.display());
    if failed_games > 0 {
        println!("{failed_games} game(s) failed; see log for details");
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
