use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::season::SeasonId;
use crate::tables::GameTables;

pub const LIVE_FILE: &str = "live_data.json";
pub const DETAILED_FILE: &str = "pbp_data.json";
pub const HOME_SHIFTS_FILE: &str = "home_shifts_data.json";
pub const AWAY_SHIFTS_FILE: &str = "away_shifts_data.json";

const GAME_FILES: [&str; 4] = [LIVE_FILE, DETAILED_FILE, HOME_SHIFTS_FILE, AWAY_SHIFTS_FILE];

pub fn season_dir(data_dir: &Path, season: &SeasonId) -> PathBuf {
    data_dir.join(season.as_str())
}

pub fn game_dir(data_dir: &Path, season: &SeasonId, game_id: u64) -> PathBuf {
    season_dir(data_dir, season).join(game_id.to_string())
}

pub fn has_all_tables(dir: &Path) -> bool {
    GAME_FILES.iter().all(|name| dir.join(name).is_file())
}

pub fn list_games(season_dir: &Path) -> Result<Vec<(u64, PathBuf)>> {
    let entries = fs::read_dir(season_dir)
        .with_context(|| format!("read season dir {}", season_dir.display()))?;
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.context("read season dir entry")?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(game_id) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.parse::<u64>().ok())
        else {
            continue;
        };
        out.push((game_id, path));
    }
    out.sort_by_key(|(game_id, _)| *game_id);
    Ok(out)
}

pub fn load_game(dir: &Path, game_id: u64) -> Result<GameTables> {
    let missing = GAME_FILES
        .iter()
        .filter(|name| !dir.join(name).is_file())
        .copied()
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(anyhow!(
            "data required is missing for game {game_id} in {}: {}",
            dir.display(),
            missing.join(", ")
        ));
    }

    Ok(GameTables {
        game_id,
        live: read_rows(&dir.join(LIVE_FILE))?,
        detailed: read_rows(&dir.join(DETAILED_FILE))?,
        home_shifts: read_rows(&dir.join(HOME_SHIFTS_FILE))?,
        away_shifts: read_rows(&dir.join(AWAY_SHIFTS_FILE))?,
    })
}

pub fn write_game(dir: &Path, tables: &GameTables) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create game dir {}", dir.display()))?;
    write_rows(&dir.join(LIVE_FILE), &tables.live)?;
    write_rows(&dir.join(DETAILED_FILE), &tables.detailed)?;
    write_rows(&dir.join(HOME_SHIFTS_FILE), &tables.home_shifts)?;
    write_rows(&dir.join(AWAY_SHIFTS_FILE), &tables.away_shifts)?;
    Ok(())
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str::<Vec<T>>(raw.trim()).with_context(|| format!("parse {}", path.display()))
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let json = serde_json::to_string(rows).context("serialize table rows")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}
