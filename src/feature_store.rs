use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, Row, params};

use crate::config::app_cache_dir;
use crate::season::{SeasonId, SeasonSummary};
use crate::timeline::{FEATURE_COLUMNS, FeatureRecord, GameTimeline};

#[derive(Debug, Clone, Default)]
pub struct SeasonMatrix {
    pub columns: Vec<&'static str>,
    pub game_ids: Vec<u64>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<i8>,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("features.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create db dir {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS feature_records (
            game_id INTEGER NOT NULL,
            seq INTEGER NOT NULL,
            season TEXT NOT NULL,
            play_id INTEGER NOT NULL,
            time_remaining INTEGER NOT NULL,
            time_remaining_neg INTEGER NOT NULL,
            goal_differential INTEGER NOT NULL,
            goal_total INTEGER NOT NULL,
            shot_differential INTEGER NOT NULL,
            shot_total INTEGER NOT NULL,
            faceoff_differential INTEGER NOT NULL,
            faceoff_total INTEGER NOT NULL,
            takeaway_differential INTEGER NOT NULL,
            takeaway_total INTEGER NOT NULL,
            hit_differential INTEGER NOT NULL,
            hit_total INTEGER NOT NULL,
            block_differential INTEGER NOT NULL,
            block_total INTEGER NOT NULL,
            giveaway_differential INTEGER NOT NULL,
            giveaway_total INTEGER NOT NULL,
            goalie_pulled INTEGER NOT NULL,
            goalie_change INTEGER NOT NULL,
            players_on_ice_differential INTEGER NOT NULL,
            players_on_ice_total INTEGER NOT NULL,
            toi_skew_differential REAL NOT NULL,
            last_goal INTEGER NOT NULL,
            winner INTEGER NOT NULL,
            PRIMARY KEY (game_id, seq)
        );
        CREATE INDEX IF NOT EXISTS idx_feature_records_season ON feature_records(season);

        CREATE TABLE IF NOT EXISTS accumulate_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            season TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            games_total INTEGER NOT NULL DEFAULT 0,
            games_accumulated INTEGER NOT NULL DEFAULT 0,
            games_present INTEGER NOT NULL DEFAULT 0,
            games_failed INTEGER NOT NULL DEFAULT 0,
            records_written INTEGER NOT NULL DEFAULT 0,
            errors_json TEXT NOT NULL DEFAULT '[]'
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn has_game(conn: &Connection, game_id: u64) -> Result<bool> {
    let count = conn
        .query_row(
            "SELECT COUNT(*) FROM feature_records WHERE game_id = ?1",
            params![game_id as i64],
            |row| row.get::<_, i64>(0),
        )
        .context("query stored game")?;
    Ok(count > 0)
}

/// Replaces every stored row of the game in one transaction, so a game is
/// either fully present or absent.
pub fn replace_game(
    conn: &mut Connection,
    season: &SeasonId,
    timeline: &GameTimeline,
) -> Result<usize> {
    let tx = conn.transaction().context("begin feature transaction")?;
    tx.execute(
        "DELETE FROM feature_records WHERE game_id = ?1",
        params![timeline.game_id as i64],
    )
    .context("clear stored game")?;
    for (seq, r) in timeline.records.iter().enumerate() {
        tx.execute(
            r#"
            INSERT INTO feature_records (
                game_id, seq, season, play_id, time_remaining, time_remaining_neg,
                goal_differential, goal_total, shot_differential, shot_total,
                faceoff_differential, faceoff_total, takeaway_differential, takeaway_total,
                hit_differential, hit_total, block_differential, block_total,
                giveaway_differential, giveaway_total, goalie_pulled, goalie_change,
                players_on_ice_differential, players_on_ice_total, toi_skew_differential,
                last_goal, winner
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18,
                ?19, ?20, ?21, ?22,
                ?23, ?24, ?25,
                ?26, ?27
            )
            "#,
            params![
                r.game_id as i64,
                seq as i64,
                season.as_str(),
                r.play_id,
                r.time_remaining,
                r.time_remaining_neg,
                r.goal_differential,
                r.goal_total,
                r.shot_differential,
                r.shot_total,
                r.faceoff_differential,
                r.faceoff_total,
                r.takeaway_differential,
                r.takeaway_total,
                r.hit_differential,
                r.hit_total,
                r.block_differential,
                r.block_total,
                r.giveaway_differential,
                r.giveaway_total,
                r.goalie_pulled,
                r.goalie_change,
                r.players_on_ice_differential,
                r.players_on_ice_total,
                r.toi_skew_differential,
                r.last_goal,
                r.winner,
            ],
        )
        .context("insert feature record")?;
    }
    tx.commit().context("commit feature transaction")?;
    Ok(timeline.records.len())
}

const SELECT_RECORD: &str = r#"
    SELECT
        game_id, play_id, time_remaining, time_remaining_neg,
        goal_differential, goal_total, shot_differential, shot_total,
        faceoff_differential, faceoff_total, takeaway_differential, takeaway_total,
        hit_differential, hit_total, block_differential, block_total,
        giveaway_differential, giveaway_total, goalie_pulled, goalie_change,
        players_on_ice_differential, players_on_ice_total, toi_skew_differential,
        last_goal, winner
    FROM feature_records
"#;

fn decode_record(row: &Row<'_>) -> rusqlite::Result<FeatureRecord> {
    Ok(FeatureRecord {
        game_id: row.get::<_, i64>(0)? as u64,
        play_id: row.get(1)?,
        time_remaining: row.get(2)?,
        time_remaining_neg: row.get(3)?,
        goal_differential: row.get(4)?,
        goal_total: row.get(5)?,
        shot_differential: row.get(6)?,
        shot_total: row.get(7)?,
        faceoff_differential: row.get(8)?,
        faceoff_total: row.get(9)?,
        takeaway_differential: row.get(10)?,
        takeaway_total: row.get(11)?,
        hit_differential: row.get(12)?,
        hit_total: row.get(13)?,
        block_differential: row.get(14)?,
        block_total: row.get(15)?,
        giveaway_differential: row.get(16)?,
        giveaway_total: row.get(17)?,
        goalie_pulled: row.get(18)?,
        goalie_change: row.get(19)?,
        players_on_ice_differential: row.get(20)?,
        players_on_ice_total: row.get(21)?,
        toi_skew_differential: row.get(22)?,
        last_goal: row.get(23)?,
        winner: row.get(24)?,
    })
}

pub fn load_game_records(conn: &Connection, game_id: u64) -> Result<Vec<FeatureRecord>> {
    let sql = format!("{SELECT_RECORD} WHERE game_id = ?1 ORDER BY seq ASC");
    let mut stmt = conn.prepare(&sql).context("prepare load game query")?;
    let rows = stmt
        .query_map(params![game_id as i64], decode_record)
        .context("query load game")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode feature row")?);
    }
    Ok(out)
}

pub fn load_season_matrix(conn: &Connection, season: &SeasonId) -> Result<SeasonMatrix> {
    let sql = format!("{SELECT_RECORD} WHERE season = ?1 ORDER BY game_id ASC, seq ASC");
    let mut stmt = conn.prepare(&sql).context("prepare load season query")?;
    let rows = stmt
        .query_map(params![season.as_str()], decode_record)
        .context("query load season")?;

    let mut out = SeasonMatrix {
        columns: FEATURE_COLUMNS[2..FEATURE_COLUMNS.len() - 1].to_vec(),
        ..SeasonMatrix::default()
    };
    for row in rows {
        let record = row.context("decode feature row")?;
        let values = record.values();
        out.game_ids.push(record.game_id);
        out.rows.push(values[2..values.len() - 1].to_vec());
        out.labels.push(record.winner);
    }
    Ok(out)
}

pub fn begin_run(conn: &Connection, season: &SeasonId) -> Result<i64> {
    conn.execute(
        "INSERT INTO accumulate_runs(season, started_at) VALUES (?1, ?2)",
        params![season.as_str(), Utc::now().to_rfc3339()],
    )
    .context("insert accumulate run")?;
    Ok(conn.last_insert_rowid())
}

pub fn finish_run(conn: &Connection, run_id: i64, summary: &SeasonSummary) -> Result<()> {
    let errors = summary
        .failures
        .iter()
        .map(|f| format!("game {} [{}]: {}", f.game_id, f.label, f.message))
        .collect::<Vec<_>>();
    let errors_json = serde_json::to_string(&errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "UPDATE accumulate_runs
         SET finished_at = ?1, games_total = ?2, games_accumulated = ?3, games_present = ?4,
             games_failed = ?5, records_written = ?6, errors_json = ?7
         WHERE run_id = ?8",
        params![
            Utc::now().to_rfc3339(),
            summary.games_total as i64,
            summary.accumulated as i64,
            summary.already_present as i64,
            summary.failures.len() as i64,
            summary.records_written as i64,
            errors_json,
            run_id
        ],
    )
    .context("update accumulate run")?;
    Ok(())
}
