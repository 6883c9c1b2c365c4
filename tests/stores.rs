use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;

use rink_timeline::feature_store;
use rink_timeline::game_store;
use rink_timeline::season::{SeasonId, accumulate_season};
use rink_timeline::synthetic::SyntheticGame;
use rink_timeline::tables::{LiveEventKind, OnIce};
use rink_timeline::timeline::{BuildOptions, build_timeline};

fn fixture_game_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("20202021");
    path.push("2020020001");
    path
}

fn season() -> SeasonId {
    "20202021".parse().expect("valid season")
}

fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory sqlite");
    feature_store::init_schema(&conn).expect("schema");
    conn
}

#[test]
fn fixture_tables_parse() {
    let tables = game_store::load_game(&fixture_game_dir(), 2020_020_001).expect("fixture loads");
    assert_eq!(tables.live.len(), 7);
    assert_eq!(tables.detailed.len(), 9);
    assert_eq!(tables.home_shifts.len(), 6);
    assert_eq!(tables.away_shifts.len(), 4);

    assert_eq!(tables.live[6].event, LiveEventKind::GameEnd);
    assert!(tables.live[6].home_win);
    assert_eq!(tables.live[1].shot_x, Some(-61.0));
    assert_eq!(tables.live[0].shot_x, None);
    assert_eq!(tables.detailed[0].home_on_ice, OnIce::Unknown);
    assert!(!tables.detailed[0].home_pulled_goalie);
    assert!(tables.detailed[5].away_pulled_goalie);
    assert!(tables.home_shifts[2].is_corrupted());
}

#[test]
fn fixture_game_builds_expected_timeline() {
    let tables = game_store::load_game(&fixture_game_dir(), 2020_020_001).expect("fixture loads");
    let timeline = build_timeline(&tables, &BuildOptions::default()).expect("fixture builds");
    let r = &timeline.records;

    assert_eq!(timeline.skipped, 1);
    assert_eq!(
        r.iter().map(|x| x.play_id).collect::<Vec<_>>(),
        vec![1, 4, 9, 12, 15, 16]
    );
    assert_eq!(
        r.iter().map(|x| x.goal_differential).collect::<Vec<_>>(),
        vec![0, 0, -1, 0, 1, 1]
    );
    assert_eq!(
        r.iter().map(|x| x.last_goal).collect::<Vec<_>>(),
        vec![0, 0, -1, 1, 1, 1]
    );
    assert_eq!(
        r.iter().map(|x| x.goalie_pulled).collect::<Vec<_>>(),
        vec![0, 0, 0, -1, 0, 0]
    );
    assert_eq!(
        r.iter().map(|x| x.goalie_change).collect::<Vec<_>>(),
        vec![0, 0, 0, 0, -1, -1]
    );
    assert_eq!(
        r.iter().map(|x| x.players_on_ice_total).collect::<Vec<_>>(),
        vec![12, 12, 12, 12, 8, 8]
    );
    assert!(r.iter().all(|x| x.hit_total == 0));
    assert_eq!(r[1].shot_differential, -1);
    assert_eq!(r[0].faceoff_total, 1);
    assert_eq!(r[4].time_remaining, 0);
    assert_eq!(r[4].time_remaining_neg, -45);
    assert!(r.iter().all(|x| x.toi_skew_differential.is_finite()));
    assert_eq!(timeline.labels(), vec![1; 6]);
}

#[test]
fn written_games_load_back_unchanged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tables = SyntheticGame::default().build();
    let game_dir = game_store::game_dir(dir.path(), &season(), tables.game_id);

    game_store::write_game(&game_dir, &tables).expect("write game");
    assert!(game_store::has_all_tables(&game_dir));
    let loaded = game_store::load_game(&game_dir, tables.game_id).expect("load game");
    assert_eq!(loaded, tables);
}

#[test]
fn missing_table_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tables = SyntheticGame::default().build();
    game_store::write_game(dir.path(), &tables).expect("write game");
    fs::remove_file(dir.path().join(game_store::AWAY_SHIFTS_FILE)).expect("remove table");

    assert!(!game_store::has_all_tables(dir.path()));
    let err = game_store::load_game(dir.path(), tables.game_id).expect_err("missing table");
    let message = format!("{err:#}");
    assert!(message.contains("data required is missing"), "{message}");
    assert!(message.contains(game_store::AWAY_SHIFTS_FILE), "{message}");
}

#[test]
fn season_listing_is_sorted_and_numeric_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in ["2020020010", "notes", "2020020002"] {
        fs::create_dir_all(dir.path().join(name)).expect("mkdir");
    }
    fs::write(dir.path().join("2020020003"), "not a dir").expect("write file");

    let games = game_store::list_games(dir.path()).expect("list games");
    let ids = games.iter().map(|(id, _)| *id).collect::<Vec<_>>();
    assert_eq!(ids, vec![2020_020_002, 2020_020_010]);
}

#[test]
fn replacing_a_game_does_not_duplicate_rows() {
    let mut conn = memory_db();
    let tables = SyntheticGame::default().build();
    let timeline = build_timeline(&tables, &BuildOptions::default()).expect("build");

    assert!(!feature_store::has_game(&conn, tables.game_id).expect("query"));
    let written = feature_store::replace_game(&mut conn, &season(), &timeline).expect("store");
    assert_eq!(written, timeline.records.len());
    feature_store::replace_game(&mut conn, &season(), &timeline).expect("store again");
    assert!(feature_store::has_game(&conn, tables.game_id).expect("query"));

    let stored = feature_store::load_game_records(&conn, tables.game_id).expect("load");
    assert_eq!(stored, timeline.records);
}

#[test]
fn season_matrix_holds_features_and_labels() {
    let mut conn = memory_db();
    let mut expected_rows = 0;
    for (game_id, seed) in [(2020_020_002, 3), (2020_020_001, 4)] {
        let tables = SyntheticGame {
            game_id,
            seed,
            ..SyntheticGame::default()
        }
        .build();
        let timeline = build_timeline(&tables, &BuildOptions::default()).expect("build");
        expected_rows += timeline.records.len();
        feature_store::replace_game(&mut conn, &season(), &timeline).expect("store");
    }

    let matrix = feature_store::load_season_matrix(&conn, &season()).expect("matrix");
    assert_eq!(matrix.rows.len(), expected_rows);
    assert_eq!(matrix.labels.len(), expected_rows);
    assert_eq!(matrix.columns.first(), Some(&"time_remaining"));
    assert_eq!(matrix.columns.last(), Some(&"last_goal"));
    assert!(matrix.rows.iter().all(|row| row.len() == matrix.columns.len()));
    assert_eq!(matrix.game_ids.first(), Some(&2020_020_001));
    assert!(matrix.labels.iter().all(|label| *label == 1 || *label == -1));

    let other: SeasonId = "20212022".parse().expect("valid season");
    let empty = feature_store::load_season_matrix(&conn, &other).expect("matrix");
    assert!(empty.rows.is_empty());
}

#[test]
fn season_accumulation_isolates_failures() {
    let data = tempfile::tempdir().expect("tempdir");
    let season = season();
    let good = [(2020_020_001, 11), (2020_020_002, 12)];
    let mut expected_records = 0;
    for (game_id, seed) in good {
        let tables = SyntheticGame {
            game_id,
            seed,
            ..SyntheticGame::default()
        }
        .build();
        expected_records += build_timeline(&tables, &BuildOptions::default())
            .expect("good game builds")
            .records
            .len();
        game_store::write_game(&game_store::game_dir(data.path(), &season, game_id), &tables)
            .expect("write game");
    }
    let broken = SyntheticGame {
        game_id: 2020_020_003,
        unmatched: 12,
        ..SyntheticGame::default()
    }
    .build();
    game_store::write_game(
        &game_store::game_dir(data.path(), &season, broken.game_id),
        &broken,
    )
    .expect("write game");
    fs::create_dir_all(game_store::game_dir(data.path(), &season, 2020_020_004)).expect("mkdir");

    let mut conn = memory_db();
    let options = BuildOptions::default();
    let summary =
        accumulate_season(&mut conn, data.path(), &season, &options, 2, false).expect("season");
    assert_eq!(summary.games_total, 4);
    assert_eq!(summary.accumulated, 2);
    assert_eq!(summary.already_present, 0);
    assert_eq!(summary.records_written, expected_records);
    let failures = summary
        .failures
        .iter()
        .map(|f| (f.game_id, f.label))
        .collect::<Vec<_>>();
    assert_eq!(
        failures,
        vec![(2020_020_003, "skip_budget"), (2020_020_004, "load")]
    );
    assert!(!feature_store::has_game(&conn, 2020_020_003).expect("query"));

    let again =
        accumulate_season(&mut conn, data.path(), &season, &options, 2, false).expect("season");
    assert_eq!(again.already_present, 2);
    assert_eq!(again.accumulated, 0);
    assert_eq!(again.records_written, 0);
    assert_eq!(again.failures.len(), 2);

    let forced =
        accumulate_season(&mut conn, data.path(), &season, &options, 1, true).expect("season");
    assert_eq!(forced.accumulated, 2);
    assert_eq!(forced.already_present, 0);
    assert_eq!(forced.records_written, expected_records);

    let matrix = feature_store::load_season_matrix(&conn, &season).expect("matrix");
    assert_eq!(matrix.rows.len(), expected_records);

    let (runs, failed): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), SUM(games_failed) FROM accumulate_runs WHERE finished_at IS NOT NULL",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("run bookkeeping");
    assert_eq!(runs, 3);
    assert_eq!(failed, 6);
}

#[test]
fn store_failure_is_recorded_and_run_still_finishes() {
    let data = tempfile::tempdir().expect("tempdir");
    let season = season();
    let tables = SyntheticGame::default().build();
    game_store::write_game(
        &game_store::game_dir(data.path(), &season, tables.game_id),
        &tables,
    )
    .expect("write game");

    let mut conn = memory_db();
    conn.execute_batch("DROP TABLE feature_records")
        .expect("drop table");
    let summary = accumulate_season(
        &mut conn,
        data.path(),
        &season,
        &BuildOptions::default(),
        1,
        true,
    )
    .expect("season run survives a store failure");
    assert_eq!(summary.accumulated, 0);
    assert_eq!(summary.records_written, 0);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].label, "store");

    let (finished, failed, errors): (Option<String>, i64, String) = conn
        .query_row(
            "SELECT finished_at, games_failed, errors_json FROM accumulate_runs",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .expect("run row");
    assert!(finished.is_some());
    assert_eq!(failed, 1);
    assert!(errors.contains("[store]"), "{errors}");
}

#[test]
fn db_directory_errors_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "file, not a dir").expect("write blocker");

    let err = feature_store::open_db(&blocker.join("features.sqlite")).expect_err("parent is a file");
    assert!(format!("{err:#}").contains("create db dir"), "{err:#}");

    let db = dir.path().join("nested").join("features.sqlite");
    feature_store::open_db(&db).expect("nested dirs are created");
    assert!(db.is_file());
}
