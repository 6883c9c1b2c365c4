use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::accumulator::{LastGoal, Running, Stat, StatAccumulator};
use crate::aligner::{Alignment, DEFAULT_SKIP_BUDGET, EventAligner};
use crate::error::TimelineError;
use crate::goalie::GoalieTracker;
use crate::shift_ledger::{SKEW_EPSILON, ShiftLedger, pearson_skew};
use crate::tables::{GameTables, Side};

pub const FEATURE_COLUMNS: [&str; 25] = [
    "gameId",
    "playId",
    "time_remaining",
    "time_remaining_neg",
    "goal_differential",
    "goal_total",
    "shot_differential",
    "shot_total",
    "faceoff_differential",
    "faceoff_total",
    "takeaway_differential",
    "takeaway_total",
    "hit_differential",
    "hit_total",
    "block_differential",
    "block_total",
    "giveaway_differential",
    "giveaway_total",
    "goalie_pulled",
    "goalie_change",
    "players_on_ice_differential",
    "players_on_ice_total",
    "toi_skew_differential",
    "last_goal",
    "winner",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub game_id: u64,
    pub play_id: u32,
    pub time_remaining: i32,
    pub time_remaining_neg: i32,
    pub goal_differential: i64,
    pub goal_total: i64,
    pub shot_differential: i64,
    pub shot_total: i64,
    pub faceoff_differential: i64,
    pub faceoff_total: i64,
    pub takeaway_differential: i64,
    pub takeaway_total: i64,
    pub hit_differential: i64,
    pub hit_total: i64,
    pub block_differential: i64,
    pub block_total: i64,
    pub giveaway_differential: i64,
    pub giveaway_total: i64,
    pub goalie_pulled: i8,
    pub goalie_change: i8,
    pub players_on_ice_differential: i32,
    pub players_on_ice_total: i32,
    pub toi_skew_differential: f64,
    pub last_goal: i8,
    /// 1 home win, -1 away win; 0 only until the game completes.
    pub winner: i8,
}

impl FeatureRecord {
    pub fn stat(&self, stat: Stat) -> Running {
        let (diff, total) = match stat {
            Stat::Goal => (self.goal_differential, self.goal_total),
            Stat::Shot => (self.shot_differential, self.shot_total),
            Stat::Faceoff => (self.faceoff_differential, self.faceoff_total),
            Stat::Takeaway => (self.takeaway_differential, self.takeaway_total),
            Stat::Hit => (self.hit_differential, self.hit_total),
            Stat::Block => (self.block_differential, self.block_total),
            Stat::Giveaway => (self.giveaway_differential, self.giveaway_total),
        };
        Running { diff, total }
    }

    pub fn values(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(FEATURE_COLUMNS.len());
        out.push(self.game_id as f64);
        out.push(f64::from(self.play_id));
        out.push(f64::from(self.time_remaining));
        out.push(f64::from(self.time_remaining_neg));
        for stat in Stat::ALL {
            let running = self.stat(stat);
            out.push(running.diff as f64);
            out.push(running.total as f64);
        }
        out.push(f64::from(self.goalie_pulled));
        out.push(f64::from(self.goalie_change));
        out.push(f64::from(self.players_on_ice_differential));
        out.push(f64::from(self.players_on_ice_total));
        out.push(self.toi_skew_differential);
        out.push(f64::from(self.last_goal));
        out.push(f64::from(self.winner));
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameTimeline {
    pub game_id: u64,
    pub records: Vec<FeatureRecord>,
    /// Live events dropped because no detailed row matched.
    pub skipped: usize,
}

impl GameTimeline {
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.records
            .iter()
            .map(|r| {
                let values = r.values();
                values[2..values.len() - 1].to_vec()
            })
            .collect()
    }

    pub fn labels(&self) -> Vec<i8> {
        self.records.iter().map(|r| r.winner).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    pub skip_budget: usize,
    pub skew_epsilon: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            skip_budget: DEFAULT_SKIP_BUDGET,
            skew_epsilon: SKEW_EPSILON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Init,
    Streaming,
    Complete,
    Aborted,
}

/// Drives one game from raw tables to a finished timeline. Each instance owns
/// its ledgers and accumulator; nothing is shared between games.
#[derive(Debug)]
pub struct TimelineBuilder<'a> {
    tables: &'a GameTables,
    options: BuildOptions,
    state: BuildState,
}

pub fn build_timeline(
    tables: &GameTables,
    options: &BuildOptions,
) -> Result<GameTimeline, TimelineError> {
    TimelineBuilder::new(tables, *options).run()
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(tables: &'a GameTables, options: BuildOptions) -> Self {
        Self {
            tables,
            options,
            state: BuildState::Init,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Runs to `Complete` or `Aborted`. An aborted run yields no records.
    pub fn run(&mut self) -> Result<GameTimeline, TimelineError> {
        let started = Instant::now();
        let result = self.stream();
        match &result {
            Ok(timeline) => {
                self.state = BuildState::Complete;
                info!(
                    game_id = timeline.game_id,
                    records = timeline.records.len(),
                    skipped = timeline.skipped,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "finished game timeline"
                );
            }
            Err(_) => self.state = BuildState::Aborted,
        }
        result
    }

    fn validate(&self) -> Result<(), TimelineError> {
        let tables = self.tables;
        let sizes = [
            ("live", tables.live.len()),
            ("detailed", tables.detailed.len()),
            ("home_shifts", tables.home_shifts.len()),
            ("away_shifts", tables.away_shifts.len()),
        ];
        for (table, len) in sizes {
            if len == 0 {
                return Err(TimelineError::EmptyTable {
                    game_id: tables.game_id,
                    table,
                });
            }
        }
        // Every event kind must translate before anything is emitted.
        for event in &tables.live {
            if event.event.detailed_code().is_none() {
                return Err(TimelineError::UnmappedEvent {
                    play_id: event.play_id,
                    event: event.event.to_string(),
                });
            }
        }
        Ok(())
    }

    fn stream(&mut self) -> Result<GameTimeline, TimelineError> {
        self.validate()?;
        let tables = self.tables;

        let mut home_ledger = ShiftLedger::new(Side::Home, &tables.home_shifts)?;
        let mut away_ledger = ShiftLedger::new(Side::Away, &tables.away_shifts)?;
        let mut aligner = EventAligner::new(&tables.detailed, self.options.skip_budget);
        let goalies = GoalieTracker::new(&tables.detailed);
        let mut stats = StatAccumulator::new();
        let mut last_goal = LastGoal::default();
        let mut records: Vec<FeatureRecord> = Vec::with_capacity(tables.live.len());

        self.state = BuildState::Streaming;
        for event in &tables.live {
            let row_index = match aligner.align(event)? {
                Alignment::Matched(idx) => idx,
                Alignment::Skipped { .. } => continue,
            };
            let row = tables
                .detailed
                .get(row_index)
                .ok_or(TimelineError::RowOutOfRange {
                    index: row_index,
                    len: tables.detailed.len(),
                })?;

            let home_on_ice = row.on_ice(Side::Home).count();
            let away_on_ice = row.on_ice(Side::Away).count();
            let goalie_pulled = indicator(
                GoalieTracker::pulled(Side::Home, row),
                GoalieTracker::pulled(Side::Away, row),
            );
            let goalie_change = indicator(
                goalies.changed(Side::Home, row_index)?,
                goalies.changed(Side::Away, row_index)?,
            );

            let eps = self.options.skew_epsilon;
            let home_skew = pearson_skew(&home_ledger.advance(event.time_remaining)?, eps);
            let away_skew = pearson_skew(&away_ledger.advance(event.time_remaining)?, eps);

            for stat in Stat::ALL {
                stats.update(
                    stat,
                    event.stat_delta(stat, Side::Home),
                    event.stat_delta(stat, Side::Away),
                );
            }
            let s = stats.snapshot();
            let last = last_goal.observe(event.home_goal > 0, event.away_goal > 0);

            let record = FeatureRecord {
                game_id: event.game_id,
                play_id: event.play_id,
                time_remaining: event.time_remaining.max(0),
                time_remaining_neg: event.time_remaining,
                goal_differential: s[Stat::Goal.index()].diff,
                goal_total: s[Stat::Goal.index()].total,
                shot_differential: s[Stat::Shot.index()].diff,
                shot_total: s[Stat::Shot.index()].total,
                faceoff_differential: s[Stat::Faceoff.index()].diff,
                faceoff_total: s[Stat::Faceoff.index()].total,
                takeaway_differential: s[Stat::Takeaway.index()].diff,
                takeaway_total: s[Stat::Takeaway.index()].total,
                hit_differential: s[Stat::Hit.index()].diff,
                hit_total: s[Stat::Hit.index()].total,
                block_differential: s[Stat::Block.index()].diff,
                block_total: s[Stat::Block.index()].total,
                giveaway_differential: s[Stat::Giveaway.index()].diff,
                giveaway_total: s[Stat::Giveaway.index()].total,
                goalie_pulled,
                goalie_change,
                players_on_ice_differential: home_on_ice - away_on_ice,
                players_on_ice_total: home_on_ice + away_on_ice,
                toi_skew_differential: home_skew - away_skew,
                last_goal: last,
                winner: 0,
            };
            records.push(record);
        }

        let winner = tables
            .live
            .last()
            .and_then(|event| event.winner())
            .ok_or(TimelineError::NoWinner {
                game_id: tables.game_id,
            })?;
        for record in &mut records {
            record.winner = winner.sign();
        }

        Ok(GameTimeline {
            game_id: tables.game_id,
            records,
            skipped: aligner.skipped(),
        })
    }
}

fn indicator(home: bool, away: bool) -> i8 {
    i8::from(home) - i8::from(away)
}
