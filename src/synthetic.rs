use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::tables::{
    DetailedEventCode, DetailedLogRow, GameTables, LiveEventKind, REGULATION_SECONDS,
    RawLiveEvent, ShiftInterval, Side,
};

const HOME_GOALIE: i32 = 30;
const HOME_BACKUP_GOALIE: i32 = 35;
const AWAY_GOALIE: i32 = 1;

/// Seeded generator of consistent games for tests and benches.
#[derive(Debug, Clone)]
pub struct SyntheticGame {
    pub game_id: u64,
    pub seed: u64,
    pub events: usize,
    pub players_per_side: usize,
    pub unmatched: usize,
    pub home_goalie_swap_at: Option<usize>,
}

impl Default for SyntheticGame {
    fn default() -> Self {
        Self {
            game_id: 2020_020_001,
            seed: 7,
            events: 150,
            players_per_side: 18,
            unmatched: 0,
            home_goalie_swap_at: None,
        }
    }
}

impl SyntheticGame {
    pub fn build(&self) -> GameTables {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut live = Vec::with_capacity(self.events + 1);
        let mut time = REGULATION_SECONDS;
        let (mut home_goals, mut away_goals) = (0u32, 0u32);

        for idx in 0..self.events {
            if idx > 0 {
                time -= rng.gen_range(1..=25);
            }
            let side = if rng.gen_bool(0.5) { Side::Home } else { Side::Away };
            let kind = pick_kind(&mut rng);
            let mut event = RawLiveEvent::new(self.game_id, idx as u32 + 1, kind.clone(), time);
            credit(&mut event, &kind, side);
            if kind == LiveEventKind::Goal {
                match side {
                    Side::Home => home_goals += 1,
                    Side::Away => away_goals += 1,
                }
            }
            live.push(event);
        }

        time -= rng.gen_range(1..=25);
        let mut end = RawLiveEvent::new(
            self.game_id,
            self.events as u32 + 1,
            LiveEventKind::GameEnd,
            time,
        );
        // Ties go to home, as if decided in a shootout.
        end.home_win = home_goals >= away_goals;
        end.away_win = !end.home_win;
        live.push(end);

        let mut skip = vec![false; live.len()];
        let mut remaining = self.unmatched.min(self.events);
        while remaining > 0 {
            let idx = rng.gen_range(0..self.events);
            if !skip[idx] {
                skip[idx] = true;
                remaining -= 1;
            }
        }

        let mut detailed = Vec::with_capacity(live.len() * 2);
        for (event, skipped) in live.iter().zip(&skip) {
            if rng.gen_bool(0.2) {
                detailed.push(DetailedLogRow::new(
                    event.time_remaining,
                    DetailedEventCode::Stoppage,
                ));
            }
            if *skipped {
                continue;
            }
            let Some(code) = event.event.detailed_code() else {
                continue;
            };
            detailed.push(DetailedLogRow::new(event.time_remaining, code));
        }
        for (idx, row) in detailed.iter_mut().enumerate() {
            row.home_goalie_number = match self.home_goalie_swap_at {
                Some(swap) if idx >= swap => HOME_BACKUP_GOALIE,
                _ => HOME_GOALIE,
            };
            row.away_goalie_number = AWAY_GOALIE;
        }

        let final_time = time;
        GameTables {
            game_id: self.game_id,
            live,
            detailed,
            home_shifts: shift_log(&mut rng, 8_470_000, self.players_per_side, final_time),
            away_shifts: shift_log(&mut rng, 8_480_000, self.players_per_side, final_time),
        }
    }
}

fn pick_kind(rng: &mut StdRng) -> LiveEventKind {
    match rng.gen_range(0..100) {
        0..=19 => LiveEventKind::Faceoff,
        20..=39 => LiveEventKind::Shot,
        40..=49 => LiveEventKind::MissedShot,
        50..=64 => LiveEventKind::Hit,
        65..=74 => LiveEventKind::BlockedShot,
        75..=82 => LiveEventKind::Giveaway,
        83..=89 => LiveEventKind::Takeaway,
        90..=95 => LiveEventKind::Penalty,
        _ => LiveEventKind::Goal,
    }
}

fn credit(event: &mut RawLiveEvent, kind: &LiveEventKind, side: Side) {
    let home = side == Side::Home;
    let slot = match kind {
        LiveEventKind::Faceoff => (&mut event.home_faceoff_won, &mut event.away_faceoff_won),
        LiveEventKind::Shot | LiveEventKind::MissedShot => {
            (&mut event.home_shot, &mut event.away_shot)
        }
        LiveEventKind::Hit => (&mut event.home_hit, &mut event.away_hit),
        LiveEventKind::BlockedShot => (&mut event.home_block, &mut event.away_block),
        LiveEventKind::Giveaway => (&mut event.home_giveaway, &mut event.away_giveaway),
        LiveEventKind::Takeaway => (&mut event.home_takeaway, &mut event.away_takeaway),
        LiveEventKind::Penalty => (&mut event.home_penalty, &mut event.away_penalty),
        LiveEventKind::Goal => (&mut event.home_goal, &mut event.away_goal),
        _ => return,
    };
    if home {
        *slot.0 = 1;
    } else {
        *slot.1 = 1;
    }
}

fn shift_log(
    rng: &mut StdRng,
    first_player_id: u64,
    players: usize,
    final_time: i32,
) -> Vec<ShiftInterval> {
    let mut out = Vec::new();
    for n in 0..players {
        let player_id = first_player_id + n as u64;
        let mut start = REGULATION_SECONDS - rng.gen_range(0..90);
        while start > final_time {
            let end = (start - rng.gen_range(30..=60)).max(final_time);
            out.push(ShiftInterval::new(player_id, start, end));
            start = end - rng.gen_range(60..=120);
        }
    }
    out
}
