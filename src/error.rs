use thiserror::Error;

use crate::tables::Side;

/// Fatal, per-game failures of the timeline engine. A soft alignment miss is
/// not an error; it only becomes one once the skip budget is spent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    #[error("required table `{table}` is empty for game {game_id}")]
    EmptyTable { game_id: u64, table: &'static str },

    #[error("live event `{event}` (play {play_id}) has no detailed-log translation")]
    UnmappedEvent { play_id: u32, event: String },

    #[error("too many unaligned events: {skipped} skipped with a budget of {budget}")]
    SkipBudgetExceeded { skipped: usize, budget: usize },

    #[error("{side} shift ledger queried at {timestamp}s after {previous}s")]
    NonMonotonicTimestamp {
        side: Side,
        previous: i32,
        timestamp: i32,
    },

    #[error("{side} shifts for player {player_id} are out of order ({start}s after {previous_start}s)")]
    UnorderedShifts {
        side: Side,
        player_id: u64,
        previous_start: i32,
        start: i32,
    },

    #[error("{side} shift for player {player_id} is malformed ({start}s to {end}s, length {length})")]
    MalformedShift {
        side: Side,
        player_id: u64,
        start: i32,
        end: i32,
        length: i32,
    },

    #[error("{side} shifts for player {player_id} overlap ({start}s starts before {previous_end}s)")]
    OverlappingShifts {
        side: Side,
        player_id: u64,
        previous_end: i32,
        start: i32,
    },

    #[error("detailed log row {index} out of range ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("game {game_id} has no decided winner")]
    NoWinner { game_id: u64 },
}

impl TimelineError {
    pub fn label(&self) -> &'static str {
        match self {
            TimelineError::EmptyTable { .. } => "empty_table",
            TimelineError::UnmappedEvent { .. } => "unmapped_event",
            TimelineError::SkipBudgetExceeded { .. } => "skip_budget",
            TimelineError::NonMonotonicTimestamp { .. } => "non_monotonic",
            TimelineError::UnorderedShifts { .. } => "unordered_shifts",
            TimelineError::MalformedShift { .. } => "malformed_shift",
            TimelineError::OverlappingShifts { .. } => "overlapping_shifts",
            TimelineError::RowOutOfRange { .. } => "row_out_of_range",
            TimelineError::NoWinner { .. } => "no_winner",
        }
    }
}
