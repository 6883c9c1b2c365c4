use std::collections::HashMap;

use crate::error::TimelineError;
use crate::tables::{ShiftInterval, Side};

pub const SKEW_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
struct PlayerShifts {
    player_id: u64,
    // Chronological (descending start). Consumed shifts stay in place; `next`
    // is the queue front.
    intervals: Vec<ShiftInterval>,
    next: usize,
    consumed: i64,
}

/// Time-on-ice bookkeeping for one side. Game time only moves forward, so each
/// shift is folded into its player's total exactly once.
#[derive(Debug, Clone)]
pub struct ShiftLedger {
    side: Side,
    players: Vec<PlayerShifts>,
    last_timestamp: Option<i32>,
}

impl ShiftLedger {
    /// Groups intervals by player in first-appearance order. Corrupted
    /// (all-zero) intervals carry no time and are dropped here so they cannot
    /// stall the queue. Any other interval must be consistent with its length
    /// and lie strictly after the player's previous shift.
    pub fn new(side: Side, intervals: &[ShiftInterval]) -> Result<Self, TimelineError> {
        let mut players: Vec<PlayerShifts> = Vec::new();
        let mut slots: HashMap<u64, usize> = HashMap::new();

        for interval in intervals {
            let slot = *slots.entry(interval.player_id).or_insert_with(|| {
                players.push(PlayerShifts {
                    player_id: interval.player_id,
                    intervals: Vec::new(),
                    next: 0,
                    consumed: 0,
                });
                players.len() - 1
            });
            if interval.is_corrupted() {
                continue;
            }
            if interval.start < interval.end || interval.length != interval.start - interval.end {
                return Err(TimelineError::MalformedShift {
                    side,
                    player_id: interval.player_id,
                    start: interval.start,
                    end: interval.end,
                    length: interval.length,
                });
            }
            let player = &mut players[slot];
            if let Some(previous) = player.intervals.last() {
                if interval.start >= previous.start {
                    return Err(TimelineError::UnorderedShifts {
                        side,
                        player_id: interval.player_id,
                        previous_start: previous.start,
                        start: interval.start,
                    });
                }
                if interval.start > previous.end {
                    return Err(TimelineError::OverlappingShifts {
                        side,
                        player_id: interval.player_id,
                        previous_end: previous.end,
                        start: interval.start,
                    });
                }
            }
            player.intervals.push(*interval);
        }

        Ok(Self {
            side,
            players,
            last_timestamp: None,
        })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.players.iter().map(|p| p.player_id)
    }

    pub fn consumed(&self, player_id: u64) -> Option<i64> {
        self.players
            .iter()
            .find(|p| p.player_id == player_id)
            .map(|p| p.consumed)
    }

    /// Moves game time to `timestamp` (seconds remaining) and returns every
    /// player's time on ice at that instant, in first-appearance order.
    pub fn advance(&mut self, timestamp: i32) -> Result<Vec<f64>, TimelineError> {
        if let Some(previous) = self.last_timestamp
            && timestamp > previous
        {
            return Err(TimelineError::NonMonotonicTimestamp {
                side: self.side,
                previous,
                timestamp,
            });
        }
        self.last_timestamp = Some(timestamp);

        let mut out = Vec::with_capacity(self.players.len());
        for player in &mut self.players {
            let mut partial = 0i64;
            while let Some(interval) = player.intervals.get(player.next) {
                if timestamp <= interval.end {
                    player.consumed += i64::from(interval.length);
                    player.next += 1;
                } else if timestamp <= interval.start {
                    partial = i64::from(interval.start - timestamp);
                    break;
                } else {
                    break;
                }
            }
            out.push((player.consumed + partial) as f64);
        }
        Ok(out)
    }
}

/// Pearson's second skewness coefficient, `3 (mean - median) / (sd + eps)`,
/// with the population standard deviation. An empty slice has no skew.
pub fn pearson_skew(values: &[f64], epsilon: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    3.0 * (mean - median(values)) / (variance.sqrt() + epsilon)
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
