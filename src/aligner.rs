use std::collections::HashMap;

use tracing::debug;

use crate::error::TimelineError;
use crate::tables::{DetailedEventCode, DetailedLogRow, LiveEventKind, RawLiveEvent};

/// Unmatched live events tolerated per game; reaching it aborts the game.
pub const DEFAULT_SKIP_BUDGET: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Matched(usize),
    Skipped { skipped: usize },
}

/// Exact (timestamp, code) matcher from live events to detailed-log rows.
/// Ties resolve to the lowest row index.
#[derive(Debug, Clone)]
pub struct EventAligner {
    first_row: HashMap<(i32, DetailedEventCode), usize>,
    skipped: usize,
    budget: usize,
}

impl EventAligner {
    pub fn new(rows: &[DetailedLogRow], budget: usize) -> Self {
        let mut first_row = HashMap::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            first_row
                .entry((row.time_remaining, row.event.clone()))
                .or_insert(idx);
        }
        Self {
            first_row,
            skipped: 0,
            budget: budget.max(1),
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn lookup(
        &self,
        time_remaining: i32,
        kind: &LiveEventKind,
        play_id: u32,
    ) -> Result<Option<usize>, TimelineError> {
        let code = kind
            .detailed_code()
            .ok_or_else(|| TimelineError::UnmappedEvent {
                play_id,
                event: kind.to_string(),
            })?;
        Ok(self.first_row.get(&(time_remaining, code)).copied())
    }

    pub fn align(&mut self, event: &RawLiveEvent) -> Result<Alignment, TimelineError> {
        if let Some(row) = self.lookup(event.time_remaining, &event.event, event.play_id)? {
            return Ok(Alignment::Matched(row));
        }

        self.skipped += 1;
        debug!(
            game_id = event.game_id,
            play_id = event.play_id,
            event = %event.event,
            time_remaining = event.time_remaining,
            skipped = self.skipped,
            "no detailed row for live event"
        );
        if self.skipped >= self.budget {
            return Err(TimelineError::SkipBudgetExceeded {
                skipped: self.skipped,
                budget: self.budget,
            });
        }
        Ok(Alignment::Skipped {
            skipped: self.skipped,
        })
    }
}
