use std::collections::HashSet;

use crate::error::TimelineError;
use crate::tables::{DetailedLogRow, Side, UNKNOWN_GOALIE};

#[derive(Debug, Clone)]
pub struct GoalieTracker {
    changed: [Vec<bool>; 2],
}

impl GoalieTracker {
    pub fn new(rows: &[DetailedLogRow]) -> Self {
        Self {
            changed: [
                changed_prefix(rows, Side::Home),
                changed_prefix(rows, Side::Away),
            ],
        }
    }

    pub fn pulled(side: Side, row: &DetailedLogRow) -> bool {
        row.pulled_goalie(side)
    }

    /// Whether more than one real goalie has appeared for `side` in rows
    /// `0..=row_index`. A single unknown gap is not a change.
    pub fn changed(&self, side: Side, row_index: usize) -> Result<bool, TimelineError> {
        let column = &self.changed[side.index()];
        column
            .get(row_index)
            .copied()
            .ok_or(TimelineError::RowOutOfRange {
                index: row_index,
                len: column.len(),
            })
    }
}

fn changed_prefix(rows: &[DetailedLogRow], side: Side) -> Vec<bool> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|row| {
            seen.insert(row.goalie_number(side));
            let allowance = 1 + usize::from(seen.contains(&UNKNOWN_GOALIE));
            seen.len() > allowance
        })
        .collect()
}
