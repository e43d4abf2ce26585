//! Pointer selection over the cells of one day.
//!
//! `Idle -> Selecting -> Idle`. Releasing the pointer (or leaving the grid)
//! resolves the selection into a single-slot click or an hour range; there is
//! no resolved state kept around afterwards.

use chrono::NaiveDate;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub day: NaiveDate,
    pub hour: u32,
}

impl Cell {
    pub fn new(day: NaiveDate, hour: u32) -> Self {
        Self { day, hour }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    SlotClick {
        day: NaiveDate,
        hour: u32,
    },
    /// `end_hour` is exclusive: dragging over the 9 and 10 rows gives 9..11.
    RangeCreate {
        day: NaiveDate,
        start_hour: u32,
        end_hour: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragSelection {
    #[default]
    Idle,
    Selecting {
        anchor: Cell,
        cursor: Cell,
    },
}

impl DragSelection {
    pub fn new() -> Self {
        Self::Idle
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self, Self::Selecting { .. })
    }

    /// Starts a selection. A second pointer-down restarts from the new cell.
    pub fn pointer_down(&mut self, cell: Cell) {
        trace!(day = %cell.day, hour = cell.hour, "selection started");
        *self = Self::Selecting {
            anchor: cell,
            cursor: cell,
        };
    }

    /// Moves the cursor. Cells on another day than the anchor are ignored, so
    /// the selection freezes at the last same-day cell.
    pub fn pointer_enter(&mut self, cell: Cell) {
        if let Self::Selecting { anchor, cursor } = self {
            if cell.day == anchor.day {
                *cursor = cell;
            }
        }
    }

    /// Ends the interaction and resolves it. `None` when nothing was selected.
    pub fn pointer_up(&mut self) -> Option<SelectionOutcome> {
        let Self::Selecting { anchor, cursor } = std::mem::take(self) else {
            return None;
        };

        let outcome = if anchor.hour == cursor.hour {
            SelectionOutcome::SlotClick {
                day: anchor.day,
                hour: anchor.hour,
            }
        } else {
            SelectionOutcome::RangeCreate {
                day: anchor.day,
                start_hour: anchor.hour.min(cursor.hour),
                end_hour: anchor.hour.max(cursor.hour) + 1,
            }
        };

        debug!(?outcome, "selection resolved");
        Some(outcome)
    }

    /// Leaving the grid resolves exactly like releasing the pointer.
    pub fn pointer_leave(&mut self) -> Option<SelectionOutcome> {
        self.pointer_up()
    }

    pub fn cancel(&mut self) {
        if self.is_selecting() {
            debug!("selection cancelled");
        }
        *self = Self::Idle;
    }

    /// Inclusive hour bounds of the highlighted cells and their day.
    pub fn highlighted(&self) -> Option<(NaiveDate, u32, u32)> {
        match self {
            Self::Idle => None,
            Self::Selecting { anchor, cursor } => Some((
                anchor.day,
                anchor.hour.min(cursor.hour),
                anchor.hour.max(cursor.hour),
            )),
        }
    }

    pub fn is_highlighted(&self, cell: Cell) -> bool {
        self.highlighted()
            .is_some_and(|(day, low, high)| cell.day == day && (low..=high).contains(&cell.hour))
    }
}
