//! Line clear engine - timed blink-then-collapse of completed rows
//!
//! Completed rows are detected by a scan, blink in place for a fixed number
//! of ticks, then collapse in the exact order they were detected (top to
//! bottom). While rows are pending the board is frozen for gameplay; only
//! pause input stays live, which the session enforces.

use arrayvec::ArrayVec;

use crate::core::Board;
use crate::types::{BLINK_TICKS, LINE_SCORES, PERIOD_TABLE};

/// Score for clearing `count` rows at once at the given level.
pub fn score_for(count: usize, level: u32) -> u32 {
    LINE_SCORES[count.min(4)] * (level + 1)
}

/// Gravity period in ticks for a level; levels past the table reuse the last
/// entry.
pub fn gravity_period(level: u32) -> u32 {
    let idx = (level as usize).min(PERIOD_TABLE.len() - 1);
    PERIOD_TABLE[idx]
}

#[derive(Debug, Clone)]
pub struct LineClearEngine {
    /// Completed rows in detection order, top to bottom
    pending: ArrayVec<usize, 4>,
    /// Blink countdown; 0 means idle
    ticks: u32,
}

impl LineClearEngine {
    pub fn new() -> Self {
        Self {
            pending: ArrayVec::new(),
            ticks: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.ticks > 0
    }

    /// Rows currently marked for removal.
    pub fn pending_rows(&self) -> &[usize] {
        &self.pending
    }

    /// Whether the marked rows should currently be drawn blanked out.
    ///
    /// The visual state flips every 20 ticks; ticks that are multiples of 40
    /// are the hidden phase.
    pub fn blink_hidden(&self) -> bool {
        (self.ticks / 20) % 2 == 0
    }

    /// Scan the board for completed rows; arms the blink countdown when any
    /// are found. Returns how many rows were marked.
    pub fn scan(&mut self, board: &Board) -> usize {
        debug_assert!(!self.is_active());
        self.pending = board.scan_complete_rows();
        if !self.pending.is_empty() {
            self.ticks = BLINK_TICKS;
        }
        self.pending.len()
    }

    /// Advance the countdown by one tick. On the final tick the marked rows
    /// collapse, in detection order, and the cleared count is returned.
    ///
    /// Each collapse operates on coordinates already shifted by the previous
    /// ones; detection order (top to bottom) keeps lower indices valid.
    pub fn step(&mut self, board: &mut Board) -> Option<usize> {
        if self.ticks == 0 {
            return None;
        }
        self.ticks -= 1;
        if self.ticks > 1 {
            return None;
        }

        let count = self.pending.len();
        for &row in &self.pending {
            board.collapse_row(row);
        }
        self.pending.clear();
        self.ticks = 0;
        Some(count)
    }
}

impl Default for LineClearEngine {
    fn default() -> Self {
        Self::new()
    }
}
