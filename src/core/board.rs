//! Board module - the grid of locked cells
//!
//! The playfield is 10 columns by 18 rows, row 0 at the top. Cells are stored
//! in a flat array for cache locality and zero allocation. Falling pieces are
//! not part of the board; only locked cells live here.

use arrayvec::ArrayVec;

use crate::core::pieces;
use crate::types::{Cell, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

const BOARD_SIZE: usize = (BOARD_WIDTH * BOARD_HEIGHT) as usize;

/// The playfield grid, row-major order (y * WIDTH + x)
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * (BOARD_WIDTH as usize) + (x as usize))
    }

    /// Cell at (x, y), or None when out of bounds.
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set a cell. Returns false when out of bounds.
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Within bounds and holding a locked cell.
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        matches!(self.get(x, y), Some(Some(_)))
    }

    /// Whether every interior column of row `y` is locked.
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= BOARD_HEIGHT as usize {
            return false;
        }
        let start = y * BOARD_WIDTH as usize;
        let end = start + BOARD_WIDTH as usize;
        self.cells[start..end].iter().all(|cell| cell.is_some())
    }

    /// Row indices of all completed rows, top to bottom.
    ///
    /// Scan only; the rows stay in place so the blink phase can show them.
    /// At most 4 rows can complete at once (piece images are 4 rows tall).
    pub fn scan_complete_rows(&self) -> ArrayVec<usize, 4> {
        let mut rows = ArrayVec::new();
        for y in 0..BOARD_HEIGHT as usize {
            if self.is_row_full(y) && rows.try_push(y).is_err() {
                break;
            }
        }
        rows
    }

    /// Remove row `y`: every row above shifts down by one, the top row is
    /// cleared, rows below stay put.
    pub fn collapse_row(&mut self, y: usize) {
        if y >= BOARD_HEIGHT as usize {
            return;
        }
        let width = BOARD_WIDTH as usize;
        for row in (1..=y).rev() {
            let src = (row - 1) * width;
            let dst = row * width;
            self.cells.copy_within(src..src + width, dst);
        }
        for cell in &mut self.cells[..width] {
            *cell = None;
        }
    }

    /// Write every lit cell of the image into the board, unconditionally.
    /// Legality must have been validated by the caller.
    pub fn lock_image(&mut self, kind: PieceKind, orientation: usize, x: i8, y: i8) {
        for row in 0..4u8 {
            for col in 0..4u8 {
                if pieces::is_lit(kind, orientation, col, row) {
                    self.set(x + col as i8, y + row as i8, Some(kind));
                }
            }
        }
    }

    /// Inject `n` penalty rows at the bottom: the top `n` rows are discarded,
    /// surviving rows shift up, and the freed bottom rows are filled except
    /// for `void_col`.
    pub fn inject_penalty_rows(&mut self, n: usize, void_col: usize) {
        let height = BOARD_HEIGHT as usize;
        let width = BOARD_WIDTH as usize;
        let n = n.min(height);

        for y in 0..height - n {
            let src = (y + n) * width;
            let dst = y * width;
            self.cells.copy_within(src..src + width, dst);
        }
        for y in height - n..height {
            for x in 0..width {
                self.cells[y * width + x] = if x == void_col {
                    None
                } else {
                    Some(PieceKind::I)
                };
            }
        }
    }

    /// Lock random cells in the bottom `2 * high` rows with probability 7/20
    /// per cell. Handicap setup, only called at session start.
    pub fn fill_crumbles(&mut self, high: u32, rng: &mut crate::core::GameRng) {
        let height = BOARD_HEIGHT as usize;
        let rows = (2 * high as usize).min(height);
        for y in height - rows..height {
            for x in 0..BOARD_WIDTH as i8 {
                // 20 outcomes: 7 colors, 13 blanks.
                let draw = rng.next_mod(20);
                let cell = if draw < 7 {
                    Some(PieceKind::from_index(draw))
                } else {
                    None
                };
                self.set(x, y as i8, cell);
            }
        }
    }

    /// Row index of the topmost occupied row, 0 when the board is empty.
    ///
    /// This is the "height" telemetry sent to the peer in versus mode; the
    /// empty-board value matches the gauge convention of the wire protocol.
    pub fn stack_height(&self) -> u8 {
        for y in 0..BOARD_HEIGHT {
            let start = y as usize * BOARD_WIDTH as usize;
            let end = start + BOARD_WIDTH as usize;
            if self.cells[start..end].iter().any(|cell| cell.is_some()) {
                return y;
            }
        }
        0
    }

    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
