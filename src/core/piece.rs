//! Active piece - the speculative move protocol
//!
//! Every requested move first computes a proposed pose from the current one,
//! validates it against the board, then either commits or cancels. The
//! current pose is always legal; the proposed pose is only ever observed
//! through `try_move`. A rejected downward move raises the `hit` flag, which
//! tells the session the piece must lock this tick.

use crate::core::pieces::{self, MAX_ORIENTATIONS};
use crate::core::Board;
use crate::types::{PieceKind, BOARD_HEIGHT, BOARD_WIDTH, SPAWN_X};

/// A piece kind with an orientation and a board position (top-left of the
/// 4x4 bounding box; x and y may be negative near the edges).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pose {
    pub kind: PieceKind,
    pub orientation: usize,
    pub x: i8,
    pub y: i8,
}

impl Pose {
    fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            orientation: 0,
            x: SPAWN_X,
            y: pieces::spawn_y(kind),
        }
    }
}

/// Whether the pose fits the board: every lit cell must be inside the
/// interior columns and above the floor, and must not overlap a locked cell.
/// Cells above the visible top are always permitted (spawn happens there).
pub fn can_place(board: &Board, pose: Pose) -> bool {
    for row in 0..4u8 {
        for col in 0..4u8 {
            if !pieces::is_lit(pose.kind, pose.orientation, col, row) {
                continue;
            }
            let x = pose.x + col as i8;
            let y = pose.y + row as i8;
            if y < 0 {
                continue;
            }
            if x < 0 || x >= BOARD_WIDTH as i8 || y >= BOARD_HEIGHT as i8 {
                return false;
            }
            if board.is_occupied(x, y) {
                return false;
            }
        }
    }
    true
}

/// The falling piece: last committed pose plus the tentative next one.
#[derive(Debug, Clone)]
pub struct ActivePiece {
    current: Pose,
    proposed: Pose,
    hit: bool,
}

impl ActivePiece {
    pub fn new(kind: PieceKind) -> Self {
        let pose = Pose::spawn(kind);
        Self {
            current: pose,
            proposed: pose,
            hit: false,
        }
    }

    /// Reset to the spawn pose for the next piece and clear the hit flag.
    pub fn spawn(&mut self, kind: PieceKind) {
        self.current = Pose::spawn(kind);
        self.proposed = self.current;
        self.hit = false;
    }

    pub fn pose(&self) -> Pose {
        self.current
    }

    pub fn hit(&self) -> bool {
        self.hit
    }

    /// Lit cells of the committed pose, in board coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> + '_ {
        let pose = self.current;
        (0..4u8).flat_map(move |row| {
            (0..4u8).filter_map(move |col| {
                pieces::is_lit(pose.kind, pose.orientation, col, row)
                    .then(|| (pose.x + col as i8, pose.y + row as i8))
            })
        })
    }

    /// Validate the proposed pose; commit it if legal, cancel it otherwise.
    ///
    /// A cancelled downward move sets `hit`; a cancelled lateral move or
    /// rotation just reverts.
    pub fn try_move(&mut self, board: &Board) -> bool {
        if can_place(board, self.proposed) {
            self.current = self.proposed;
            true
        } else {
            if self.proposed.y != self.current.y {
                self.hit = true;
                self.proposed.y = self.current.y;
            } else {
                self.proposed.x = self.current.x;
                self.proposed.orientation = self.current.orientation;
            }
            false
        }
    }

    /// Shift left (dx = -1) or right (dx = 1).
    pub fn shift(&mut self, board: &Board, dx: i8) -> bool {
        self.proposed.x = self.current.x + dx;
        self.try_move(board)
    }

    /// One row down. A rejection here raises `hit`.
    pub fn down(&mut self, board: &Board) -> bool {
        self.proposed.y = self.current.y + 1;
        self.try_move(board)
    }

    /// Rotate clockwise: the next orientation slot, wrapping to 0 past the
    /// last valid one.
    pub fn rotate_cw(&mut self, board: &Board) -> bool {
        let next = self.current.orientation + 1;
        self.proposed.orientation =
            if next < MAX_ORIENTATIONS && pieces::is_valid_orientation(self.current.kind, next) {
                next
            } else {
                0
            };
        self.try_move(board)
    }

    /// Rotate counter-clockwise: decrement, wrapping from the top slot and
    /// searching backward for a valid image. Terminates because orientation 0
    /// is valid for every kind.
    pub fn rotate_ccw(&mut self, board: &Board) -> bool {
        let mut ori = match self.current.orientation {
            0 => MAX_ORIENTATIONS,
            n => n - 1,
        };
        while ori >= MAX_ORIENTATIONS || !pieces::is_valid_orientation(self.current.kind, ori) {
            debug_assert!(ori > 0, "orientation 0 must be valid");
            ori -= 1;
        }
        self.proposed.orientation = ori;
        self.try_move(board)
    }

    /// Write the committed pose into the board. Only meaningful once `hit` is
    /// set or gravity has proven the piece cannot advance.
    pub fn lock_into(&self, board: &mut Board) {
        board.lock_image(
            self.current.kind,
            self.current.orientation,
            self.current.x,
            self.current.y,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{pieces::orientation_count, GameRng};

    #[test]
    fn try_move_in_place_is_a_noop() {
        let board = Board::new();
        let mut piece = ActivePiece::new(PieceKind::T);
        let before = piece.pose();

        assert!(piece.try_move(&board));
        assert!(piece.try_move(&board));

        assert_eq!(piece.pose(), before);
        assert!(!piece.hit());
    }

    #[test]
    fn rejected_lateral_move_reverts_without_hit() {
        let board = Board::new();
        let mut piece = ActivePiece::new(PieceKind::O);

        // Push against the left wall until the shift is refused.
        while piece.shift(&board, -1) {}
        let resting = piece.pose();

        assert!(!piece.shift(&board, -1));
        assert_eq!(piece.pose(), resting);
        assert!(!piece.hit());
    }

    #[test]
    fn rejected_downward_move_raises_hit() {
        let board = Board::new();
        let mut piece = ActivePiece::new(PieceKind::O);

        while piece.down(&board) {}
        assert!(piece.hit());

        // The committed pose stays at the last legal row.
        let max_y = piece.cells().map(|(_, y)| y).max().unwrap();
        assert_eq!(max_y, BOARD_HEIGHT as i8 - 1);
    }

    #[test]
    fn clockwise_rotation_wraps_to_zero() {
        let board = Board::new();
        for kind in PieceKind::ALL {
            let mut piece = ActivePiece::new(kind);
            // Rotate away from the top edge first so every image fits.
            for _ in 0..4 {
                piece.down(&board);
            }
            let n = orientation_count(kind);
            for _ in 0..n {
                piece.rotate_cw(&board);
            }
            assert_eq!(piece.pose().orientation, 0, "{kind:?}");
        }
    }

    #[test]
    fn counter_clockwise_from_zero_finds_last_slot() {
        let board = Board::new();
        for kind in PieceKind::ALL {
            let mut piece = ActivePiece::new(kind);
            for _ in 0..4 {
                piece.down(&board);
            }
            piece.rotate_ccw(&board);
            assert_eq!(piece.pose().orientation, orientation_count(kind) - 1, "{kind:?}");
        }
    }

    #[test]
    fn cells_above_top_are_permitted() {
        let board = Board::new();
        let pose = Pose::spawn(PieceKind::I);
        assert_eq!(pose.y, -1);
        assert!(can_place(&board, pose));
    }

    #[test]
    fn can_place_matches_per_cell_check_on_random_boards() {
        let mut rng = GameRng::new(20_240_817);

        for _ in 0..50 {
            // Random partial fill, denser near the bottom.
            let mut board = Board::new();
            for y in 9..BOARD_HEIGHT as i8 {
                for x in 0..BOARD_WIDTH as i8 {
                    if rng.next_mod(3) == 0 {
                        board.set(x, y, Some(PieceKind::S));
                    }
                }
            }

            let kind = PieceKind::from_index(rng.next_mod(7));
            let pose = Pose {
                kind,
                orientation: (rng.next_mod(orientation_count(kind) as u32)) as usize,
                x: rng.next_mod(14) as i8 - 3,
                y: rng.next_mod(20) as i8 - 2,
            };

            let mut expected = true;
            for row in 0..4u8 {
                for col in 0..4u8 {
                    if !pieces::is_lit(pose.kind, pose.orientation, col, row) {
                        continue;
                    }
                    let (x, y) = (pose.x + col as i8, pose.y + row as i8);
                    if y < 0 {
                        continue;
                    }
                    let inside = x >= 0 && x < BOARD_WIDTH as i8 && y < BOARD_HEIGHT as i8;
                    if !inside || board.is_occupied(x, y) {
                        expected = false;
                    }
                }
            }
            assert_eq!(can_place(&board, pose), expected, "{pose:?}");
        }
    }
}
