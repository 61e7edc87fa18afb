//! Piece catalog - the 7 tetromino shapes and their rotation images
//!
//! Each orientation is a 4x4 bitmap packed into 16 bits, row 0 in the high
//! nibble. For example the second image of the T piece:
//!
//! ```text
//!    0100  4
//!    1100  C
//!    0100  4
//!    0000  0
//! ```
//!
//! hence 0x4C40. Unused orientation slots hold 0x0000, which is never a legal
//! image (every piece lights at least one pixel), so slot validity is just a
//! zero test kept private to this module.

use crate::types::PieceKind;

/// Maximum number of orientation slots per kind
pub const MAX_ORIENTATIONS: usize = 4;

type Sprite = [u16; MAX_ORIENTATIONS];

const I_IMAGES: Sprite = [0x00F0, 0x4444, 0x0000, 0x0000];
const O_IMAGES: Sprite = [0x0660, 0x0000, 0x0000, 0x0000];
const T_IMAGES: Sprite = [0x0E40, 0x4C40, 0x4E00, 0x4640];
const S_IMAGES: Sprite = [0x06C0, 0x8C40, 0x0000, 0x0000];
const Z_IMAGES: Sprite = [0x0C60, 0x4C80, 0x0000, 0x0000];
const L_IMAGES: Sprite = [0x0E80, 0xC440, 0x2E00, 0x4460];
const J_IMAGES: Sprite = [0x0E20, 0x44C0, 0x8E00, 0x6440];

fn images(kind: PieceKind) -> &'static Sprite {
    match kind {
        PieceKind::I => &I_IMAGES,
        PieceKind::O => &O_IMAGES,
        PieceKind::T => &T_IMAGES,
        PieceKind::S => &S_IMAGES,
        PieceKind::Z => &Z_IMAGES,
        PieceKind::L => &L_IMAGES,
        PieceKind::J => &J_IMAGES,
    }
}

/// The 16-bit image for a kind/orientation, 0 for an unused slot.
pub fn image(kind: PieceKind, orientation: usize) -> u16 {
    debug_assert!(orientation < MAX_ORIENTATIONS);
    images(kind)[orientation]
}

/// Whether the orientation slot holds a real image.
///
/// Orientation 0 is valid for every kind, which guarantees the backward
/// rotation search in `ActivePiece` terminates.
pub fn is_valid_orientation(kind: PieceKind, orientation: usize) -> bool {
    orientation < MAX_ORIENTATIONS && images(kind)[orientation] != 0
}

/// Number of valid orientations for a kind (1, 2 or 4).
pub fn orientation_count(kind: PieceKind) -> usize {
    images(kind).iter().take_while(|&&im| im != 0).count()
}

/// Whether pixel (col, row) of the 4x4 bounding box is lit.
pub fn is_lit(kind: PieceKind, orientation: usize, col: u8, row: u8) -> bool {
    debug_assert!(col < 4 && row < 4);
    let bit = (3 - col) + 4 * (3 - row);
    image(kind, orientation) & (1 << bit) != 0
}

/// Spawn row for a kind: 0, except -1 for the I piece whose image has an
/// empty top row, so its first visible cell appears at the same height as the
/// other kinds.
pub fn spawn_y(kind: PieceKind) -> i8 {
    if kind == PieceKind::I {
        -1
    } else {
        0
    }
}
