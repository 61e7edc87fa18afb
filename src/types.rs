//! Core types shared across the application
//! This module contains pure data types with no external dependencies

/// Playfield dimensions (interior cells, borders excluded)
pub const BOARD_WIDTH: u8 = 10;
pub const BOARD_HEIGHT: u8 = 18;

/// Spawn column for new pieces (top-left of the 4x4 bounding box)
pub const SPAWN_X: i8 = 3;

/// Approximate inter-frame duration of the tick loop, in microseconds
pub const FRAME_US: u64 = 11_500;

/// Gravity periods in ticks, indexed by level; levels past the end reuse the
/// last entry.
pub const PERIOD_TABLE: [u32; 20] = [
    100, 87, 75, 64, 54, 45, 37, 30, 24, 19, 15, 12, 10, 9, 8, 7, 6, 5, 4, 3,
];

/// Ticks the completed rows blink before they collapse
pub const BLINK_TICKS: u32 = 120;

/// Ticks after a lock during which manual soft drop is ignored
pub const FREEZE_TICKS: u32 = 10;

/// Starting line count for goal mode (counts down to zero)
pub const GOAL_LINES: u32 = 25;

/// Line clear scoring, indexed by number of rows cleared at once
pub const LINE_SCORES: [u32; 5] = [0, 40, 100, 300, 1200];

/// Highest accepted start level
pub const MAX_START_LEVEL: u32 = 9;

/// Highest accepted handicap
pub const MAX_HANDICAP: u32 = 5;

/// Default port for two-player mode
pub const DEFAULT_PORT: u16 = 37280;

/// Tetromino piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    L,
    J,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::L,
        PieceKind::J,
    ];

    /// Kind for a random draw in [0, 7)
    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 7) as usize]
    }

    pub fn index(self) -> usize {
        match self {
            PieceKind::I => 0,
            PieceKind::O => 1,
            PieceKind::T => 2,
            PieceKind::S => 3,
            PieceKind::Z => 4,
            PieceKind::L => 5,
            PieceKind::J => 6,
        }
    }

    /// Color id in [1, 7] used when the piece locks into the board
    pub fn color_id(self) -> u8 {
        self.index() as u8 + 1
    }
}

/// Cell on the board (None = empty, Some = locked with piece kind)
pub type Cell = Option<PieceKind>;

/// One buffered input key, already mapped from the raw terminal event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    MoveLeft,
    MoveRight,
    SoftDrop,
    RotateCw,
    RotateCcw,
    Pause,
    Quit,
}

/// Game mode selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Play until topping out; lines count up
    Endless,
    /// Clear a fixed number of lines; lines count down
    Goal,
    /// Two engines over a network link
    Versus,
}

/// Status of the session; `Playing` until exactly one terminal state is
/// reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Playing,
    Won,
    Lost,
    LocalQuit,
    PeerQuit,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        self != SessionStatus::Playing
    }
}

/// One peer-to-peer protocol message, as seen by the session.
///
/// The wire form is a single byte; see `net::wire`. `Pause` is a pure toggle
/// notification with no sequence guard: a lost or duplicated one leaves the
/// two peers' pause flags out of step. Known protocol gap, inherited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerMessage {
    /// Sender's current stack height (topmost occupied row, 0-17)
    Height(u8),
    /// Penalty rows the receiver must inject
    Lines(u8),
    /// Sender topped out
    Lost,
    /// Sender is exiting
    Quit,
    /// Toggle pause on the receiver
    Pause,
}

/// Sound effect requests emitted by the session, consumed by an `AudioSink`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Move,
    Rotate,
    Drop,
    Line,
    Tetris,
    Pause,
    Lost,
    Win,
}
