//! Pure gameplay engine: no I/O, no timing, no terminal
//!
//! Everything in here advances only when the caller says so, which keeps the
//! whole engine unit-testable without a terminal or a socket.

pub mod board;
pub mod clear;
pub mod piece;
pub mod pieces;
pub mod rng;
pub mod session;

pub use board::Board;
pub use clear::{gravity_period, score_for, LineClearEngine};
pub use piece::{can_place, ActivePiece, Pose};
pub use rng::GameRng;
pub use session::GameSession;
