//! Two-player terminal falling-block game.
//!
//! The gameplay engine lives in [`core`] and is pure: it advances one tick at
//! a time and never touches the clock, the terminal or the network. The
//! [`term`], [`input`], [`net`] and [`audio`] modules are thin collaborators
//! the binary wires around it.

pub mod audio;
pub mod core;
pub mod input;
pub mod net;
pub mod term;
pub mod types;
