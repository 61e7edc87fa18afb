//! Peer-to-peer networking for the two-player mode

pub mod link;
pub mod wire;

pub use link::{NetLink, NetListener};
