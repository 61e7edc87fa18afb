//! Single-byte wire codec for the peer protocol
//!
//! Each message is one byte: a 3-bit code in the high bits and a 5-bit value
//! in the low bits. Only HEIGHT and LINES carry a value; the others leave the
//! value bits zero and ignore them on receipt.

use crate::types::PeerMessage;

const CODE_MASK: u8 = 0xE0;
const VALUE_MASK: u8 = 0x1F;

const CODE_HEIGHT: u8 = 0x00;
const CODE_LINES: u8 = 0x20;
const CODE_LOST: u8 = 0x40;
const CODE_QUIT: u8 = 0x60;
const CODE_PAUSE: u8 = 0x80;

/// Encode a message as its wire byte. Values wider than 5 bits are truncated
/// to the mask; callers never produce them (heights top out at 17, penalty
/// lines at 3).
pub fn encode(msg: PeerMessage) -> u8 {
    match msg {
        PeerMessage::Height(v) => CODE_HEIGHT | (v & VALUE_MASK),
        PeerMessage::Lines(v) => CODE_LINES | (v & VALUE_MASK),
        PeerMessage::Lost => CODE_LOST,
        PeerMessage::Quit => CODE_QUIT,
        PeerMessage::Pause => CODE_PAUSE,
    }
}

/// Decode a wire byte. Unknown codes return None; the link layer counts and
/// skips them rather than killing the connection.
pub fn decode(byte: u8) -> Option<PeerMessage> {
    let value = byte & VALUE_MASK;
    match byte & CODE_MASK {
        CODE_HEIGHT => Some(PeerMessage::Height(value)),
        CODE_LINES => Some(PeerMessage::Lines(value)),
        CODE_LOST => Some(PeerMessage::Lost),
        CODE_QUIT => Some(PeerMessage::Quit),
        CODE_PAUSE => Some(PeerMessage::Pause),
        _ => None,
    }
}
