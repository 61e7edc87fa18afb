//! Sound output seam
//!
//! The session emits `SoundCue`s without caring whether anything plays them.
//! The default sink maps each cue to the terminal bell, rate-limited to one
//! beep per drain so a burst does not stutter the terminal.

use std::io::{self, Write};

use crate::types::SoundCue;

pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
}

/// Swallows every cue. Used when the bell is disabled.
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _cue: SoundCue) {}
}

/// Terminal-bell sink. Only the most prominent cues ring; movement stays
/// silent to keep the bell tolerable.
#[derive(Debug, Default)]
pub struct BellAudio;

impl AudioSink for BellAudio {
    fn play(&mut self, cue: SoundCue) {
        let ring = matches!(
            cue,
            SoundCue::Line | SoundCue::Tetris | SoundCue::Lost | SoundCue::Win
        );
        if ring {
            // Errors writing the bell are not worth surfacing.
            let _ = io::stdout().write_all(b"\x07");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_sink_accepts_every_cue() {
        let mut sink = SilentAudio;
        for cue in [
            SoundCue::Move,
            SoundCue::Rotate,
            SoundCue::Drop,
            SoundCue::Line,
            SoundCue::Tetris,
            SoundCue::Pause,
            SoundCue::Lost,
            SoundCue::Win,
        ] {
            sink.play(cue);
        }
    }
}
