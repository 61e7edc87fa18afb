//! Pure mapping from a game session to a framebuffer
//!
//! No I/O happens here, which keeps the whole layout unit-testable. Each
//! board cell is drawn 2 columns wide to compensate for terminal glyph
//! aspect ratio.

use crate::core::GameSession;
use crate::term::fb::{FrameBuffer, Rgb, Style};
use crate::types::{
    GameMode, PieceKind, SessionStatus, BOARD_HEIGHT, BOARD_WIDTH,
};

/// Board cell width in terminal columns.
const CELL_W: u16 = 2;

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

fn piece_color(kind: PieceKind) -> Rgb {
    match kind {
        PieceKind::I => Rgb::new(90, 220, 220),
        PieceKind::O => Rgb::new(235, 215, 80),
        PieceKind::T => Rgb::new(195, 120, 220),
        PieceKind::S => Rgb::new(110, 215, 120),
        PieceKind::Z => Rgb::new(220, 90, 90),
        PieceKind::L => Rgb::new(245, 165, 60),
        PieceKind::J => Rgb::new(95, 125, 225),
    }
}

fn well_style() -> Style {
    Style::new(Rgb::new(85, 85, 100), Rgb::new(25, 25, 35))
}

fn border_style() -> Style {
    Style::new(Rgb::new(190, 190, 190), Rgb::new(0, 0, 0))
}

fn label_style() -> Style {
    Style::default().bold()
}

/// Renders one session into a framebuffer sized to the viewport.
pub struct GameView {
    /// Undecodable bytes seen on the link, shown in the panel when nonzero
    link_noise: u32,
    /// Bottom rows painted over by the defeat animation
    defeat_rows: u8,
}

impl GameView {
    pub fn new() -> Self {
        Self {
            link_noise: 0,
            defeat_rows: 0,
        }
    }

    pub fn set_link_noise(&mut self, count: u32) {
        self.link_noise = count;
    }

    pub fn set_defeat_rows(&mut self, rows: u8) {
        self.defeat_rows = rows.min(BOARD_HEIGHT);
    }

    pub fn render(&self, session: &GameSession, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);

        let board_w = BOARD_WIDTH as u16 * CELL_W;
        let board_h = BOARD_HEIGHT as u16;
        let frame_w = board_w + 2;
        let frame_h = board_h + 2;

        // Board frame on the left half, panel to its right.
        let origin_x = viewport.width.saturating_sub(frame_w + 16) / 2;
        let origin_y = viewport.height.saturating_sub(frame_h) / 2;

        draw_border(&mut fb, origin_x, origin_y, frame_w, frame_h);
        fb.fill_rect(origin_x + 1, origin_y + 1, board_w, board_h, ' ', well_style());

        self.draw_board(&mut fb, session, origin_x, origin_y);
        self.draw_piece(&mut fb, session, origin_x, origin_y);
        self.draw_panel(&mut fb, session, origin_x + frame_w + 2, origin_y);
        self.draw_overlay(&mut fb, session, origin_x, origin_y, frame_w, frame_h);

        fb
    }

    fn draw_board(&self, fb: &mut FrameBuffer, session: &GameSession, ox: u16, oy: u16) {
        let (blink_rows, hidden) = session.blink_state();
        for y in 0..BOARD_HEIGHT as i8 {
            let blanked = hidden && blink_rows.contains(&(y as usize));
            for x in 0..BOARD_WIDTH as i8 {
                if blanked {
                    cell_rect(fb, ox, oy, x as u16, y as u16, ' ', well_style());
                    continue;
                }
                if let Some(Some(kind)) = session.board().get(x, y) {
                    let style = Style::new(piece_color(kind), Rgb::new(25, 25, 35)).bold();
                    cell_rect(fb, ox, oy, x as u16, y as u16, '█', style);
                }
            }
        }

        // Defeat rubble grows from the floor, covering whatever was there.
        for y in BOARD_HEIGHT - self.defeat_rows..BOARD_HEIGHT {
            for x in 0..BOARD_WIDTH {
                let kind = PieceKind::from_index(x as u32 * 31 + y as u32 * 17);
                let style = Style::new(piece_color(kind), Rgb::new(25, 25, 35)).bold();
                cell_rect(fb, ox, oy, x as u16, y as u16, '█', style);
            }
        }
    }

    fn draw_piece(&self, fb: &mut FrameBuffer, session: &GameSession, ox: u16, oy: u16) {
        if session.is_clearing() || session.status() != SessionStatus::Playing {
            return;
        }
        let kind = session.piece().pose().kind;
        let style = Style::new(piece_color(kind), Rgb::new(25, 25, 35)).bold();
        for (x, y) in session.piece().cells() {
            if y >= 0 {
                cell_rect(fb, ox, oy, x as u16, y as u16, '█', style);
            }
        }
    }

    fn draw_panel(&self, fb: &mut FrameBuffer, session: &GameSession, px: u16, oy: u16) {
        let value = Style::default();
        let mut y = oy + 1;

        fb.put_str(px, y, "SCORE", label_style());
        fb.put_str(px, y + 1, &session.score().to_string(), value);
        y += 3;

        fb.put_str(px, y, "LEVEL", label_style());
        fb.put_str(px, y + 1, &session.level().to_string(), value);
        y += 3;

        let lines_label = match session.mode() {
            GameMode::Goal => "TO GO",
            _ => "LINES",
        };
        fb.put_str(px, y, lines_label, label_style());
        fb.put_str(px, y + 1, &session.lines().to_string(), value);
        y += 3;

        fb.put_str(px, y, "NEXT", label_style());
        self.draw_preview(fb, session.next_kind(), px, y + 1);
        y += 6;

        if session.mode() == GameMode::Versus {
            fb.put_str(px, y, "PEER", label_style());
            self.draw_peer_gauge(fb, session.peer_height(), px, y + 1);
            y += 3;
        }

        if self.link_noise > 0 {
            fb.put_str(px, y, &format!("NOISE {}", self.link_noise), value);
        }
    }

    /// 4x4 sprite of the next piece, in its spawn orientation.
    fn draw_preview(&self, fb: &mut FrameBuffer, kind: PieceKind, px: u16, py: u16) {
        let style = Style::new(piece_color(kind), Rgb::new(0, 0, 0)).bold();
        for row in 0..4u8 {
            for col in 0..4u8 {
                if crate::core::pieces::is_lit(kind, 0, col, row) {
                    fb.put_str(px + col as u16 * CELL_W, py + row as u16, "██", style);
                }
            }
        }
    }

    /// Horizontal bar growing with the peer's stack. Height is the topmost
    /// occupied row, so a lower number means more danger.
    fn draw_peer_gauge(&self, fb: &mut FrameBuffer, height: Option<u8>, px: u16, py: u16) {
        let Some(height) = height else {
            fb.put_str(px, py, "-", Style::default());
            return;
        };
        let filled = if height == 0 {
            0
        } else {
            BOARD_HEIGHT - height
        };
        let style = Style::new(Rgb::new(220, 120, 90), Rgb::new(0, 0, 0));
        for i in 0..BOARD_HEIGHT as u16 {
            let ch = if (i as u8) < filled { '▇' } else { '·' };
            fb.put(px + i, py, ch, style);
        }
    }

    fn draw_overlay(
        &self,
        fb: &mut FrameBuffer,
        session: &GameSession,
        ox: u16,
        oy: u16,
        frame_w: u16,
        frame_h: u16,
    ) {
        let text = if session.paused() {
            Some("PAUSED")
        } else {
            match session.status() {
                SessionStatus::Playing | SessionStatus::LocalQuit => None,
                SessionStatus::Won => Some("YOU WIN!"),
                SessionStatus::Lost => Some("GAME OVER"),
                SessionStatus::PeerQuit => Some("PEER LEFT"),
            }
        };
        let Some(text) = text else { return };

        let len = text.chars().count() as u16;
        let x = ox + frame_w.saturating_sub(len) / 2;
        let y = oy + frame_h / 2;
        fb.put_str(x, y, text, Style::new(Rgb::new(255, 255, 255), Rgb::new(0, 0, 0)).bold());
    }
}

impl Default for GameView {
    fn default() -> Self {
        Self::new()
    }
}

fn cell_rect(fb: &mut FrameBuffer, ox: u16, oy: u16, x: u16, y: u16, ch: char, style: Style) {
    fb.fill_rect(ox + 1 + x * CELL_W, oy + 1 + y, CELL_W, 1, ch, style);
}

fn draw_border(fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16) {
    let style = border_style();
    fb.put(x, y, '┌', style);
    fb.put(x + w - 1, y, '┐', style);
    fb.put(x, y + h - 1, '└', style);
    fb.put(x + w - 1, y + h - 1, '┘', style);
    for dx in 1..w - 1 {
        fb.put(x + dx, y, '─', style);
        fb.put(x + dx, y + h - 1, '─', style);
    }
    for dy in 1..h - 1 {
        fb.put(x, y + dy, '│', style);
        fb.put(x + w - 1, y + dy, '│', style);
    }
}
