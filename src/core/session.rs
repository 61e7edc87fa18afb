//! Game session - the top-level state machine
//!
//! Owns the board, the falling piece, the RNG and the line-clear engine, and
//! drives one discrete time step per `tick` call. All I/O stays outside: the
//! caller feeds in at most one buffered key and any peer messages, then
//! drains the outgoing message and sound queues.

use crate::core::clear::{gravity_period, score_for};
use crate::core::piece::{can_place, ActivePiece};
use crate::core::{Board, GameRng, LineClearEngine};
use crate::types::{
    GameMode, Key, PeerMessage, PieceKind, SessionStatus, SoundCue, FREEZE_TICKS, GOAL_LINES,
    MAX_HANDICAP, MAX_START_LEVEL,
};

#[derive(Debug, Clone)]
pub struct GameSession {
    mode: GameMode,
    board: Board,
    piece: ActivePiece,
    next_kind: PieceKind,
    rng: GameRng,
    clear: LineClearEngine,
    status: SessionStatus,
    level: u32,
    /// Counts up in endless/versus, down from the target in goal mode
    lines: u32,
    score: u32,
    /// Ticks between automatic one-row descents at the current level
    period: u32,
    /// Gravity counter, reset on any successful downward move
    frame: u32,
    /// Ticks left during which manual soft drop is ignored
    freeze: u32,
    paused: bool,
    /// Column left empty in injected penalty rows
    void_col: usize,
    /// Last height reported to the peer
    height: u8,
    /// Peer's last reported height, for the gauge
    peer_height: Option<u8>,
    /// Penalty rows received but not yet injected
    pending_penalty: u32,
    outgoing: Vec<PeerMessage>,
    sounds: Vec<SoundCue>,
}

impl GameSession {
    /// Create a session. `start_level` is clamped to 0-9 and `high` to 0-5.
    pub fn new(mode: GameMode, seed: u32, start_level: u32, high: u32) -> Self {
        let mut rng = GameRng::new(seed);

        let void_col = rng.next_mod(10) as usize;
        let level = start_level.min(MAX_START_LEVEL);

        let mut board = Board::new();
        board.fill_crumbles(high.min(MAX_HANDICAP), &mut rng);

        let first = PieceKind::from_index(rng.next_mod(7));
        let next_kind = PieceKind::from_index(rng.next_mod(7));

        Self {
            mode,
            board,
            piece: ActivePiece::new(first),
            next_kind,
            rng,
            clear: LineClearEngine::new(),
            status: SessionStatus::Playing,
            level,
            lines: if mode == GameMode::Goal { GOAL_LINES } else { 0 },
            score: 0,
            period: gravity_period(level),
            frame: 0,
            freeze: 0,
            paused: false,
            void_col,
            height: 0,
            peer_height: None,
            pending_penalty: 0,
            outgoing: Vec::new(),
            sounds: Vec::new(),
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    #[cfg(test)]
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn piece(&self) -> &ActivePiece {
        &self.piece
    }

    pub fn next_kind(&self) -> PieceKind {
        self.next_kind
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn peer_height(&self) -> Option<u8> {
        self.peer_height
    }

    /// Whether completed rows are currently blinking (board frozen).
    pub fn is_clearing(&self) -> bool {
        self.clear.is_active()
    }

    /// Rows blinking right now, and whether they should be drawn blank.
    pub fn blink_state(&self) -> (&[usize], bool) {
        (self.clear.pending_rows(), self.clear.blink_hidden())
    }

    /// Drain the messages to send to the peer.
    pub fn take_outgoing(&mut self) -> Vec<PeerMessage> {
        std::mem::take(&mut self.outgoing)
    }

    /// Drain the pending sound cues.
    pub fn take_sounds(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.sounds)
    }

    /// Advance one tick, applying at most one buffered input key.
    pub fn tick(&mut self, key: Option<Key>) {
        if self.status.is_terminal() {
            return;
        }

        if self.clear.is_active() {
            // Board is frozen while rows blink; only pause and quit stay live.
            if let Some(key @ (Key::Pause | Key::Quit)) = key {
                self.handle_key(key);
            }
            if self.status.is_terminal() {
                return;
            }
            if !self.paused {
                if let Some(count) = self.clear.step(&mut self.board) {
                    self.apply_clear(count);
                }
            }
            return;
        }

        let mut moved_down = false;
        if let Some(key) = key {
            moved_down = self.handle_key(key);
        }
        if self.status.is_terminal() || self.paused {
            return;
        }

        self.frame += 1;
        if moved_down {
            self.frame = 0;
        } else if self.frame >= self.period && self.piece.down(&self.board) {
            self.frame = 0;
        }

        if self.piece.hit() {
            self.piece_hit();
            self.frame = 0;
        }

        if self.freeze > 0 {
            self.freeze -= 1;
        }
    }

    /// Feed one message received from the peer.
    pub fn handle_peer_message(&mut self, msg: PeerMessage) {
        match msg {
            PeerMessage::Height(v) => self.peer_height = Some(v),
            PeerMessage::Lines(v) => self.pending_penalty += v as u32,
            PeerMessage::Lost => {
                self.status = SessionStatus::Won;
                self.sounds.push(SoundCue::Win);
            }
            PeerMessage::Quit => self.status = SessionStatus::PeerQuit,
            PeerMessage::Pause => self.toggle_pause(false),
        }
    }

    /// The network channel died (fatal error or EOF): end the session as if
    /// the peer had quit.
    pub fn peer_gone(&mut self) {
        if !self.status.is_terminal() {
            self.status = SessionStatus::PeerQuit;
        }
    }

    fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::Pause => {
                self.toggle_pause(true);
                false
            }
            Key::Quit => {
                self.status = SessionStatus::LocalQuit;
                if self.mode == GameMode::Versus {
                    self.outgoing.push(PeerMessage::Quit);
                }
                false
            }
            _ if self.paused => false,
            Key::MoveLeft => {
                if self.piece.shift(&self.board, -1) {
                    self.sounds.push(SoundCue::Move);
                }
                false
            }
            Key::MoveRight => {
                if self.piece.shift(&self.board, 1) {
                    self.sounds.push(SoundCue::Move);
                }
                false
            }
            Key::SoftDrop => {
                if self.freeze == 0 {
                    self.piece.down(&self.board)
                } else {
                    false
                }
            }
            Key::RotateCw => {
                if self.piece.rotate_cw(&self.board) {
                    self.sounds.push(SoundCue::Rotate);
                }
                false
            }
            Key::RotateCcw => {
                if self.piece.rotate_ccw(&self.board) {
                    self.sounds.push(SoundCue::Rotate);
                }
                false
            }
        }
    }

    fn toggle_pause(&mut self, announce: bool) {
        self.paused = !self.paused;
        if self.paused {
            self.sounds.push(SoundCue::Pause);
        }
        if announce && self.mode == GameMode::Versus {
            self.outgoing.push(PeerMessage::Pause);
        }
    }

    /// The piece hit the stack: lock it, scan for completed rows, spawn the
    /// next piece, then handle loss, penalties and height telemetry.
    fn piece_hit(&mut self) {
        self.sounds.push(SoundCue::Drop);
        self.piece.lock_into(&mut self.board);

        let kind = self.next_kind;
        self.next_kind = PieceKind::from_index(self.rng.next_mod(7));
        self.piece.spawn(kind);

        let found = self.clear.scan(&self.board);
        if found > 0 {
            self.sounds.push(if found == 4 {
                SoundCue::Tetris
            } else {
                SoundCue::Line
            });
        }

        if !can_place(&self.board, self.piece.pose()) {
            self.status = SessionStatus::Lost;
            self.sounds.push(SoundCue::Lost);
            if self.mode == GameMode::Versus {
                self.outgoing.push(PeerMessage::Lost);
            }
        } else if self.pending_penalty > 0 {
            self.board
                .inject_penalty_rows(self.pending_penalty as usize, self.void_col);
            self.pending_penalty = 0;
        }

        if self.mode == GameMode::Versus {
            self.update_height();
        }

        self.freeze = FREEZE_TICKS;
    }

    /// Rows just collapsed: update score, lines, level and speed, emit the
    /// penalty message for multi-line clears, check the goal-mode win.
    fn apply_clear(&mut self, count: usize) {
        // Scores at the level the rows were completed on; a level-up earned
        // by these lines only multiplies later clears.
        self.score += score_for(count, self.level);

        match self.mode {
            GameMode::Goal => {
                self.lines = self.lines.saturating_sub(count as u32);
                if self.lines == 0 {
                    self.status = SessionStatus::Won;
                    self.sounds.push(SoundCue::Win);
                }
            }
            GameMode::Endless | GameMode::Versus => {
                self.lines += count as u32;
                // Level never decreases, even from a high start level.
                self.level = self.level.max(self.lines / 10);
            }
        }
        self.period = gravity_period(self.level);

        if self.mode == GameMode::Versus && count > 1 {
            // One line is free; only the excess hurts the opponent.
            self.outgoing.push(PeerMessage::Lines(count as u8 - 1));
        }
    }

    fn update_height(&mut self) {
        let height = self.board.stack_height();
        if height != self.height {
            self.height = height;
            self.outgoing.push(PeerMessage::Height(height));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BLINK_TICKS, BOARD_WIDTH, LINE_SCORES};

    fn fill_row(session: &mut GameSession, y: i8) {
        for x in 0..BOARD_WIDTH as i8 {
            session.board_mut().set(x, y, Some(PieceKind::Z));
        }
    }

    /// Drive the session through a full blink/collapse cycle.
    fn run_clear_cycle(session: &mut GameSession) {
        assert!(session.is_clearing());
        for _ in 0..=BLINK_TICKS {
            session.tick(None);
            if !session.is_clearing() {
                return;
            }
        }
        panic!("line clear never settled");
    }

    fn new_session(mode: GameMode) -> GameSession {
        GameSession::new(mode, 12345, 0, 0)
    }

    #[test]
    fn new_session_defaults() {
        let session = new_session(GameMode::Endless);
        assert_eq!(session.status(), SessionStatus::Playing);
        assert_eq!(session.score(), 0);
        assert_eq!(session.level(), 0);
        assert_eq!(session.lines(), 0);
        assert!(!session.paused());
        assert!(!session.is_clearing());
    }

    #[test]
    fn goal_mode_starts_with_target_lines() {
        let session = new_session(GameMode::Goal);
        assert_eq!(session.lines(), GOAL_LINES);
    }

    #[test]
    fn start_level_is_clamped() {
        let session = GameSession::new(GameMode::Endless, 1, 42, 0);
        assert_eq!(session.level(), MAX_START_LEVEL);
    }

    #[test]
    fn scoring_per_simultaneous_rows() {
        for count in 1..=4usize {
            let mut session = new_session(GameMode::Endless);
            for i in 0..count {
                fill_row(&mut session, 17 - i as i8);
            }
            // Rows are already complete; a lock scan should pick them up.
            session.clear.scan(&session.board);
            assert!(session.is_clearing());
            run_clear_cycle(&mut session);
            assert_eq!(session.score(), LINE_SCORES[count], "count {count}");
            assert_eq!(session.lines(), count as u32);
        }
    }

    #[test]
    fn level_multiplier_applies() {
        let mut session = GameSession::new(GameMode::Endless, 1, 4, 0);
        fill_row(&mut session, 17);
        session.clear.scan(&session.board);
        run_clear_cycle(&mut session);
        assert_eq!(session.score(), 40 * 5);
    }

    #[test]
    fn level_rises_every_ten_lines_and_speed_never_drops() {
        let mut session = new_session(GameMode::Endless);
        let mut last_period = session.period;
        for _ in 0..6 {
            for i in 0..2 {
                fill_row(&mut session, 17 - i);
            }
            session.clear.scan(&session.board);
            run_clear_cycle(&mut session);
            assert!(session.period <= last_period);
            last_period = session.period;
        }
        assert_eq!(session.lines(), 12);
        assert_eq!(session.level(), 1);
    }

    #[test]
    fn clear_crossing_a_level_boundary_scores_at_the_old_level() {
        let mut session = new_session(GameMode::Endless);
        session.lines = 9;
        fill_row(&mut session, 17);
        session.clear.scan(&session.board);
        run_clear_cycle(&mut session);

        // The tenth line levels up, but its own score uses the old level.
        assert_eq!(session.score(), 40);
        assert_eq!(session.level(), 1);
        assert_eq!(session.period, gravity_period(1));
    }

    #[test]
    fn goal_mode_counts_down_and_wins_at_zero() {
        let mut session = new_session(GameMode::Goal);
        let mut cleared = 0u32;
        while cleared < GOAL_LINES {
            let batch = 4.min(GOAL_LINES - cleared) as usize;
            for i in 0..batch {
                fill_row(&mut session, 17 - i as i8);
            }
            session.clear.scan(&session.board);
            run_clear_cycle(&mut session);
            cleared += batch as u32;
            assert_eq!(session.lines(), GOAL_LINES - cleared);
        }
        assert_eq!(session.lines(), 0);
        assert_eq!(session.status(), SessionStatus::Won);
    }

    #[test]
    fn goal_mode_lines_floor_at_zero() {
        let mut session = new_session(GameMode::Goal);
        session.lines = 3;
        for i in 0..4 {
            fill_row(&mut session, 17 - i);
        }
        session.clear.scan(&session.board);
        run_clear_cycle(&mut session);
        assert_eq!(session.lines(), 0);
        assert_eq!(session.status(), SessionStatus::Won);
    }

    #[test]
    fn versus_multi_clear_sends_excess_lines() {
        let mut session = new_session(GameMode::Versus);
        for i in 0..3 {
            fill_row(&mut session, 17 - i);
        }
        session.clear.scan(&session.board);
        run_clear_cycle(&mut session);

        let out = session.take_outgoing();
        assert!(out.contains(&PeerMessage::Lines(2)), "{out:?}");
    }

    #[test]
    fn versus_single_clear_sends_nothing() {
        let mut session = new_session(GameMode::Versus);
        fill_row(&mut session, 17);
        session.clear.scan(&session.board);
        run_clear_cycle(&mut session);
        assert!(!session
            .take_outgoing()
            .iter()
            .any(|m| matches!(m, PeerMessage::Lines(_))));
    }

    #[test]
    fn endless_single_clear_sends_nothing() {
        let mut session = new_session(GameMode::Endless);
        for i in 0..4 {
            fill_row(&mut session, 17 - i);
        }
        session.clear.scan(&session.board);
        run_clear_cycle(&mut session);
        assert!(session.take_outgoing().is_empty());
    }

    #[test]
    fn peer_lines_inject_on_next_lock() {
        let mut session = new_session(GameMode::Versus);
        session.handle_peer_message(PeerMessage::Lines(3));

        // Drop the current piece all the way so it locks.
        loop {
            session.tick(Some(Key::SoftDrop));
            if session.freeze > 0 || session.status().is_terminal() {
                break;
            }
        }
        assert_eq!(session.pending_penalty, 0);

        // The injected rows sit at the bottom with exactly one void column.
        let mut found = 0;
        for y in 15..18i8 {
            let occupied = (0..BOARD_WIDTH as i8)
                .filter(|&x| session.board().is_occupied(x, y))
                .count();
            if occupied == BOARD_WIDTH as usize - 1 {
                found += 1;
            }
        }
        assert!(found >= 2, "penalty rows missing: {found}");
    }

    #[test]
    fn peer_lost_wins_the_session() {
        let mut session = new_session(GameMode::Versus);
        session.handle_peer_message(PeerMessage::Lost);
        assert_eq!(session.status(), SessionStatus::Won);
    }

    #[test]
    fn peer_quit_ends_the_session() {
        let mut session = new_session(GameMode::Versus);
        session.handle_peer_message(PeerMessage::Quit);
        assert_eq!(session.status(), SessionStatus::PeerQuit);
    }

    #[test]
    fn peer_pause_toggles_without_echo() {
        let mut session = new_session(GameMode::Versus);
        session.handle_peer_message(PeerMessage::Pause);
        assert!(session.paused());
        // No PAUSE goes back out, or the two peers would ping-pong forever.
        assert!(session.take_outgoing().is_empty());

        session.handle_peer_message(PeerMessage::Pause);
        assert!(!session.paused());
    }

    #[test]
    fn local_pause_is_announced_in_versus() {
        let mut session = new_session(GameMode::Versus);
        session.tick(Some(Key::Pause));
        assert!(session.paused());
        assert_eq!(session.take_outgoing(), vec![PeerMessage::Pause]);
    }

    #[test]
    fn local_pause_is_silent_in_single_player() {
        let mut session = new_session(GameMode::Endless);
        session.tick(Some(Key::Pause));
        assert!(session.paused());
        assert!(session.take_outgoing().is_empty());
    }

    #[test]
    fn quit_key_emits_quit_and_stops() {
        let mut session = new_session(GameMode::Versus);
        session.tick(Some(Key::Quit));
        assert_eq!(session.status(), SessionStatus::LocalQuit);
        assert_eq!(session.take_outgoing(), vec![PeerMessage::Quit]);

        // A terminal session ignores further ticks.
        session.tick(Some(Key::MoveLeft));
        assert_eq!(session.status(), SessionStatus::LocalQuit);
    }

    #[test]
    fn pause_freezes_gravity() {
        let mut session = new_session(GameMode::Endless);
        session.tick(Some(Key::Pause));
        let y = session.piece().pose().y;
        for _ in 0..500 {
            session.tick(None);
        }
        assert_eq!(session.piece().pose().y, y);
        session.tick(Some(Key::Pause));
        assert!(!session.paused());
    }

    #[test]
    fn movement_keys_ignored_while_paused() {
        let mut session = new_session(GameMode::Endless);
        let x = session.piece().pose().x;
        session.tick(Some(Key::Pause));
        session.tick(Some(Key::MoveLeft));
        session.tick(Some(Key::MoveRight));
        assert_eq!(session.piece().pose().x, x);
    }

    #[test]
    fn pause_stays_live_during_blink() {
        let mut session = new_session(GameMode::Endless);
        fill_row(&mut session, 17);
        session.clear.scan(&session.board);
        assert!(session.is_clearing());

        session.tick(Some(Key::Pause));
        assert!(session.paused());
        // The countdown is held while paused.
        for _ in 0..BLINK_TICKS {
            session.tick(None);
        }
        assert!(session.is_clearing());

        session.tick(Some(Key::Pause));
        run_clear_cycle(&mut session);
        assert_eq!(session.lines(), 1);
    }

    #[test]
    fn gravity_drops_one_row_per_period() {
        let mut session = new_session(GameMode::Endless);
        let y0 = session.piece().pose().y;
        for _ in 0..session.period {
            session.tick(None);
        }
        assert_eq!(session.piece().pose().y, y0 + 1);
    }

    #[test]
    fn manual_drop_resets_gravity_counter() {
        let mut session = new_session(GameMode::Endless);
        for _ in 0..session.period - 1 {
            session.tick(None);
        }
        session.tick(Some(Key::SoftDrop));
        assert_eq!(session.frame, 0);
    }

    #[test]
    fn freeze_blocks_soft_drop_after_lock() {
        let mut session = new_session(GameMode::Endless);
        // Lock the first piece.
        loop {
            session.tick(Some(Key::SoftDrop));
            if session.freeze > 0 || session.status().is_terminal() {
                break;
            }
        }
        if session.status().is_terminal() {
            return;
        }
        let y = session.piece().pose().y;
        session.tick(Some(Key::SoftDrop));
        assert_eq!(session.piece().pose().y, y, "drop during freeze");
    }

    #[test]
    fn height_telemetry_sent_on_change() {
        let mut session = new_session(GameMode::Versus);
        loop {
            session.tick(Some(Key::SoftDrop));
            if session.freeze > 0 || session.status().is_terminal() {
                break;
            }
        }
        let out = session.take_outgoing();
        assert!(
            out.iter().any(|m| matches!(m, PeerMessage::Height(_))),
            "{out:?}"
        );
    }

    #[test]
    fn topped_out_board_loses_and_tells_peer() {
        let mut session = new_session(GameMode::Versus);
        // Wall off the spawn area below the top edge.
        for y in 1..4i8 {
            for x in 0..BOARD_WIDTH as i8 {
                session.board_mut().set(x, y, Some(PieceKind::J));
            }
        }
        loop {
            session.tick(Some(Key::SoftDrop));
            if session.status().is_terminal() {
                break;
            }
        }
        assert_eq!(session.status(), SessionStatus::Lost);
        assert!(session.take_outgoing().contains(&PeerMessage::Lost));
    }

    #[test]
    fn crumbles_fill_handicap_rows_at_start() {
        let session = GameSession::new(GameMode::Endless, 99, 0, 5);
        let filled = (8..18i8)
            .flat_map(|y| (0..BOARD_WIDTH as i8).map(move |x| (x, y)))
            .filter(|&(x, y)| session.board().is_occupied(x, y))
            .count();
        assert!(filled > 0);
        for y in 0..8i8 {
            for x in 0..BOARD_WIDTH as i8 {
                assert!(!session.board().is_occupied(x, y));
            }
        }
    }
}
