//! Terminal runner: argument handling, pairing, and the tick loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};

use duotris::audio::{AudioSink, BellAudio};
use duotris::core::GameSession;
use duotris::input::{poll_input, InputEvent};
use duotris::net::{NetLink, NetListener};
use duotris::term::{GameView, TerminalRenderer, Viewport};
use duotris::types::{GameMode, Key, SessionStatus, DEFAULT_PORT, FRAME_US};

/// How long the result banner stays up before the terminal is restored.
const RESULT_BANNER: Duration = Duration::from_secs(2);

/// Where the versus peer lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NetTarget {
    /// Wait for the peer to connect to us.
    Listen(u16),
    /// Connect to a waiting peer.
    Connect(String, u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Options {
    mode: GameMode,
    target: Option<NetTarget>,
    level: u32,
    high: u32,
}

fn usage() -> &'static str {
    "usage: duotris [a|b|2] [host][:port] [level [high]]\n\
     \n\
     a        endless game (default)\n\
     b        clear 25 lines to win\n\
     2        two players; give host:port to join, :port or nothing to host\n\
     level    starting level, 0-9\n\
     high     handicap, 0-5 (fills the bottom rows with rubble)\n\
     \n\
     keys: j/l or arrows move, k drops, f/i and d/u rotate,\n\
     p or Enter pauses, Esc or q quits"
}

/// Parse the command line. Level and high are clamped inside the session;
/// malformed numbers and unknown modes are rejected here.
fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options {
        mode: GameMode::Endless,
        target: None,
        level: 0,
        high: 0,
    };

    let mut rest = args;
    match rest.first().map(String::as_str) {
        None => return Ok(options),
        Some("a") => {
            rest = &rest[1..];
        }
        Some("b") => {
            options.mode = GameMode::Goal;
            rest = &rest[1..];
        }
        Some("2") => {
            options.mode = GameMode::Versus;
            rest = &rest[1..];
            options.target = Some(parse_target(&mut rest)?);
        }
        Some(first) if first.chars().next().is_some_and(|c| c.is_ascii_digit()) => {}
        Some(other) => bail!("unknown mode '{other}'\n\n{}", usage()),
    }

    if let Some(level) = rest.first() {
        options.level = level
            .parse()
            .with_context(|| format!("bad level '{level}'"))?;
        rest = &rest[1..];
    }
    if let Some(high) = rest.first() {
        options.high = high.parse().with_context(|| format!("bad high '{high}'"))?;
        rest = &rest[1..];
    }
    if let Some(extra) = rest.first() {
        bail!("unexpected argument '{extra}'\n\n{}", usage());
    }
    Ok(options)
}

/// The address argument of mode 2: absent or `:port` to host, `host:port`
/// to join.
fn parse_target(rest: &mut &[String]) -> Result<NetTarget> {
    let Some(addr) = rest.first() else {
        return Ok(NetTarget::Listen(DEFAULT_PORT));
    };
    // A bare number is the level argument, not an address.
    if addr.chars().all(|c| c.is_ascii_digit()) {
        return Ok(NetTarget::Listen(DEFAULT_PORT));
    }
    *rest = &rest[1..];

    if let Some(port) = addr.strip_prefix(':') {
        let port = port.parse().with_context(|| format!("bad port '{port}'"))?;
        return Ok(NetTarget::Listen(port));
    }
    let (host, port) = addr
        .split_once(':')
        .with_context(|| format!("expected host:port, got '{addr}'"))?;
    let port = port.parse().with_context(|| format!("bad port '{port}'"))?;
    Ok(NetTarget::Connect(host.to_string(), port))
}

/// Pair with the peer. Blocks; runs before the terminal goes raw so the
/// "waiting" line is visible and Ctrl-C still works normally.
fn pair(target: &NetTarget) -> Result<NetLink> {
    match target {
        NetTarget::Listen(port) => {
            let listener = NetListener::bind(*port)?;
            eprintln!("waiting for peer on port {}...", listener.local_port()?);
            listener.accept()
        }
        NetTarget::Connect(host, port) => {
            eprintln!("connecting to {host}:{port}...");
            NetLink::connect(host, *port)
        }
    }
}

/// A termination signal overrides whatever key was read this tick, so the
/// loop winds down as a local quit and the terminal gets restored.
fn effective_key(stop: &AtomicBool, key: Option<Key>) -> Option<Key> {
    if stop.load(Ordering::SeqCst) {
        Some(Key::Quit)
    } else {
        key
    }
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32 ^ d.subsec_nanos())
        .unwrap_or(1)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("h") {
        println!("{}", usage());
        return Ok(());
    }
    let options = parse_args(&args)?;

    // Raw mode swallows the usual Ctrl-C delivery, and an external SIGTERM
    // would otherwise kill the process with the alternate screen still up.
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("failed to install the termination handler")?;
    }

    let link = match &options.target {
        Some(target) => Some(pair(target)?),
        None => None,
    };

    let mut term = TerminalRenderer::new();
    term.enter()?;
    let result = run(&mut term, options, link, &stop);
    // Always restore the terminal, even when the loop failed.
    let _ = term.exit();
    result
}

fn run(
    term: &mut TerminalRenderer,
    options: Options,
    mut link: Option<NetLink>,
    stop: &AtomicBool,
) -> Result<()> {
    let mut session = GameSession::new(options.mode, clock_seed(), options.level, options.high);
    let mut view = GameView::new();
    let mut audio = BellAudio;
    let tick = Duration::from_micros(FRAME_US);
    let mut next_tick = Instant::now() + tick;

    loop {
        if let Some(net) = link.as_ref() {
            view.set_link_noise(net.protocol_errors());
        }
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        term.draw(&view.render(&session, Viewport::new(w, h)))?;

        if session.status().is_terminal() {
            break;
        }

        // Wait out the rest of the tick in the input poller.
        let mut key = None;
        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            match poll_input(timeout)? {
                Some(InputEvent::Key(k)) if key.is_none() => key = Some(k),
                Some(InputEvent::Key(_)) => {}
                Some(InputEvent::Resized) => term.invalidate(),
                None => {}
            }
            if Instant::now() >= next_tick {
                break;
            }
        }
        next_tick += tick;

        session.tick(effective_key(stop, key));
        pump_link(&mut session, &mut link)?;

        for cue in session.take_sounds() {
            audio.play(cue);
        }
    }

    // Result display; a local quit or a pending signal exits at once.
    if session.status() != SessionStatus::LocalQuit && !stop.load(Ordering::SeqCst) {
        if session.status() == SessionStatus::Lost {
            defeat_animation(term, &mut view, &session)?;
        } else {
            std::thread::sleep(RESULT_BANNER);
        }
    }
    Ok(())
}

/// Fill the well bottom-up with rubble under the result banner.
fn defeat_animation(
    term: &mut TerminalRenderer,
    view: &mut GameView,
    session: &GameSession,
) -> Result<()> {
    let rows = duotris::types::BOARD_HEIGHT;
    let step = RESULT_BANNER / (rows as u32 + 2);
    for row in 1..=rows {
        view.set_defeat_rows(row);
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        term.draw(&view.render(session, Viewport::new(w, h)))?;
        std::thread::sleep(step);
    }
    std::thread::sleep(step * 2);
    Ok(())
}

/// Flush outgoing messages and feed incoming ones to the session. A dead
/// link ends the session instead of aborting the loop.
fn pump_link(session: &mut GameSession, link: &mut Option<NetLink>) -> Result<()> {
    let Some(net) = link.as_mut() else {
        session.take_outgoing();
        return Ok(());
    };

    for msg in session.take_outgoing() {
        if net.send(msg).is_err() {
            session.peer_gone();
            *link = None;
            return Ok(());
        }
    }
    loop {
        match net.poll() {
            Ok(Some(msg)) => session.handle_peer_message(msg),
            Ok(None) => return Ok(()),
            Err(_) => {
                session.peer_gone();
                *link = None;
                return Ok(());
            }
        }
    }
}
