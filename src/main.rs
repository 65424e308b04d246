mod display;

use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal,
    ExecutableCommand, QueueableCommand,
};
use rand::thread_rng;

use sky_siege::entities::{Direction, GameStatus, Session};
use sky_siege::session::{
    drag_move, new_session, pump_timers, rapid_fire_start, rapid_fire_stop, set_direction,
    shoot_once, start, stop, tick,
};

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS

// ── Simultaneous-input constants ──────────────────────────────────────────────

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is ≥ 15 Hz, so a window of 4 frames (≈133 ms) is
/// always refreshed before expiry.
const HOLD_WINDOW: u64 = 4;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

// ── Best-score persistence ────────────────────────────────────────────────────

fn best_score_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".sky_siege_score")
}

fn load_best_score() -> u32 {
    std::fs::read_to_string(best_score_path())
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn save_best_score(score: u32) {
    let _ = std::fs::write(best_score_path(), score.to_string());
}

/// Write the best score through to disk whenever it is first exceeded.
fn persist_best(session: &Session, saved_best: &mut u32) {
    if session.best_score > *saved_best {
        *saved_best = session.best_score;
        save_best_score(*saved_best);
    }
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start,
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    best_score: u32,
) -> std::io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "★  SKY  SIEGE  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(6),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    // Best score display
    if best_score > 0 {
        let best_str = format!("Best Score: {}", best_score);
        out.queue(cursor::MoveTo(
            cx.saturating_sub(best_str.chars().count() as u16 / 2),
            cy.saturating_sub(4),
        ))?;
        out.queue(style::SetForegroundColor(Color::Yellow))?;
        out.queue(Print(&best_str))?;
    }

    let lines: &[(&str, Color)] = &[
        ("Waves of raiders descend every 3 seconds.", Color::White),
        ("Hold the line — one landing ends the run.", Color::White),
        ("", Color::White),
        ("← → / A D : Move       SPACE : Shoot (hold for rapid fire)", Color::DarkGrey),
        ("MOUSE     : Click to shoot, drag to steer", Color::DarkGrey),
        ("S : Stop   Q : Quit", Color::DarkGrey),
    ];
    for (i, (msg, color)) in lines.iter().enumerate() {
        let row = cy.saturating_sub(1) + i as u16;
        out.queue(cursor::MoveTo(
            cx.saturating_sub(msg.chars().count() as u16 / 2),
            row,
        ))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }

    let prompt = "Press ENTER to start  —  Q to quit";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(prompt.chars().count() as u16 / 2),
        cy + 7,
    ))?;
    out.queue(style::SetForegroundColor(Color::Green))?;
    out.queue(Print(prompt))?;

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Block until the user makes a choice
    loop {
        if let Ok(Event::Key(KeyEvent { code, kind, .. })) = rx.recv() {
            if kind == KeyEventKind::Release {
                continue;
            }
            match code {
                KeyCode::Enter | KeyCode::Char(' ') => return Ok(MenuResult::Start),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            }
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Returns `true` → quit program,  `false` → back to menu.
///
/// Input model: instead of acting on each key event individually, we maintain
/// a `key_frame` map that records the frame number of the last press/repeat
/// event for every key.  Each frame we check which keys are still "fresh"
/// (within `HOLD_WINDOW` frames) and feed the result to `set_direction`, so
/// Space + A/D can be held at the same time with no interference.
///
/// Works on two classes of terminal:
/// * **Keyboard-enhancement capable** (Ghostty, kitty, etc.): proper
///   `Press` / `Repeat` / `Release` events → keys are removed on release.
/// * **Classic terminals**: only `Press` events (OS key-repeat shows as
///   repeated `Press`).  Keys expire naturally after `HOLD_WINDOW` frames of
///   silence, which also disarms rapid fire without a release event.
fn game_loop<W: Write>(
    out: &mut W,
    session: &mut Session,
    rx: &mpsc::Receiver<Event>,
    stars: &[display::Star],
) -> std::io::Result<bool> {
    // Maps each held key → the frame it was last seen (press or repeat).
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut drag_origin: Option<u16> = None;
    let mut saved_best = session.best_score;
    let mut frame: u64 = 0;
    let epoch = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;
        let now_ms = epoch.elapsed().as_millis() as u64;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent { code, kind, modifiers, .. }) => match kind {
                    // Press: record key + handle one-shot actions
                    KeyEventKind::Press => {
                        key_frame.insert(code.clone(), frame);
                        match code {
                            KeyCode::Char('q') | KeyCode::Char('Q') => {
                                *session = stop(session);
                                persist_best(session, &mut saved_best);
                                return Ok(true);
                            }
                            KeyCode::Char('c')
                                if modifiers.contains(KeyModifiers::CONTROL) =>
                            {
                                *session = stop(session);
                                persist_best(session, &mut saved_best);
                                return Ok(true);
                            }
                            KeyCode::Esc => {
                                *session = stop(session);
                                persist_best(session, &mut saved_best);
                                return Ok(false);
                            }
                            KeyCode::Char('s') | KeyCode::Char('S') => {
                                *session = stop(session);
                            }
                            KeyCode::Char('r') | KeyCode::Char('R')
                                if session.status == GameStatus::GameOver =>
                            {
                                *session = start(session, now_ms);
                            }
                            KeyCode::Char(' ') => {
                                // Single shot on press; holding also arms the
                                // 100 ms rapid-fire cadence
                                *session = rapid_fire_start(&shoot_once(session), now_ms);
                            }
                            _ => {}
                        }
                    }
                    // Repeat: refresh timestamp so key stays "held"
                    KeyEventKind::Repeat => {
                        key_frame.insert(code.clone(), frame);
                    }
                    // Release: remove key immediately (keyboard-enhancement path)
                    KeyEventKind::Release => {
                        key_frame.remove(&code);
                        if code == KeyCode::Char(' ') {
                            *session = rapid_fire_stop(session);
                        }
                    }
                },
                Event::Mouse(MouseEvent { kind, column, .. }) => match kind {
                    // Pointer press mirrors touch-start: shoot once and arm
                    // rapid fire until release
                    MouseEventKind::Down(MouseButton::Left) => {
                        *session = rapid_fire_start(&shoot_once(session), now_ms);
                        drag_origin = Some(column);
                    }
                    MouseEventKind::Drag(MouseButton::Left) => {
                        if let Some(origin) = drag_origin {
                            *session = drag_move(session, column as f32 - origin as f32);
                        }
                    }
                    MouseEventKind::Up(MouseButton::Left) => {
                        *session = rapid_fire_stop(session);
                        drag_origin = None;
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        // ── Refresh held-direction state every frame ──────────────────────────
        let left = is_held(&key_frame, &KeyCode::Left, frame)
            || is_held(&key_frame, &KeyCode::Char('a'), frame)
            || is_held(&key_frame, &KeyCode::Char('A'), frame);
        let right = is_held(&key_frame, &KeyCode::Right, frame)
            || is_held(&key_frame, &KeyCode::Char('d'), frame)
            || is_held(&key_frame, &KeyCode::Char('D'), frame);
        *session = set_direction(session, Direction::Left, left);
        *session = set_direction(session, Direction::Right, right);

        // Classic terminals never send a Space release; disarm rapid fire
        // once the key stops refreshing
        if session.rapid_fire_due.is_some()
            && drag_origin.is_none()
            && !is_held(&key_frame, &KeyCode::Char(' '), frame)
        {
            *session = rapid_fire_stop(session);
        }

        // ── Advance the session ───────────────────────────────────────────────
        if session.status == GameStatus::Running {
            // Timers first so a cadence firing between frames lands in this tick
            *session = pump_timers(session, now_ms);
            *session = tick(session);
        }

        persist_best(session, &mut saved_best);

        display::render(out, session, stars)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> std::io::Result<()> {
    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(event::EnableMouseCapture)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Ghostty / kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        loop {
            match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        break; // receiver dropped → program exiting
                    }
                }
                Err(_) => break,
            }
        }
    });

    let result = run(&mut out, &rx);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(event::DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>) -> std::io::Result<()> {
    let mut best_score = load_best_score();
    let mut rng = thread_rng();

    loop {
        match show_menu(out, rx, best_score)? {
            MenuResult::Quit => break,
            MenuResult::Start => {
                let (width, height) = terminal::size()?;
                let stars = display::scatter_stars(width, height, &mut rng);

                // The session clock starts at zero here; game_loop's epoch
                // is taken immediately after, so the two stay aligned.
                let mut session = start(&new_session(best_score), 0);
                let quit = game_loop(out, &mut session, rx, &stars)?;

                best_score = session.best_score;
                if quit {
                    break;
                }
                // Otherwise loop back to the menu
            }
        }
    }
    Ok(())
}
