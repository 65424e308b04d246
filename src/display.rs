//! Rendering layer — all terminal I/O lives here.
//!
//! Each function receives a mutable writer and an immutable view of the
//! session state.  No game logic is performed; this module only translates
//! state into terminal commands.  The 1000×600 logical field is scaled to
//! the cell grid between the border rows at render time.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use rand::Rng;

use sky_siege::entities::{Enemy, GameStatus, Projectile, Session, FIELD_HEIGHT, FIELD_WIDTH};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_BEST: Color = Color::Cyan;
const C_HUD_TITLE: Color = Color::DarkGrey;
const C_PLAYER: Color = Color::White;
const C_ENEMY: Color = Color::Green;
const C_PROJECTILE: Color = Color::Yellow;
const C_STAR_DIM: Color = Color::DarkGrey;
const C_STAR_BRIGHT: Color = Color::Grey;
const C_HINT: Color = Color::DarkGrey;

// ── Background starfield ──────────────────────────────────────────────────────

/// One cell of the static background.
pub struct Star {
    pub col: u16,
    pub row: u16,
    pub dim: bool,
}

/// Scatter a sparse starfield over the play area. Generated once at startup;
/// the field itself never scrolls.
pub fn scatter_stars(width: u16, height: u16, rng: &mut impl Rng) -> Vec<Star> {
    if width < 6 || height < 8 {
        return Vec::new();
    }
    let count = (width as usize * height as usize) / 40;
    (0..count)
        .map(|_| Star {
            col: rng.gen_range(1..width - 1),
            row: rng.gen_range(2..height - 2),
            dim: rng.gen_bool(0.6),
        })
        .collect()
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, state: &Session, stars: &[Star]) -> std::io::Result<()> {
    let (width, height) = terminal::size()?;
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_stars(out, stars, width, height)?;
    draw_border(out, width, height)?;
    draw_hud(out, state, width)?;

    for enemy in &state.enemies {
        draw_enemy(out, enemy, width, height)?;
    }
    for projectile in &state.projectiles {
        draw_projectile(out, projectile, width, height)?;
    }

    draw_player(out, state, width, height)?;
    draw_controls_hint(out, state, width, height)?;

    if state.status == GameStatus::GameOver {
        draw_game_over(out, state, width, height)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Field-to-cell mapping ─────────────────────────────────────────────────────

// Screen layout: row 0 HUD, row 1 top border, rows 2..height-3 play area,
// row height-2 bottom border, row height-1 controls hint.

fn col_of(x: f32, width: u16) -> u16 {
    let inner = width.saturating_sub(2).max(1);
    let col = 1.0 + x / FIELD_WIDTH * inner as f32;
    (col as u16).clamp(1, inner)
}

fn row_of(y: f32, height: u16) -> u16 {
    let inner = height.saturating_sub(4).max(1);
    let row = 2.0 + y / FIELD_HEIGHT * inner as f32;
    (row as u16).clamp(2, height.saturating_sub(3).max(2))
}

// ── Background ────────────────────────────────────────────────────────────────

fn draw_stars<W: Write>(out: &mut W, stars: &[Star], width: u16, height: u16) -> std::io::Result<()> {
    for star in stars {
        // Skip stars that fell outside the field after a terminal resize
        if star.col >= width.saturating_sub(1) || star.row >= height.saturating_sub(2) {
            continue;
        }
        out.queue(cursor::MoveTo(star.col, star.row))?;
        if star.dim {
            out.queue(style::SetForegroundColor(C_STAR_DIM))?;
            out.queue(Print("·"))?;
        } else {
            out.queue(style::SetForegroundColor(C_STAR_BRIGHT))?;
            out.queue(Print("✦"))?;
        }
    }
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, width: u16, height: u16) -> std::io::Result<()> {
    let w = width as usize;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    // Row 1 — top bar
    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    // Row height-2 — bottom bar
    out.queue(cursor::MoveTo(0, height.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    // Side walls
    for row in 2..height.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, state: &Session, width: u16) -> std::io::Result<()> {
    // Score — left
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!("Score: {:>8}", state.score)))?;

    // Title — centre
    let title = "[ SKY SIEGE ]";
    let tx = (width / 2).saturating_sub(title.len() as u16 / 2);
    out.queue(cursor::MoveTo(tx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_TITLE))?;
    out.queue(Print(title))?;

    // Best score — right
    let best_text = format!("Best: {}", state.best_score);
    let rx = width.saturating_sub(best_text.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_BEST))?;
    out.queue(Print(&best_text))?;

    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_player<W: Write>(out: &mut W, state: &Session, width: u16, height: u16) -> std::io::Result<()> {
    // Sprite (2 rows, 3 cols):
    //   ▲       ← tip
    //  /|\      ← wings + fuselage
    let col = col_of(state.player.center_x(), width);
    let row = row_of(state.player.y, height);

    out.queue(style::SetForegroundColor(C_PLAYER))?;
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(Print("▲"))?;

    if row + 1 < height.saturating_sub(2) {
        out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row + 1))?;
        out.queue(Print("/|\\"))?;
    }

    Ok(())
}

fn draw_enemy<W: Write>(out: &mut W, enemy: &Enemy, width: u16, height: u16) -> std::io::Result<()> {
    let col = col_of(enemy.x + enemy.width / 2.0, width);
    let row = row_of(enemy.y, height);
    out.queue(style::SetForegroundColor(C_ENEMY))?;
    out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row))?;
    out.queue(Print("<▼>"))?;
    Ok(())
}

fn draw_projectile<W: Write>(
    out: &mut W,
    projectile: &Projectile,
    width: u16,
    height: u16,
) -> std::io::Result<()> {
    let col = col_of(projectile.x + projectile.width / 2.0, width);
    let row = row_of(projectile.y, height);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(C_PROJECTILE))?;
    out.queue(Print("║"))?;
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(
    out: &mut W,
    state: &Session,
    _width: u16,
    height: u16,
) -> std::io::Result<()> {
    let hint = match state.status {
        GameStatus::Running => "← → / A D : Move   SPACE / CLICK : Shoot   S : Stop   Q : Quit",
        GameStatus::GameOver => "R : Restart   ESC : Menu   Q : Quit",
    };
    out.queue(cursor::MoveTo(1, height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(hint))?;
    Ok(())
}

// ── Game-over overlay ─────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(
    out: &mut W,
    state: &Session,
    width: u16,
    height: u16,
) -> std::io::Result<()> {
    let score_line = format!("Final Score: {}", state.score);
    let best_line = format!("Best Score: {}", state.best_score);
    let lines: &[(&str, Color)] = &[
        ("╔══════════════════╗", Color::Red),
        ("║    GAME  OVER    ║", Color::Red),
        ("╚══════════════════╝", Color::Red),
        (&score_line, Color::Yellow),
        (&best_line, Color::Cyan),
        ("R - Restart   ESC - Menu   Q - Quit", Color::White),
    ];

    let cx = width / 2;
    let start_row = (height / 2).saturating_sub(lines.len() as u16 / 2);

    for (i, (msg, color)) in lines.iter().enumerate() {
        let row = start_row + i as u16;
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }

    Ok(())
}
