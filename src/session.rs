//! Pure session-logic functions.
//!
//! Every public function takes an immutable reference to the current
//! [`Session`] and returns a brand-new `Session`; the host owns the single
//! mutable binding. The session clock is a `u64` millisecond value supplied
//! by the caller, which keeps the two cadence timers (enemy waves, rapid
//! fire) plain data and their cancellation testable.

use crate::entities::{
    Direction, Enemy, GameStatus, Player, Projectile, Session, ENEMY_BASE_SPEED, ENEMY_SIZE,
    FIELD_WIDTH, PROJECTILE_HEIGHT, PROJECTILE_SPEED, PROJECTILE_WIDTH,
};

// ── Tuning constants ─────────────────────────────────────────────────────────

/// Enemies per wave.
pub const WAVE_SIZE: usize = 7;
/// Spawn row of every wave.
pub const WAVE_SPAWN_Y: f32 = 50.0;
/// Wave cadence while a session is running.
pub const SPAWN_INTERVAL_MS: u64 = 3_000;
/// Shot cadence while rapid fire is held.
pub const RAPID_FIRE_INTERVAL_MS: u64 = 100;
/// Score awarded per enemy destroyed.
pub const KILL_BONUS: u32 = 5;
/// First speed-up threshold; each trigger raises it by this much.
pub const SPEED_THRESHOLD_STEP: u32 = 100;
/// Speed multiplier applied on the first threshold trigger.
pub const FIRST_SPEED_SCALE: f32 = 1.32;
/// Speed multiplier applied on every later trigger.
pub const LATER_SPEED_SCALE: f32 = 1.15;

// ── Constructors ─────────────────────────────────────────────────────────────

/// A fresh, inactive session. Collections are empty, no timers are armed,
/// and the status is `GameOver` until a `start` command arrives.
pub fn new_session(best_score: u32) -> Session {
    Session {
        player: Player::centered(),
        enemies: Vec::new(),
        projectiles: Vec::new(),
        score: 0,
        best_score,
        status: GameStatus::GameOver,
        speed_threshold: SPEED_THRESHOLD_STEP,
        held_left: false,
        held_right: false,
        spawn_due: None,
        rapid_fire_due: None,
    }
}

/// One wave: `WAVE_SIZE` enemies evenly spaced across the field width at
/// `WAVE_SPAWN_Y`, all at base speed. Enemies already in flight keep any
/// scaling they have accumulated; new waves do not inherit it.
fn wave() -> Vec<Enemy> {
    let gap = (FIELD_WIDTH - WAVE_SIZE as f32 * ENEMY_SIZE) / (WAVE_SIZE as f32 + 1.0);
    (0..WAVE_SIZE)
        .map(|i| Enemy {
            x: (i as f32 + 1.0) * gap + i as f32 * ENEMY_SIZE,
            y: WAVE_SPAWN_Y,
            width: ENEMY_SIZE,
            height: ENEMY_SIZE,
            speed: ENEMY_BASE_SPEED,
        })
        .collect()
}

// ── Session commands ─────────────────────────────────────────────────────────

/// Begin a play-through: reset score and collections, re-centre the player,
/// spawn the initial wave and arm the spawn cadence. A no-op while already
/// running. Held-direction flags carry over; they mirror physical key
/// state, not session state.
pub fn start(state: &Session, now_ms: u64) -> Session {
    if state.status == GameStatus::Running {
        return state.clone();
    }
    Session {
        enemies: wave(),
        status: GameStatus::Running,
        spawn_due: Some(now_ms + SPAWN_INTERVAL_MS),
        held_left: state.held_left,
        held_right: state.held_right,
        ..new_session(state.best_score)
    }
}

/// End the play-through: fold the score into the best score and cancel both
/// cadence timers. A no-op while already stopped.
pub fn stop(state: &Session) -> Session {
    if state.status == GameStatus::GameOver {
        return state.clone();
    }
    Session {
        status: GameStatus::GameOver,
        best_score: state.best_score.max(state.score),
        spawn_due: None,
        rapid_fire_due: None,
        ..state.clone()
    }
}

/// Record held-key state for a direction. The player moves every tick while
/// a direction is held.
pub fn set_direction(state: &Session, direction: Direction, pressed: bool) -> Session {
    let mut next = state.clone();
    match direction {
        Direction::Left => next.held_left = pressed,
        Direction::Right => next.held_right = pressed,
    }
    next
}

/// Fire a single projectile from the player's horizontal centre. A stopped
/// session gains no entities.
pub fn shoot_once(state: &Session) -> Session {
    if state.status != GameStatus::Running {
        return state.clone();
    }
    let mut projectiles = state.projectiles.clone();
    projectiles.push(Projectile {
        x: state.player.center_x() - PROJECTILE_WIDTH / 2.0,
        y: state.player.y,
        width: PROJECTILE_WIDTH,
        height: PROJECTILE_HEIGHT,
        speed: PROJECTILE_SPEED,
    });
    Session {
        projectiles,
        ..state.clone()
    }
}

/// Arm the repeating shoot cadence. Arming while already armed keeps the
/// existing deadline.
pub fn rapid_fire_start(state: &Session, now_ms: u64) -> Session {
    if state.status != GameStatus::Running || state.rapid_fire_due.is_some() {
        return state.clone();
    }
    Session {
        rapid_fire_due: Some(now_ms + RAPID_FIRE_INTERVAL_MS),
        ..state.clone()
    }
}

/// Disarm the repeating shoot cadence.
pub fn rapid_fire_stop(state: &Session) -> Session {
    Session {
        rapid_fire_due: None,
        ..state.clone()
    }
}

/// One player step in the drag direction (the pointer/touch movement path).
/// The magnitude of `delta` is ignored; only its sign matters.
pub fn drag_move(state: &Session, delta: f32) -> Session {
    if state.status != GameStatus::Running || delta == 0.0 {
        return state.clone();
    }
    let direction = if delta < 0.0 {
        Direction::Left
    } else {
        Direction::Right
    };
    Session {
        player: state.player.stepped(direction),
        ..state.clone()
    }
}

// ── Cadence timers ───────────────────────────────────────────────────────────

/// Fire every due timer deadline, re-arming each by whole intervals until it
/// is caught up with `now_ms`. Does nothing unless the session is running,
/// so an armed timer can never mutate a session that has already ended.
pub fn pump_timers(state: &Session, now_ms: u64) -> Session {
    if state.status != GameStatus::Running {
        return state.clone();
    }
    let mut next = state.clone();
    while let Some(due) = next.spawn_due {
        if due > now_ms {
            break;
        }
        next.enemies.extend(wave());
        next.spawn_due = Some(due + SPAWN_INTERVAL_MS);
    }
    while let Some(due) = next.rapid_fire_due {
        if due > now_ms {
            break;
        }
        next = shoot_once(&next);
        next.rapid_fire_due = Some(due + RAPID_FIRE_INTERVAL_MS);
    }
    next
}

// ── Per-frame tick ───────────────────────────────────────────────────────────

/// Advance the session by one frame. The host invokes this once per
/// presented frame; `GameStatus` in the result is the continue/halt signal.
pub fn tick(state: &Session) -> Session {
    if state.status == GameStatus::GameOver {
        return state.clone();
    }

    // ── 1. Player movement from held directions ──────────────────────────────
    let mut player = state.player.clone();
    if state.held_left {
        player = player.stepped(Direction::Left);
    }
    if state.held_right {
        player = player.stepped(Direction::Right);
    }

    // ── 2. Enemies descend; the floor check runs before any collision work ───
    let enemies: Vec<Enemy> = state.enemies.iter().map(Enemy::descended).collect();
    if enemies.iter().any(Enemy::reached_bottom) {
        // Terminal: freeze projectiles and score as they were, disarm timers.
        return Session {
            player,
            enemies,
            status: GameStatus::GameOver,
            best_score: state.best_score.max(state.score),
            spawn_due: None,
            rapid_fire_due: None,
            ..state.clone()
        };
    }

    // ── 3. Projectiles ascend; off-field ones are dropped ────────────────────
    let projectiles: Vec<Projectile> = state
        .projectiles
        .iter()
        .filter_map(|p| {
            let moved = p.ascended();
            if moved.off_field() {
                None
            } else {
                Some(moved)
            }
        })
        .collect();

    // ── 4. Collision scan — mark indices, compact after ──────────────────────
    // Each projectile claims at most one enemy and each enemy is claimed at
    // most once; removal never happens inside the scan itself.
    let mut killed: Vec<usize> = Vec::new();
    let mut spent: Vec<usize> = Vec::new();

    for (pi, projectile) in projectiles.iter().enumerate() {
        for (ei, enemy) in enemies.iter().enumerate() {
            if projectile.overlaps(enemy) && !killed.contains(&ei) {
                killed.push(ei);
                spent.push(pi);
                break;
            }
        }
    }

    let score = state.score + killed.len() as u32 * KILL_BONUS;

    let enemies: Vec<Enemy> = enemies
        .iter()
        .enumerate()
        .filter(|(i, _)| !killed.contains(i))
        .map(|(_, e)| e.clone())
        .collect();

    let projectiles: Vec<Projectile> = projectiles
        .iter()
        .enumerate()
        .filter(|(i, _)| !spent.contains(i))
        .map(|(_, p)| p.clone())
        .collect();

    // ── 5. Difficulty scaling on the survivors ───────────────────────────────
    let (enemies, speed_threshold) = scaled_for_score(enemies, score, state.speed_threshold);

    Session {
        player,
        enemies,
        projectiles,
        score,
        best_score: state.best_score.max(score),
        speed_threshold,
        ..state.clone()
    }
}

/// Speed up every alive enemy when the score lands on an exact multiple of
/// the current threshold: 32% on the first trigger, 15% on each later one.
/// The threshold then moves up, so a score that sits on a multiple for many
/// frames fires only once.
fn scaled_for_score(enemies: Vec<Enemy>, score: u32, threshold: u32) -> (Vec<Enemy>, u32) {
    if score == 0 || score % threshold != 0 {
        return (enemies, threshold);
    }
    let factor = if threshold == SPEED_THRESHOLD_STEP {
        FIRST_SPEED_SCALE
    } else {
        LATER_SPEED_SCALE
    };
    let enemies = enemies
        .into_iter()
        .map(|e| Enemy {
            speed: e.speed * factor,
            ..e
        })
        .collect();
    (enemies, threshold + SPEED_THRESHOLD_STEP)
}
