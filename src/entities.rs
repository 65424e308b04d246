//! Game entity types and their motion rules.
//!
//! Positions and sizes are `f32` in logical field units; the display layer
//! scales them to terminal cells at render time.

/// Logical play-field width.
pub const FIELD_WIDTH: f32 = 1000.0;
/// Logical play-field height.
pub const FIELD_HEIGHT: f32 = 600.0;

pub const PLAYER_SIZE: f32 = 50.0;
pub const PLAYER_SPEED: f32 = 5.0;
/// Vertical resting position of the player sprite (80 units above the floor).
pub const PLAYER_Y: f32 = FIELD_HEIGHT - 80.0;

pub const ENEMY_SIZE: f32 = 50.0;
/// Descent speed every enemy starts with, before any difficulty scaling.
pub const ENEMY_BASE_SPEED: f32 = 0.5;

pub const PROJECTILE_WIDTH: f32 = 5.0;
pub const PROJECTILE_HEIGHT: f32 = 10.0;
pub const PROJECTILE_SPEED: f32 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Running,
    /// Terminal until an external `start` command; a freshly constructed
    /// session also begins here.
    GameOver,
}

// ── Player ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
}

impl Player {
    /// A player sprite centred on the field at its resting height.
    pub fn centered() -> Player {
        Player {
            x: (FIELD_WIDTH - PLAYER_SIZE) / 2.0,
            y: PLAYER_Y,
            width: PLAYER_SIZE,
            height: PLAYER_SIZE,
            speed: PLAYER_SPEED,
        }
    }

    /// One horizontal step, clamped to `[0, FIELD_WIDTH - width]`.
    pub fn stepped(&self, direction: Direction) -> Player {
        let dx = match direction {
            Direction::Left => -self.speed,
            Direction::Right => self.speed,
        };
        Player {
            x: (self.x + dx).clamp(0.0, FIELD_WIDTH - self.width),
            ..self.clone()
        }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

// ── Enemy ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Per-instance descent speed; difficulty scaling multiplies it in place.
    pub speed: f32,
}

impl Enemy {
    pub fn descended(&self) -> Enemy {
        Enemy {
            y: self.y + self.speed,
            ..self.clone()
        }
    }

    /// Bottom edge at or past the floor: the game-over condition.
    pub fn reached_bottom(&self) -> bool {
        self.y + self.height >= FIELD_HEIGHT
    }
}

// ── Projectile ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Projectile {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
}

impl Projectile {
    pub fn ascended(&self) -> Projectile {
        Projectile {
            y: self.y - self.speed,
            ..self.clone()
        }
    }

    /// Past the top edge of the field.
    pub fn off_field(&self) -> bool {
        self.y < 0.0
    }

    /// Axis-aligned bounding-box overlap. Strict inequalities: boxes that
    /// merely touch do not collide.
    pub fn overlaps(&self, enemy: &Enemy) -> bool {
        self.x < enemy.x + enemy.width
            && self.x + self.width > enemy.x
            && self.y < enemy.y + enemy.height
            && self.y + self.height > enemy.y
    }
}

// ── Master session state ──────────────────────────────────────────────────────

/// One play-through from `start` to game-over.  Cloneable so the pure
/// transition functions in [`crate::session`] can return a new copy without
/// mutating the original.
#[derive(Clone, Debug)]
pub struct Session {
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub score: u32,
    /// Highest score seen across sessions; never decreases.
    pub best_score: u32,
    pub status: GameStatus,
    /// Next score multiple at which enemy speeds scale up.
    pub speed_threshold: u32,
    /// Held-key state; the player moves every tick while a direction is held.
    pub held_left: bool,
    pub held_right: bool,
    /// Session-clock deadline (ms) of the next enemy wave, while armed.
    pub spawn_due: Option<u64>,
    /// Session-clock deadline (ms) of the next rapid-fire shot, while armed.
    pub rapid_fire_due: Option<u64>,
}
