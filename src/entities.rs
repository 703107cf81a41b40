//! All game entity types. Pure data, no logic.

use crate::config::Params;

// ── Sprites ───────────────────────────────────────────────────────────────────

/// Named visual resources. Enemy sprites are indexed `0..ENEMY_SPRITES`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpriteId {
    Hero,
    HeroBullet,
    EnemyBullet,
    Enemy(u8),
}

pub const ENEMY_SPRITES: u8 = 8;

impl SpriteId {
    /// Every sprite the game loads, in request order.
    pub fn all() -> Vec<SpriteId> {
        let mut ids = vec![SpriteId::Hero, SpriteId::HeroBullet, SpriteId::EnemyBullet];
        ids.extend((0..ENEMY_SPRITES).map(SpriteId::Enemy));
        ids
    }

    /// Resource name; also the file stem under the assets directory.
    /// Enemy indices at or past `ENEMY_SPRITES` have no resource and get
    /// a name no asset file carries.
    pub fn name(&self) -> &'static str {
        match self {
            SpriteId::Hero => "hero",
            SpriteId::HeroBullet => "hero_bomb",
            SpriteId::EnemyBullet => "enemy_bomb",
            SpriteId::Enemy(0) => "enemy1",
            SpriteId::Enemy(1) => "enemy2",
            SpriteId::Enemy(2) => "enemy3",
            SpriteId::Enemy(3) => "enemy4",
            SpriteId::Enemy(4) => "enemy5",
            SpriteId::Enemy(5) => "enemy6",
            SpriteId::Enemy(6) => "enemy7",
            SpriteId::Enemy(7) => "enemy8",
            SpriteId::Enemy(_) => "unknown_enemy",
        }
    }
}

// ── Enemy catalogue ───────────────────────────────────────────────────────────

/// A spawnable kind of enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyType {
    pub sprite: SpriteId,
    pub points: u32,
    /// Lowest level at which this type may spawn.
    pub min_level: u32,
}

pub const ENEMY_TYPES: [EnemyType; ENEMY_SPRITES as usize] = [
    EnemyType { sprite: SpriteId::Enemy(0), points: 5, min_level: 1 },
    EnemyType { sprite: SpriteId::Enemy(1), points: 10, min_level: 1 },
    EnemyType { sprite: SpriteId::Enemy(2), points: 15, min_level: 1 },
    EnemyType { sprite: SpriteId::Enemy(3), points: 20, min_level: 1 },
    EnemyType { sprite: SpriteId::Enemy(4), points: 25, min_level: 1 },
    EnemyType { sprite: SpriteId::Enemy(5), points: 50, min_level: 4 },
    EnemyType { sprite: SpriteId::Enemy(6), points: 75, min_level: 4 },
    EnemyType { sprite: SpriteId::Enemy(7), points: 100, min_level: 4 },
];

/// Catalogue entry for an enemy sprite, if it is one.
pub fn enemy_type_for(sprite: SpriteId) -> Option<EnemyType> {
    ENEMY_TYPES.iter().copied().find(|t| t.sprite == sprite)
}

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in pixel space. `y` grows downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GameStatus {
    Playing,
    GameOver,
}

// ── Projectiles ───────────────────────────────────────────────────────────────

/// Player-fired projectile; travels upward.
#[derive(Clone, Debug, PartialEq)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Enemy-fired projectile; travels downward.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemyBullet {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bullet {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, width: Params::BULLET_SIZE, height: Params::BULLET_SIZE }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl EnemyBullet {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, width: Params::BULLET_SIZE, height: Params::BULLET_SIZE }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

// ── Player & enemy ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub bullets: Vec<Bullet>,
    /// Starting value only; unused in game logic.
    pub life: u32,
    pub score: u32,
    /// Frames until the next shot is allowed.
    pub shoot_cooldown: u32,
}

impl Player {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub sprite: SpriteId,
    pub points: u32,
    /// Frames until this enemy fires; re-rolled after every shot.
    pub shoot_cooldown: u32,
}

impl Enemy {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

// ── Difficulty ────────────────────────────────────────────────────────────────

/// Session-wide progression. Escalates monotonically until reset.
#[derive(Clone, Debug, PartialEq)]
pub struct Difficulty {
    pub level: u32,
    /// Pixels per frame.
    pub enemy_speed: f32,
    /// Pixels per frame.
    pub enemy_bullet_speed: f32,
    pub spawn_interval_ms: u64,
    pub game_time_secs: u32,
    /// Wall-clock timestamp of the last successful spawn.
    pub last_spawn_ms: u64,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            level: 1,
            enemy_speed: Params::ENEMY_SPEED_INITIAL,
            enemy_bullet_speed: Params::ENEMY_BULLET_SPEED_INITIAL,
            spawn_interval_ms: Params::SPAWN_INTERVAL_INITIAL_MS,
            game_time_secs: 0,
            last_spawn_ms: 0,
        }
    }
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// Keys held during the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fire: bool,
}

// ── Session summary ───────────────────────────────────────────────────────────

/// What the results view receives when the player dies.
#[derive(Clone, Debug, PartialEq)]
pub struct GameOverSummary {
    pub score: u32,
    pub time_secs: u32,
    /// Score plus the time bonus. Shown, but not part of the results link.
    pub final_score: u32,
}

impl GameOverSummary {
    pub fn results_link(&self) -> String {
        format!("gameover.html?score={}&time={}", self.score, self.time_secs)
    }
}

// ── Master game state ─────────────────────────────────────────────────────────

/// The entire session state. Cloneable so pure update functions can
/// return a new copy without mutating the original.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub enemy_bullets: Vec<EnemyBullet>,
    pub difficulty: Difficulty,
    pub status: GameStatus,
    pub frame: u64,
    /// Viewport size in pixels.
    pub width: f32,
    pub height: f32,
}
