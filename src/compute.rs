//! Pure game-logic functions.
//!
//! Every public function takes an immutable reference to the current
//! `SessionState` (and, where needed, an RNG handle or a timestamp) and
//! returns a brand-new `SessionState`. Side effects are limited to the
//! injected RNG.

use rand::Rng;

use crate::config::Params;
use crate::entities::{
    Bullet, Difficulty, Enemy, EnemyBullet, EnemyType, GameOverSummary, GameStatus, InputState,
    Player, Rect, SessionState,
};
use crate::selection::choose_enemy_type;

// ── Difficulty formulas ──────────────────────────────────────────────────────

/// Frames the player must wait after a shot at `level`.
pub fn shoot_cooldown_for(level: u32) -> u32 {
    Params::SHOOT_COOLDOWN_BASE
        .saturating_sub(level / 5)
        .max(Params::SHOOT_COOLDOWN_MIN)
}

/// Score needed to leave `level`.
pub fn level_threshold(level: u32) -> u32 {
    let exponent = level.saturating_sub(1) as i32;
    (Params::LEVEL_SCORE_BASE * Params::LEVEL_SCORE_GROWTH.powi(exponent)).floor() as u32
}

/// Enemy bullet speed once `level` has been reached.
pub fn enemy_bullet_speed_for(level: u32) -> f32 {
    let exponent = level.saturating_sub(1) as i32;
    (Params::ENEMY_BULLET_SPEED_INITIAL * Params::ENEMY_BULLET_SPEED_GROWTH.powi(exponent))
        .min(Params::ENEMY_BULLET_SPEED_MAX)
}

/// Spawn interval after stepping up to `new_level` from `interval_ms`.
pub fn next_spawn_interval(interval_ms: u64, new_level: u32) -> u64 {
    if new_level >= Params::LATE_TIER_LEVEL {
        interval_ms.saturating_sub(100).max(100)
    } else {
        interval_ms.saturating_sub(200).max(200)
    }
}

/// Cooldown rolled for a freshly spawned enemy.
pub fn enemy_spawn_cooldown(level: u32, rng: &mut impl Rng) -> u32 {
    if level >= Params::LATE_TIER_LEVEL {
        rng.gen_range(0..50) + 20
    } else {
        early_tier_cooldown(rng.gen_range(0..200), level)
    }
}

/// Cooldown rolled after an enemy fires.
pub fn enemy_refire_cooldown(level: u32, rng: &mut impl Rng) -> u32 {
    if level >= Params::LATE_TIER_LEVEL {
        rng.gen_range(0..50) + 20
    } else {
        early_tier_cooldown(rng.gen_range(0..100), level)
    }
}

fn early_tier_cooldown(roll: u32, level: u32) -> u32 {
    (roll as i64 + 50 - 2 * level as i64).max(0) as u32
}

// ── Geometry ─────────────────────────────────────────────────────────────────

/// Strict AABB overlap; touching edges do not count.
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build the initial session for a viewport of `width` × `height` pixels.
pub fn init_state(width: f32, height: f32) -> SessionState {
    SessionState {
        player: Player {
            x: width / 2.0,
            y: height - Params::PLAYER_START_OFFSET,
            width: Params::PLAYER_SIZE,
            height: Params::PLAYER_SIZE,
            speed: Params::PLAYER_SPEED,
            bullets: Vec::new(),
            life: Params::PLAYER_LIFE,
            score: 0,
            shoot_cooldown: Params::SHOOT_COOLDOWN_INITIAL,
        },
        enemies: Vec::new(),
        enemy_bullets: Vec::new(),
        difficulty: Difficulty::default(),
        status: GameStatus::Playing,
        frame: 0,
        width,
        height,
    }
}

/// Restore every mutable field to its starting value, keeping the viewport.
pub fn reset_session(state: &SessionState) -> SessionState {
    init_state(state.width, state.height)
}

/// Adopt a new viewport size, pulling the player back inside it.
pub fn resize(state: &SessionState, width: f32, height: f32) -> SessionState {
    let player = Player {
        x: clamp_axis(state.player.x, width - state.player.width),
        y: clamp_axis(state.player.y, height - state.player.height),
        ..state.player.clone()
    };
    SessionState {
        player,
        width,
        height,
        ..state.clone()
    }
}

fn clamp_axis(value: f32, max: f32) -> f32 {
    value.min(max).max(0.0)
}

// ── Input-driven state transitions (pure) ───────────────────────────────────

/// Apply every held direction, keeping the player fully inside the viewport.
pub fn move_player(state: &SessionState, input: &InputState) -> SessionState {
    let p = &state.player;
    let mut x = p.x;
    let mut y = p.y;

    if input.left {
        x -= p.speed;
    }
    if input.right {
        x += p.speed;
    }
    if input.up {
        y -= p.speed;
    }
    if input.down {
        y += p.speed;
    }

    SessionState {
        player: Player {
            x: clamp_axis(x, state.width - p.width),
            y: clamp_axis(y, state.height - p.height),
            ..p.clone()
        },
        ..state.clone()
    }
}

/// Fire from the player's nose if the fire key is held and the gun is cool.
pub fn player_shoot(state: &SessionState, input: &InputState) -> SessionState {
    let p = &state.player;
    if !input.fire || p.shoot_cooldown != 0 {
        return state.clone();
    }

    let mut bullets = p.bullets.clone();
    bullets.push(Bullet::new(
        p.x + p.width / 2.0 - Params::BULLET_SIZE / 2.0,
        p.y,
    ));

    SessionState {
        player: Player {
            bullets,
            shoot_cooldown: shoot_cooldown_for(state.difficulty.level),
            ..p.clone()
        },
        ..state.clone()
    }
}

/// One frame off the shoot cooldown, stopping at zero.
pub fn cool_down(state: &SessionState) -> SessionState {
    SessionState {
        player: Player {
            shoot_cooldown: state.player.shoot_cooldown.saturating_sub(1),
            ..state.player.clone()
        },
        ..state.clone()
    }
}

// ── Movement of everything else ─────────────────────────────────────────────

/// Player bullets climb; those past the top edge are dropped.
pub fn advance_bullets(state: &SessionState) -> SessionState {
    let bullets: Vec<Bullet> = state
        .player
        .bullets
        .iter()
        .map(|b| Bullet { y: b.y - Params::BULLET_SPEED, ..b.clone() })
        .filter(|b| b.y >= 0.0)
        .collect();

    SessionState {
        player: Player { bullets, ..state.player.clone() },
        ..state.clone()
    }
}

/// Spawn one enemy if the spawn interval has elapsed since the last spawn.
///
/// `roster` holds the enemy types whose sprites are ready. With nothing
/// eligible the tick is skipped and the spawn timestamp is left alone.
pub fn spawn_enemy(
    state: &SessionState,
    roster: &[EnemyType],
    now_ms: u64,
    rng: &mut impl Rng,
) -> SessionState {
    let d = &state.difficulty;
    if now_ms.saturating_sub(d.last_spawn_ms) <= d.spawn_interval_ms {
        return state.clone();
    }
    let Some(kind) = choose_enemy_type(roster, d.level, rng) else {
        return state.clone();
    };

    let span = (state.width - Params::ENEMY_SIZE).max(0.0);
    let x = rng.gen::<f32>() * span;
    let shoot_cooldown = enemy_spawn_cooldown(d.level, rng);

    let mut enemies = state.enemies.clone();
    enemies.push(Enemy {
        x,
        y: -Params::ENEMY_SIZE,
        width: Params::ENEMY_SIZE,
        height: Params::ENEMY_SIZE,
        sprite: kind.sprite,
        points: kind.points,
        shoot_cooldown,
    });

    SessionState {
        enemies,
        difficulty: Difficulty { last_spawn_ms: now_ms, ..d.clone() },
        ..state.clone()
    }
}

/// Enemies descend, leave past the bottom edge, and fire when their
/// cooldown runs out.
pub fn advance_enemies(state: &SessionState, rng: &mut impl Rng) -> SessionState {
    let level = state.difficulty.level;
    let mut enemy_bullets = state.enemy_bullets.clone();

    let enemies: Vec<Enemy> = state
        .enemies
        .iter()
        .map(|e| Enemy { y: e.y + state.difficulty.enemy_speed, ..e.clone() })
        .filter(|e| e.y <= state.height)
        .map(|e| {
            if e.shoot_cooldown == 0 {
                enemy_bullets.push(EnemyBullet::new(
                    e.x + e.width / 2.0 - Params::BULLET_SIZE / 2.0,
                    e.y + e.height,
                ));
                Enemy { shoot_cooldown: enemy_refire_cooldown(level, rng), ..e }
            } else {
                Enemy { shoot_cooldown: e.shoot_cooldown - 1, ..e }
            }
        })
        .collect();

    SessionState {
        enemies,
        enemy_bullets,
        ..state.clone()
    }
}

/// Enemy bullets fall; those past the bottom edge are dropped.
pub fn advance_enemy_bullets(state: &SessionState) -> SessionState {
    let speed = state.difficulty.enemy_bullet_speed;
    let enemy_bullets: Vec<EnemyBullet> = state
        .enemy_bullets
        .iter()
        .map(|b| EnemyBullet { y: b.y + speed, ..b.clone() })
        .filter(|b| b.y <= state.height)
        .collect();

    SessionState {
        enemy_bullets,
        ..state.clone()
    }
}

// ── Collisions ──────────────────────────────────────────────────────────────

/// Bullets destroy enemies (score awarded); enemies or enemy bullets touching
/// the player end the session.
pub fn resolve_collisions(state: &SessionState) -> SessionState {
    let mut killed_enemies: Vec<usize> = Vec::new();
    let mut used_bullets: Vec<usize> = Vec::new();

    for (ei, enemy) in state.enemies.iter().enumerate() {
        let enemy_rect = enemy.rect();
        let hit = state
            .player
            .bullets
            .iter()
            .enumerate()
            .find(|(bi, b)| !used_bullets.contains(bi) && overlaps(&b.rect(), &enemy_rect));
        if let Some((bi, _)) = hit {
            killed_enemies.push(ei);
            used_bullets.push(bi);
        }
    }

    let score_gain: u32 = killed_enemies
        .iter()
        .map(|&i| state.enemies[i].points)
        .sum();

    let enemies: Vec<Enemy> = state
        .enemies
        .iter()
        .enumerate()
        .filter(|(i, _)| !killed_enemies.contains(i))
        .map(|(_, e)| e.clone())
        .collect();

    let bullets: Vec<Bullet> = state
        .player
        .bullets
        .iter()
        .enumerate()
        .filter(|(i, _)| !used_bullets.contains(i))
        .map(|(_, b)| b.clone())
        .collect();

    let player_rect = state.player.rect();
    let player_hit = enemies.iter().any(|e| overlaps(&player_rect, &e.rect()))
        || state
            .enemy_bullets
            .iter()
            .any(|b| overlaps(&b.rect(), &player_rect));

    if score_gain > 0 {
        log::debug!(
            "destroyed {} enemies for {} points",
            killed_enemies.len(),
            score_gain
        );
    }

    let status = if player_hit {
        GameStatus::GameOver
    } else {
        state.status
    };

    SessionState {
        player: Player {
            bullets,
            score: state.player.score + score_gain,
            ..state.player.clone()
        },
        enemies,
        status,
        ..state.clone()
    }
}

// ── Progression ─────────────────────────────────────────────────────────────

/// Advance at most one level when the score has reached the threshold.
pub fn update_level(state: &SessionState) -> SessionState {
    let d = &state.difficulty;
    if state.player.score < level_threshold(d.level) {
        return state.clone();
    }

    let level = d.level + 1;
    let difficulty = Difficulty {
        level,
        enemy_speed: d.enemy_speed + Params::ENEMY_SPEED_STEP,
        enemy_bullet_speed: enemy_bullet_speed_for(level),
        spawn_interval_ms: next_spawn_interval(d.spawn_interval_ms, level),
        ..d.clone()
    };
    log::info!(
        "level {} reached at score {} (spawn every {} ms)",
        level,
        state.player.score,
        difficulty.spawn_interval_ms
    );

    SessionState {
        difficulty,
        ..state.clone()
    }
}

/// One second of play time.
pub fn advance_clock(state: &SessionState) -> SessionState {
    SessionState {
        difficulty: Difficulty {
            game_time_secs: state.difficulty.game_time_secs + 1,
            ..state.difficulty.clone()
        },
        ..state.clone()
    }
}

/// `m:ss`, e.g. `0:07` or `12:30`.
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Summary handed to the results view. `None` while the session is live.
pub fn game_over_summary(state: &SessionState) -> Option<GameOverSummary> {
    if state.status != GameStatus::GameOver {
        return None;
    }
    let score = state.player.score;
    let time_secs = state.difficulty.game_time_secs;
    Some(GameOverSummary {
        score,
        time_secs,
        final_score: score + time_secs * Params::TIME_BONUS_PER_SECOND,
    })
}

// ── Per-frame tick (RNG and clock are injected) ──────────────────────────────

/// Advance the simulation by one frame. All randomness comes through `rng`
/// and the wall clock through `now_ms`, so callers control determinism.
pub fn tick(
    state: &SessionState,
    input: &InputState,
    roster: &[EnemyType],
    now_ms: u64,
    rng: &mut impl Rng,
) -> SessionState {
    if state.status != GameStatus::Playing {
        return state.clone();
    }

    let s = move_player(state, input);
    let s = player_shoot(&s, input);
    let s = cool_down(&s);
    let s = advance_bullets(&s);
    let s = spawn_enemy(&s, roster, now_ms, rng);
    let s = advance_enemies(&s, rng);
    let s = advance_enemy_bullets(&s);
    let s = resolve_collisions(&s);
    let s = update_level(&s);

    SessionState {
        frame: state.frame + 1,
        ..s
    }
}

// ── Game clock ──────────────────────────────────────────────────────────────

/// Repeating one-second timer, polled by the loop driver between frames.
#[derive(Clone, Debug, PartialEq)]
pub struct GameClock {
    next_tick_ms: u64,
}

impl GameClock {
    pub fn start(now_ms: u64) -> Self {
        Self { next_tick_ms: now_ms + Params::CLOCK_TICK_MS }
    }

    /// Number of whole ticks that came due since the last poll.
    pub fn poll(&mut self, now_ms: u64) -> u32 {
        let mut ticks = 0;
        while now_ms >= self.next_tick_ms {
            self.next_tick_ms += Params::CLOCK_TICK_MS;
            ticks += 1;
        }
        ticks
    }
}
