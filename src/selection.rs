//! Weighted-random choice of which enemy type to spawn.
//!
//! Cheap enemies lose weight as the level rises (`points / (level + 1)`), but
//! no eligible type ever drops below weight 1.

use rand::Rng;

use crate::entities::EnemyType;

/// Spawn weight of `enemy` at `level`.
pub fn spawn_weight(enemy: &EnemyType, level: u32) -> f64 {
    (enemy.points as f64 / (level as f64 + 1.0)).max(1.0)
}

/// Types from `roster` allowed at `level`, paired with their weights.
pub fn eligible(roster: &[EnemyType], level: u32) -> Vec<(EnemyType, f64)> {
    roster
        .iter()
        .filter(|t| t.min_level <= level)
        .map(|t| (*t, spawn_weight(t, level)))
        .collect()
}

/// Roulette-wheel walk for a draw already scaled to `[0, total_weight)`.
///
/// Returns the first type whose cumulative weight exceeds `draw`. A draw that
/// rounds past the last interval falls back to the first eligible type.
pub fn select_with_draw(roster: &[EnemyType], level: u32, draw: f64) -> Option<EnemyType> {
    let weighted = eligible(roster, level);
    let first = weighted.first().map(|(t, _)| *t)?;

    let mut sum = 0.0;
    for (enemy, weight) in &weighted {
        sum += weight;
        if draw < sum {
            return Some(*enemy);
        }
    }
    Some(first)
}

/// Pick an enemy type for `level`, or `None` when nothing is eligible.
pub fn choose_enemy_type(roster: &[EnemyType], level: u32, rng: &mut impl Rng) -> Option<EnemyType> {
    let total: f64 = eligible(roster, level).iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }
    let draw = rng.gen::<f64>() * total;
    select_with_draw(roster, level, draw)
}
