use std::path::PathBuf;

use crate::error::{GameError, GameResult};

/// Game tuning parameters, in pixels and frames unless noted.
#[derive(Debug, Clone, Copy)]
pub struct Params;

impl Params {
    // Player
    pub const PLAYER_SIZE: f32 = 70.0;
    pub const PLAYER_SPEED: f32 = 8.0;
    pub const PLAYER_LIFE: u32 = 100;
    /// Distance from the bottom edge at which the player starts.
    pub const PLAYER_START_OFFSET: f32 = 100.0;
    pub const SHOOT_COOLDOWN_INITIAL: u32 = 20;
    pub const SHOOT_COOLDOWN_BASE: u32 = 20;
    pub const SHOOT_COOLDOWN_MIN: u32 = 10;

    // Projectiles
    pub const BULLET_SIZE: f32 = 25.0;
    pub const BULLET_SPEED: f32 = 10.0;

    // Enemies
    pub const ENEMY_SIZE: f32 = 70.0;
    pub const ENEMY_SPEED_INITIAL: f32 = 2.0;
    pub const ENEMY_SPEED_STEP: f32 = 0.5;
    pub const ENEMY_BULLET_SPEED_INITIAL: f32 = 4.0;
    pub const ENEMY_BULLET_SPEED_GROWTH: f32 = 1.1;
    pub const ENEMY_BULLET_SPEED_MAX: f32 = 20.0;

    // Spawning
    pub const SPAWN_INTERVAL_INITIAL_MS: u64 = 2000;
    /// From this level on, spawn interval and enemy fire rate use the late tier.
    pub const LATE_TIER_LEVEL: u32 = 5;

    // Levelling
    pub const LEVEL_SCORE_BASE: f64 = 100.0;
    pub const LEVEL_SCORE_GROWTH: f64 = 1.5;

    // Session summary
    pub const TIME_BONUS_PER_SECOND: u32 = 10;

    // Terminal projection
    pub const CELL_WIDTH_PX: u16 = 10;
    pub const CELL_HEIGHT_PX: u16 = 20;

    // Loop timing
    pub const FRAME_MS: u64 = 16; // ~60 Hz
    pub const CLOCK_TICK_MS: u64 = 1000;
}

/// Runtime configuration, assembled from defaults and environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding `<sprite>.txt` glyph art. Built-in art when `None`.
    pub assets_dir: Option<PathBuf>,
    pub log_file: PathBuf,
    pub cell_width_px: u16,
    pub cell_height_px: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assets_dir: None,
            log_file: std::env::temp_dir().join("sky_raid.log"),
            cell_width_px: Params::CELL_WIDTH_PX,
            cell_height_px: Params::CELL_HEIGHT_PX,
        }
    }
}

impl Config {
    pub const ASSETS_VAR: &'static str = "SKY_RAID_ASSETS";
    pub const LOG_VAR: &'static str = "SKY_RAID_LOG";
    pub const CELL_VAR: &'static str = "SKY_RAID_CELL";

    pub fn from_env() -> GameResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process environment in
    /// production).
    pub fn from_lookup<F>(lookup: F) -> GameResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(Self::ASSETS_VAR).filter(|s| !s.trim().is_empty()) {
            config.assets_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = lookup(Self::LOG_VAR).filter(|s| !s.trim().is_empty()) {
            config.log_file = PathBuf::from(path);
        }
        if let Some(cell) = lookup(Self::CELL_VAR) {
            let (w, h) = parse_cell(&cell).ok_or(GameError::InvalidConfig {
                key: Self::CELL_VAR,
                value: cell.clone(),
            })?;
            config.cell_width_px = w;
            config.cell_height_px = h;
        }

        Ok(config)
    }
}

/// Parse `"WxH"` into a non-zero cell size.
fn parse_cell(raw: &str) -> Option<(u16, u16)> {
    let (w, h) = raw.trim().split_once(['x', 'X'])?;
    let w: u16 = w.trim().parse().ok()?;
    let h: u16 = h.trim().parse().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.assets_dir.is_none());
        assert_eq!(config.cell_width_px, 10);
        assert_eq!(config.cell_height_px, 20);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SKY_RAID_ASSETS", "/tmp/sprites"),
            ("SKY_RAID_LOG", "/tmp/raid.log"),
            ("SKY_RAID_CELL", "8x16"),
        ]))
        .unwrap();
        assert_eq!(config.assets_dir, Some(PathBuf::from("/tmp/sprites")));
        assert_eq!(config.log_file, PathBuf::from("/tmp/raid.log"));
        assert_eq!((config.cell_width_px, config.cell_height_px), (8, 16));
    }

    #[test]
    fn test_bad_cell_size_is_rejected() {
        for bad in ["", "10", "0x20", "ax b", "10x"] {
            let err = Config::from_lookup(lookup_from(&[("SKY_RAID_CELL", bad)])).unwrap_err();
            assert!(
                matches!(err, GameError::InvalidConfig { key: "SKY_RAID_CELL", .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_blank_paths_keep_defaults() {
        let config = Config::from_lookup(lookup_from(&[("SKY_RAID_ASSETS", "  ")])).unwrap();
        assert!(config.assets_dir.is_none());
    }
}
