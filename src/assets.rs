//! Sprite loading and the registry of sprites that are ready to draw.
//!
//! Sprites are glyph art: a few rows of characters drawn from the top-left
//! cell of an entity's rectangle. Loading happens on a background thread so
//! the first frames run before every sprite has arrived. Enemy types become
//! spawnable only once their sprite has loaded, in arrival order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use crate::entities::{enemy_type_for, EnemyType, SpriteId};
use crate::error::{GameError, GameResult};

/// Rows of glyphs making up one sprite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteArt {
    pub rows: Vec<String>,
}

impl SpriteArt {
    pub fn from_text(text: &str) -> Self {
        let mut rows: Vec<String> = text.lines().map(|l| l.trim_end().to_string()).collect();
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        Self { rows }
    }

    /// An art with no visible rows loaded fine but has nothing to draw.
    pub fn is_decoded(&self) -> bool {
        self.rows.iter().any(|r| !r.is_empty())
    }
}

/// Art used when no assets directory is configured.
pub fn builtin_art(id: SpriteId) -> SpriteArt {
    let text = match id {
        SpriteId::Hero => "   ▲\n ▟███▙\n▀▀ ▀ ▀▀",
        SpriteId::HeroBullet => "║",
        SpriteId::EnemyBullet => "↓",
        SpriteId::Enemy(0) => " ┌───┐\n «▼▼▼»\n  ╚═╝",
        SpriteId::Enemy(1) => " (◎◎◎)\n ╰┬┬┬╯\n  ╵╵╵",
        SpriteId::Enemy(2) => "◢█████◣\n ▀█▼█▀\n   ▼",
        SpriteId::Enemy(3) => "╔═════╗\n║ ◉ ◉ ║\n╚═╦═╦═╝",
        SpriteId::Enemy(4) => " ▄▀▀▀▄\n█ ▼ ▼ █\n ▀▄▄▄▀",
        SpriteId::Enemy(5) => "<=[#]=>\n  \\▼/\n   V",
        SpriteId::Enemy(6) => "▛▀▀▀▀▀▜\n▌ ☠ ☠ ▐\n▙▄▄▄▄▄▟",
        SpriteId::Enemy(7) => "★═════★\n║◆███◆║\n ▼▼▼▼▼",
        SpriteId::Enemy(_) => "",
    };
    SpriteArt::from_text(text)
}

/// Load one sprite, from `<dir>/<name>.txt` when a directory is given.
pub fn load_sprite(id: SpriteId, dir: Option<&Path>) -> GameResult<SpriteArt> {
    let Some(dir) = dir else {
        return Ok(builtin_art(id));
    };
    let path = dir.join(format!("{}.txt", id.name()));
    std::fs::read_to_string(&path)
        .map(|text| SpriteArt::from_text(&text))
        .map_err(|source| GameError::AssetLoad {
            name: id.name(),
            path,
            source,
        })
}

pub enum AssetEvent {
    Loaded(SpriteId, SpriteArt),
    Failed(SpriteId, GameError),
}

/// Load every sprite on a background thread, reporting each one as it lands.
pub fn spawn_loader(dir: Option<PathBuf>) -> mpsc::Receiver<AssetEvent> {
    let (tx, rx) = mpsc::channel::<AssetEvent>();
    thread::spawn(move || {
        for id in SpriteId::all() {
            let event = match load_sprite(id, dir.as_deref()) {
                Ok(art) => AssetEvent::Loaded(id, art),
                Err(err) => AssetEvent::Failed(id, err),
            };
            if tx.send(event).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });
    rx
}

/// Sprites received so far, plus the enemy types they unlock.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    sprites: HashMap<SpriteId, SpriteArt>,
    roster: Vec<EnemyType>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: SpriteId, art: SpriteArt) {
        if let Some(kind) = enemy_type_for(id) {
            if !self.roster.iter().any(|t| t.sprite == id) {
                self.roster.push(kind);
            }
        }
        self.sprites.insert(id, art);
    }

    /// Art for `id`, only if it arrived and has something to draw.
    pub fn ready(&self, id: SpriteId) -> Option<&SpriteArt> {
        self.sprites.get(&id).filter(|art| art.is_decoded())
    }

    pub fn is_ready(&self, id: SpriteId) -> bool {
        self.ready(id).is_some()
    }

    /// Enemy types whose sprites have loaded, in load order.
    pub fn roster(&self) -> &[EnemyType] {
        &self.roster
    }

    pub fn apply(&mut self, event: AssetEvent) {
        match event {
            AssetEvent::Loaded(id, art) => {
                if !art.is_decoded() {
                    log::warn!("sprite {} loaded but has no rows", id.name());
                }
                self.insert(id, art);
            }
            AssetEvent::Failed(id, err) => {
                log::error!("Failed to load {} sprite: {}", id.name(), err);
            }
        }
    }

    /// Apply every event waiting on `rx` without blocking. Returns how many
    /// were applied.
    pub fn drain(&mut self, rx: &mpsc::Receiver<AssetEvent>) -> usize {
        let mut applied = 0;
        while let Ok(event) = rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }
}
