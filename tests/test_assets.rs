use std::fs;
use std::time::Duration;

use sky_raid::assets::*;
use sky_raid::entities::*;
use sky_raid::error::GameError;

#[test]
fn art_trims_trailing_blank_rows() {
    let art = SpriteArt::from_text(" /\\  \n<==>\n\n\n");
    assert_eq!(art.rows, vec![" /\\".to_string(), "<==>".to_string()]);
    assert!(art.is_decoded());
}

#[test]
fn empty_art_is_not_decoded() {
    assert!(!SpriteArt::from_text("").is_decoded());
    assert!(!SpriteArt::from_text("\n   \n").is_decoded());
}

#[test]
fn every_builtin_sprite_is_drawable() {
    for id in SpriteId::all() {
        assert!(builtin_art(id).is_decoded(), "{} has no art", id.name());
    }
}

#[test]
fn load_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("hero.txt"), " A \n/|\\\n").unwrap();
    let art = load_sprite(SpriteId::Hero, Some(dir.path())).unwrap();
    assert_eq!(art.rows, vec![" A".to_string(), "/|\\".to_string()]);
}

#[test]
fn missing_file_is_an_asset_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_sprite(SpriteId::Enemy(2), Some(dir.path())).unwrap_err();
    match err {
        GameError::AssetLoad { name, path, .. } => {
            assert_eq!(name, "enemy3");
            assert_eq!(path, dir.path().join("enemy3.txt"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn registry_unlocks_enemies_in_load_order() {
    let mut assets = AssetRegistry::new();
    assert!(assets.roster().is_empty());

    assets.insert(SpriteId::Hero, builtin_art(SpriteId::Hero));
    assets.insert(SpriteId::Enemy(6), builtin_art(SpriteId::Enemy(6)));
    assets.insert(SpriteId::Enemy(1), builtin_art(SpriteId::Enemy(1)));
    assets.insert(SpriteId::Enemy(6), builtin_art(SpriteId::Enemy(6)));

    let points: Vec<u32> = assets.roster().iter().map(|t| t.points).collect();
    assert_eq!(points, vec![75, 10]);
    assert!(assets.is_ready(SpriteId::Hero));
    assert!(!assets.is_ready(SpriteId::EnemyBullet));
}

#[test]
fn blank_sprite_joins_roster_but_is_not_ready() {
    let mut assets = AssetRegistry::new();
    assets.apply(AssetEvent::Loaded(SpriteId::Enemy(0), SpriteArt::from_text("")));
    assert_eq!(assets.roster().len(), 1);
    assert!(!assets.is_ready(SpriteId::Enemy(0)));
}

#[test]
fn failed_sprite_stays_unready() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_sprite(SpriteId::Enemy(0), Some(dir.path())).unwrap_err();
    let mut assets = AssetRegistry::new();
    assets.apply(AssetEvent::Failed(SpriteId::Enemy(0), err));
    assert!(assets.roster().is_empty());
    assert!(!assets.is_ready(SpriteId::Enemy(0)));
}

#[test]
fn background_loader_delivers_every_sprite() {
    let rx = spawn_loader(None);
    let mut assets = AssetRegistry::new();
    let mut received = 0;
    while received < SpriteId::all().len() {
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assets.apply(event);
        received += 1;
    }
    assert_eq!(assets.roster().len(), ENEMY_TYPES.len());
    assert!(SpriteId::all().into_iter().all(|id| assets.is_ready(id)));
    // Channel closes once the loader is done.
    assert_eq!(assets.drain(&rx), 0);
}

#[test]
fn loader_reports_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("hero.txt"), "^").unwrap();
    let rx = spawn_loader(Some(dir.path().to_path_buf()));

    let mut loaded = 0;
    let mut failed = 0;
    for event in rx.iter() {
        match event {
            AssetEvent::Loaded(..) => loaded += 1,
            AssetEvent::Failed(..) => failed += 1,
        }
    }
    assert_eq!(loaded, 1);
    assert_eq!(failed, SpriteId::all().len() - 1);
}

#[test]
fn builtin_art_covers_every_known_sprite_only() {
    for id in SpriteId::all() {
        assert!(builtin_art(id).is_decoded(), "{} has no built-in art", id.name());
    }
    assert!(!builtin_art(SpriteId::Enemy(ENEMY_SPRITES)).is_decoded());
}
