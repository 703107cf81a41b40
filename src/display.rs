//! Rendering layer: all terminal I/O lives here.
//!
//! Each function receives a mutable writer and an immutable view of the
//! state. No game logic is performed; this module only projects pixel-space
//! rectangles onto terminal cells and queues the matching commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};

use crate::assets::{AssetRegistry, SpriteArt};
use crate::compute::format_clock;
use crate::entities::{GameOverSummary, Rect, SessionState, SpriteId};
use crate::preloader::Preloader;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_LEVEL: Color = Color::Cyan;
const C_HUD_TIME: Color = Color::White;
const C_LEVEL_BACKGROUND: Color = Color::DarkGrey;
const C_PLAYER: Color = Color::White;
const C_BULLET_PLAYER: Color = Color::Cyan;
const C_BULLET_ENEMY: Color = Color::Magenta;
const C_HINT: Color = Color::DarkGrey;

fn enemy_color(sprite: SpriteId) -> Color {
    match sprite {
        SpriteId::Enemy(0) => Color::Green,
        SpriteId::Enemy(1) => Color::DarkGreen,
        SpriteId::Enemy(2) => Color::Blue,
        SpriteId::Enemy(3) => Color::DarkCyan,
        SpriteId::Enemy(4) => Color::DarkYellow,
        SpriteId::Enemy(5) => Color::Red,
        SpriteId::Enemy(6) => Color::DarkMagenta,
        _ => Color::DarkRed,
    }
}

// ── Projection ────────────────────────────────────────────────────────────────

/// Terminal screen geometry. Row 0 is the HUD; the play area starts at
/// `top_row` and its pixel origin is that row's first cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
    pub cell_width_px: u16,
    pub cell_height_px: u16,
    pub top_row: u16,
}

impl Viewport {
    pub fn new(cols: u16, rows: u16, cell_width_px: u16, cell_height_px: u16) -> Self {
        Self { cols, rows, cell_width_px, cell_height_px, top_row: 1 }
    }

    /// Rows available to the play area (everything below the HUD, above the hint).
    pub fn play_rows(&self) -> u16 {
        self.rows.saturating_sub(self.top_row + 1)
    }

    /// Play-area size in pixels.
    pub fn pixel_size(&self) -> (f32, f32) {
        (
            self.cols as f32 * self.cell_width_px as f32,
            self.play_rows() as f32 * self.cell_height_px as f32,
        )
    }

    /// Cell holding the pixel `(x, y)`, relative to the play-area origin.
    /// May be negative or off-screen.
    pub fn cell_at(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_width_px as f32).floor() as i32,
            self.top_row as i32 + (y / self.cell_height_px as f32).floor() as i32,
        )
    }

    /// Cells covered by `rect`, at least one in each direction.
    pub fn cell_span(&self, rect: &Rect) -> (usize, usize) {
        let w = (rect.w / self.cell_width_px as f32).round().max(1.0) as usize;
        let h = (rect.h / self.cell_height_px as f32).round().max(1.0) as usize;
        (w, h)
    }

    /// Row the level background sits on: a quarter of the way down the play area.
    pub fn level_background_row(&self) -> u16 {
        self.top_row + self.play_rows() / 4
    }

    fn play_bottom(&self) -> i32 {
        (self.top_row + self.play_rows()) as i32
    }
}

/// Visible part of a glyph row starting at column `col`, cut to `max_chars`
/// glyphs and to the screen width. Returns the start column and the text.
pub fn clip_row(row: &str, col: i32, max_chars: usize, cols: u16) -> Option<(u16, String)> {
    let skip = (-col).max(0) as usize;
    let start = col.max(0);
    if start >= cols as i32 {
        return None;
    }
    let room = (cols as i32 - start) as usize;
    let visible: String = row
        .chars()
        .take(max_chars)
        .skip(skip)
        .take(room)
        .collect();
    if visible.trim().is_empty() {
        None
    } else {
        Some((start as u16, visible))
    }
}

// ── Public entry points ───────────────────────────────────────────────────────

/// Render one complete frame of play.
pub fn render_session<W: Write>(
    out: &mut W,
    state: &SessionState,
    assets: &AssetRegistry,
    view: &Viewport,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_level_background(out, state, view)?;

    match assets.ready(SpriteId::Hero) {
        Some(art) => draw_sprite(out, art, &state.player.rect(), view, C_PLAYER)?,
        None => log::warn!("Hero sprite is not loaded yet; skipping draw"),
    }

    for bullet in &state.player.bullets {
        match assets.ready(SpriteId::HeroBullet) {
            Some(art) => draw_sprite(out, art, &bullet.rect(), view, C_BULLET_PLAYER)?,
            None => log::warn!("Hero bullet sprite is not loaded yet; skipping draw"),
        }
    }

    for enemy in &state.enemies {
        match assets.ready(enemy.sprite) {
            Some(art) => draw_sprite(out, art, &enemy.rect(), view, enemy_color(enemy.sprite))?,
            None => log::warn!("Enemy sprite {} is not loaded yet; skipping draw", enemy.sprite.name()),
        }
    }

    for bullet in &state.enemy_bullets {
        match assets.ready(SpriteId::EnemyBullet) {
            Some(art) => draw_sprite(out, art, &bullet.rect(), view, C_BULLET_ENEMY)?,
            None => log::warn!("Enemy bullet sprite is not loaded yet; skipping draw"),
        }
    }

    draw_hud(out, state, view)?;
    draw_controls_hint(out, view)?;

    finish(out, view)
}

/// Results view shown after the player dies.
pub fn render_results<W: Write>(
    out: &mut W,
    summary: &GameOverSummary,
    view: &Viewport,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let score_line = format!("Score: {}", summary.score);
    let time_line = format!("Time:  {}", format_clock(summary.time_secs));
    let lines: &[(&str, Color)] = &[
        ("╔══════════════════╗", Color::Red),
        ("║    GAME  OVER    ║", Color::Red),
        ("╚══════════════════╝", Color::Red),
        (&score_line, Color::Yellow),
        (&time_line, Color::White),
        ("R - Play Again  Q - Quit", Color::White),
    ];
    draw_centered(out, lines, view)?;

    finish(out, view)
}

/// Preloader screen: the counter while counting, a ready banner afterwards.
pub fn render_preloader<W: Write>(
    out: &mut W,
    preloader: &Preloader,
    view: &Viewport,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let counter = preloader.counter_text();
    if preloader.counter_visible() {
        let lines: &[(&str, Color)] = &[
            (&counter, Color::Cyan),
            ("", Color::Reset),
            ("ENTER : Load", C_HINT),
        ];
        draw_centered(out, lines, view)?;
    } else {
        let lines: &[(&str, Color)] = &[
            ("★  SKY  RAID  ★", Color::Cyan),
            ("", Color::Reset),
            ("Press any key to start", Color::White),
        ];
        draw_centered(out, lines, view)?;
    }

    finish(out, view)
}

// ── Pieces ────────────────────────────────────────────────────────────────────

fn finish<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

fn draw_sprite<W: Write>(
    out: &mut W,
    art: &SpriteArt,
    rect: &Rect,
    view: &Viewport,
    color: Color,
) -> std::io::Result<()> {
    let (col, row) = view.cell_at(rect.x, rect.y);
    let (span_w, span_h) = view.cell_span(rect);

    out.queue(style::SetForegroundColor(color))?;
    for (i, glyphs) in art.rows.iter().take(span_h).enumerate() {
        let y = row + i as i32;
        if y < view.top_row as i32 || y >= view.play_bottom() {
            continue;
        }
        if let Some((x, text)) = clip_row(glyphs, col, span_w, view.cols) {
            out.queue(cursor::MoveTo(x, y as u16))?;
            out.queue(Print(text))?;
        }
    }
    Ok(())
}

fn draw_level_background<W: Write>(
    out: &mut W,
    state: &SessionState,
    view: &Viewport,
) -> std::io::Result<()> {
    let text = format!("L E V E L   {}", state.difficulty.level);
    let col = (view.cols / 2).saturating_sub(text.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, view.level_background_row()))?;
    out.queue(style::SetForegroundColor(C_LEVEL_BACKGROUND))?;
    out.queue(Print(text))?;
    Ok(())
}

fn draw_hud<W: Write>(out: &mut W, state: &SessionState, view: &Viewport) -> std::io::Result<()> {
    // Score, left
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!("Score: {:>6}", state.player.score)))?;

    // Level, centre
    let level_str = format!("[ LEVEL {} ]", state.difficulty.level);
    let lx = (view.cols / 2).saturating_sub(level_str.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(lx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_LEVEL))?;
    out.queue(Print(&level_str))?;

    // Time, right
    let time_str = format!("Time: {}", format_clock(state.difficulty.game_time_secs));
    let rx = view.cols.saturating_sub(time_str.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_TIME))?;
    out.queue(Print(&time_str))?;

    Ok(())
}

fn draw_controls_hint<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, view.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("←↑↓→ / WASD : Move   SPACE : Shoot   Q : Quit"))?;
    Ok(())
}

fn draw_centered<W: Write>(
    out: &mut W,
    lines: &[(&str, Color)],
    view: &Viewport,
) -> std::io::Result<()> {
    let cx = view.cols / 2;
    let start_row = (view.rows / 2).saturating_sub(lines.len() as u16 / 2);

    for (i, (msg, color)) in lines.iter().enumerate() {
        let row = start_row + i as u16;
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*msg))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::init_state;

    fn view() -> Viewport {
        Viewport::new(80, 24, 10, 20)
    }

    #[test]
    fn pixel_size_excludes_hud_and_hint_rows() {
        assert_eq!(view().play_rows(), 22);
        assert_eq!(view().pixel_size(), (800.0, 440.0));
    }

    #[test]
    fn cell_at_offsets_by_hud_row() {
        let v = view();
        assert_eq!(v.cell_at(0.0, 0.0), (0, 1));
        assert_eq!(v.cell_at(25.0, 45.0), (2, 3));
        assert_eq!(v.cell_at(-5.0, -70.0), (-1, -3));
    }

    #[test]
    fn cell_span_is_at_least_one_cell() {
        let v = view();
        assert_eq!(v.cell_span(&Rect::new(0.0, 0.0, 70.0, 70.0)), (7, 4));
        assert_eq!(v.cell_span(&Rect::new(0.0, 0.0, 25.0, 5.0)), (3, 1));
    }

    #[test]
    fn level_background_sits_a_quarter_down() {
        assert_eq!(view().level_background_row(), 1 + 22 / 4);
    }

    #[test]
    fn clip_row_cuts_left_and_right() {
        assert_eq!(clip_row("abcdef", -2, 6, 80), Some((0, "cdef".to_string())));
        assert_eq!(clip_row("abcdef", 77, 6, 80), Some((77, "abc".to_string())));
        assert_eq!(clip_row("abcdef", 0, 2, 80), Some((0, "ab".to_string())));
        assert_eq!(clip_row("abcdef", 80, 6, 80), None);
        assert_eq!(clip_row("   ", 0, 3, 80), None);
    }

    #[test]
    fn render_without_sprites_still_draws_hud() {
        let state = init_state(800.0, 440.0);
        let mut out: Vec<u8> = Vec::new();
        render_session(&mut out, &state, &AssetRegistry::new(), &view()).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Score:"));
        assert!(text.contains("[ LEVEL 1 ]"));
        assert!(text.contains("Time: 0:00"));
        assert!(!text.contains('▲'));
    }

    #[test]
    fn render_draws_ready_hero() {
        let state = init_state(800.0, 440.0);
        let mut assets = AssetRegistry::new();
        assets.insert(SpriteId::Hero, SpriteArt::from_text("/^\\"));
        let mut out: Vec<u8> = Vec::new();
        render_session(&mut out, &state, &assets, &view()).unwrap();
        assert!(String::from_utf8_lossy(&out).contains("/^\\"));
    }

    #[test]
    fn results_show_raw_score_and_time() {
        let summary = GameOverSummary { score: 120, time_secs: 65, final_score: 770 };
        let mut out: Vec<u8> = Vec::new();
        render_results(&mut out, &summary, &view()).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Score: 120"));
        assert!(text.contains("1:05"));
    }
}
