use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::ThreadRng;
use rand::thread_rng;

use sky_raid::assets::{spawn_loader, AssetEvent, AssetRegistry};
use sky_raid::compute::{advance_clock, game_over_summary, init_state, reset_session, resize, tick, GameClock};
use sky_raid::config::{Config, Params};
use sky_raid::display::{render_preloader, render_results, render_session, Viewport};
use sky_raid::entities::{GameOverSummary, InputState, SessionState};
use sky_raid::error::GameResult;
use sky_raid::preloader::Preloader;

const FRAME: Duration = Duration::from_millis(Params::FRAME_MS);

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames. Covers terminals that don't emit key-release events:
/// at ~60 FPS, 8 frames (≈133 ms) outlasts the OS key-repeat interval.
const HOLD_WINDOW: u64 = 8;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

fn held_input(key_frame: &HashMap<KeyCode, u64>, frame: u64) -> InputState {
    InputState {
        left: any_held(key_frame, &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')], frame),
        right: any_held(key_frame, &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')], frame),
        up: any_held(key_frame, &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')], frame),
        down: any_held(key_frame, &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')], frame),
        fire: is_held(key_frame, &KeyCode::Char(' '), frame),
    }
}

fn is_quit(code: &KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Wall-clock milliseconds, the time base for spawning and timers.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn sleep_rest_of_frame(frame_start: Instant) {
    let elapsed = frame_start.elapsed();
    if elapsed < FRAME {
        thread::sleep(FRAME - elapsed);
    }
}

fn init_logging(config: &Config) -> GameResult<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

// ── Preloader ─────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum PreloaderAction {
    Quit,
    Start,
    Load,
    Ignore,
}

/// What a key press means on the preloader screen. Enter only counts while
/// the counter runs; once it is done any key starts the game.
fn preloader_action(code: &KeyCode, modifiers: KeyModifiers, active: bool) -> PreloaderAction {
    if is_quit(code, modifiers) {
        PreloaderAction::Quit
    } else if active {
        PreloaderAction::Start
    } else if *code == KeyCode::Enter {
        PreloaderAction::Load
    } else {
        PreloaderAction::Ignore
    }
}

/// Returns `true` → quit program, `false` → start the game.
fn preloader_loop<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    view: &mut Viewport,
    rng: &mut ThreadRng,
) -> GameResult<bool> {
    let mut preloader = Preloader::new();

    loop {
        let frame_start = Instant::now();

        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent { code, kind: KeyEventKind::Press, modifiers, .. }) => {
                    match preloader_action(&code, modifiers, preloader.is_active()) {
                        PreloaderAction::Quit => {
                            preloader.cancel_pending();
                            return Ok(true);
                        }
                        PreloaderAction::Start => return Ok(false),
                        PreloaderAction::Load => {
                            preloader.press_enter(now_ms(), rng);
                        }
                        PreloaderAction::Ignore => {}
                    }
                }
                Event::Resize(cols, rows) => {
                    *view = Viewport::new(cols, rows, view.cell_width_px, view.cell_height_px);
                }
                _ => {}
            }
        }

        preloader.poll(now_ms(), rng);
        render_preloader(out, &preloader, view)?;

        sleep_rest_of_frame(frame_start);
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

enum LoopExit {
    Quit,
    GameOver(GameOverSummary),
}

/// Input model: instead of acting on each key event individually, we maintain
/// a `key_frame` map that records the frame number of the last press/repeat
/// event for every key. Each frame we check which keys are still "fresh"
/// (within `HOLD_WINDOW` frames) and apply all their effects simultaneously,
/// so Space and any number of direction keys can be held together.
///
/// A frame whose rendering fails is logged and skipped; the simulation keeps
/// whatever state the tick produced and the loop moves on.
fn game_loop<W: Write>(
    out: &mut W,
    state: &mut SessionState,
    rx: &mpsc::Receiver<Event>,
    assets: &mut AssetRegistry,
    asset_rx: &mpsc::Receiver<AssetEvent>,
    view: &mut Viewport,
    rng: &mut ThreadRng,
) -> GameResult<LoopExit> {
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut clock = GameClock::start(now_ms());
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        frame += 1;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent { code, kind, modifiers, .. }) => match kind {
                    KeyEventKind::Press => {
                        if is_quit(&code, modifiers) {
                            return Ok(LoopExit::Quit);
                        }
                        key_frame.insert(code, frame);
                    }
                    // Repeat: refresh timestamp so key stays "held"
                    KeyEventKind::Repeat => {
                        key_frame.insert(code, frame);
                    }
                    // Release: remove key immediately (keyboard-enhancement path)
                    KeyEventKind::Release => {
                        key_frame.remove(&code);
                    }
                },
                Event::Resize(cols, rows) => {
                    *view = Viewport::new(cols, rows, view.cell_width_px, view.cell_height_px);
                    let (width, height) = view.pixel_size();
                    *state = resize(state, width, height);
                }
                _ => {}
            }
        }

        assets.drain(asset_rx);

        let now = now_ms();
        for _ in 0..clock.poll(now) {
            *state = advance_clock(state);
        }

        let input = held_input(&key_frame, frame);
        *state = tick(state, &input, assets.roster(), now, rng);

        if let Err(err) = render_session(out, state, assets, view) {
            log::error!("Error in game loop: {}", err);
        }

        if let Some(summary) = game_over_summary(state) {
            log::info!(
                "session over after {}s with {} points (final {}), results: {}",
                summary.time_secs,
                summary.score,
                summary.final_score,
                summary.results_link()
            );
            return Ok(LoopExit::GameOver(summary));
        }

        sleep_rest_of_frame(frame_start);
    }
}

#[derive(Debug, PartialEq)]
enum ResultsChoice {
    PlayAgain,
    Quit,
}

/// Only key presses choose; releases, repeats, resizes and the rest are ignored.
fn results_choice(ev: &Event) -> Option<ResultsChoice> {
    match ev {
        Event::Key(KeyEvent { code, kind: KeyEventKind::Press, modifiers, .. }) => {
            if is_quit(code, *modifiers) {
                Some(ResultsChoice::Quit)
            } else if matches!(code, KeyCode::Char('r') | KeyCode::Char('R')) {
                Some(ResultsChoice::PlayAgain)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Throw away input queued during play so it cannot answer the results view.
fn drain_pending(rx: &mpsc::Receiver<Event>) {
    while rx.try_recv().is_ok() {}
}

/// Returns `true` → quit program, `false` → play again.
fn results_screen<W: Write>(
    out: &mut W,
    summary: &GameOverSummary,
    rx: &mpsc::Receiver<Event>,
    view: &Viewport,
) -> GameResult<bool> {
    render_results(out, summary, view)?;

    // Block until the user makes a choice
    loop {
        match rx.recv() {
            Ok(ev) => match results_choice(&ev) {
                Some(ResultsChoice::Quit) => return Ok(true),
                Some(ResultsChoice::PlayAgain) => return Ok(false),
                None => continue,
            },
            // Input thread is gone; nobody can answer any more.
            Err(_) => return Ok(true),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> GameResult<()> {
    let config = Config::from_env()?;
    init_logging(&config)?;
    log::info!("starting with {:?}", config);

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(err) => {
                log::error!("terminal event reader stopped: {}", err);
                break;
            }
        }
    });

    let result = run(&mut out, &rx, &config);
    if let Err(err) = &result {
        log::error!("fatal: {}", err);
    }

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>, config: &Config) -> GameResult<()> {
    let mut rng = thread_rng();
    let (cols, rows) = terminal::size()?;
    let mut view = Viewport::new(cols, rows, config.cell_width_px, config.cell_height_px);

    // Sprites load while the preloader runs.
    let asset_rx = spawn_loader(config.assets_dir.clone());
    let mut assets = AssetRegistry::new();

    if preloader_loop(out, rx, &mut view, &mut rng)? {
        return Ok(());
    }

    let (width, height) = view.pixel_size();
    let mut state = init_state(width, height);

    loop {
        match game_loop(out, &mut state, rx, &mut assets, &asset_rx, &mut view, &mut rng)? {
            LoopExit::Quit => break,
            LoopExit::GameOver(summary) => {
                drain_pending(rx);
                if results_screen(out, &summary, rx, &view)? {
                    break;
                }
                state = reset_session(&state);
                log::info!("session reset");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sky_raid::entities::{Enemy, GameStatus, SpriteId};

    fn key(code: KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind))
    }

    fn press(code: KeyCode) -> Event {
        key(code, KeyEventKind::Press)
    }

    fn summary() -> GameOverSummary {
        GameOverSummary { score: 40, time_secs: 12, final_score: 160 }
    }

    fn view() -> Viewport {
        Viewport::new(80, 24, 10, 20)
    }

    fn answer(events: Vec<Event>) -> bool {
        let (tx, rx) = mpsc::channel();
        for ev in events {
            tx.send(ev).unwrap();
        }
        let mut out = Vec::new();
        results_screen(&mut out, &summary(), &rx, &view()).unwrap()
    }

    #[test]
    fn test_results_r_plays_again() {
        assert!(!answer(vec![press(KeyCode::Char('r'))]));
        assert!(!answer(vec![press(KeyCode::Char('R'))]));
    }

    #[test]
    fn test_results_q_quits() {
        assert!(answer(vec![press(KeyCode::Char('q'))]));
        assert!(answer(vec![press(KeyCode::Esc)]));
    }

    #[test]
    fn test_results_ignore_release_and_repeat_of_held_key() {
        let events = vec![
            key(KeyCode::Char(' '), KeyEventKind::Repeat),
            key(KeyCode::Char(' '), KeyEventKind::Release),
            key(KeyCode::Left, KeyEventKind::Release),
            press(KeyCode::Char('r')),
        ];
        assert!(!answer(events), "a held key's release must not leave the results view");
    }

    #[test]
    fn test_results_ignore_resize_and_focus() {
        let events = vec![
            Event::Resize(100, 30),
            Event::FocusLost,
            Event::FocusGained,
            press(KeyCode::Char('x')),
            press(KeyCode::Char('r')),
        ];
        assert!(!answer(events));
    }

    #[test]
    fn test_results_quit_when_input_thread_is_gone() {
        let (tx, rx) = mpsc::channel::<Event>();
        tx.send(Event::Resize(90, 30)).unwrap();
        drop(tx);
        let mut out = Vec::new();
        assert!(results_screen(&mut out, &summary(), &rx, &view()).unwrap());
    }

    #[test]
    fn test_drain_discards_queued_game_input() {
        let (tx, rx) = mpsc::channel();
        tx.send(press(KeyCode::Char(' '))).unwrap();
        tx.send(press(KeyCode::Char('q'))).unwrap();
        drain_pending(&rx);
        tx.send(press(KeyCode::Char('r'))).unwrap();
        let mut out = Vec::new();
        assert!(!results_screen(&mut out, &summary(), &rx, &view()).unwrap());
    }

    #[test]
    fn test_results_choice_only_on_press() {
        assert_eq!(results_choice(&press(KeyCode::Char('r'))), Some(ResultsChoice::PlayAgain));
        assert_eq!(
            results_choice(&key(KeyCode::Char('r'), KeyEventKind::Release)),
            None
        );
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(results_choice(&ctrl_c), Some(ResultsChoice::Quit));
        assert_eq!(results_choice(&press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn test_preloader_enter_only_while_counting() {
        let none = KeyModifiers::NONE;
        assert_eq!(preloader_action(&KeyCode::Enter, none, false), PreloaderAction::Load);
        assert_eq!(preloader_action(&KeyCode::Char(' '), none, false), PreloaderAction::Ignore);
        assert_eq!(preloader_action(&KeyCode::Char('q'), none, false), PreloaderAction::Quit);
    }

    #[test]
    fn test_preloader_any_key_starts_once_active() {
        let none = KeyModifiers::NONE;
        assert_eq!(preloader_action(&KeyCode::Enter, none, true), PreloaderAction::Start);
        assert_eq!(preloader_action(&KeyCode::Char(' '), none, true), PreloaderAction::Start);
        assert_eq!(preloader_action(&KeyCode::Esc, none, true), PreloaderAction::Quit);
    }

    #[test]
    fn test_held_input_expires_after_window() {
        let mut key_frame = HashMap::new();
        key_frame.insert(KeyCode::Char(' '), 10);
        key_frame.insert(KeyCode::Char('a'), 10);
        let input = held_input(&key_frame, 10 + HOLD_WINDOW);
        assert!(input.fire && input.left && !input.right);
        assert_eq!(held_input(&key_frame, 11 + HOLD_WINDOW), InputState::default());
    }

    #[test]
    fn test_death_then_play_again_resets_session() {
        let mut state = init_state(800.0, 600.0);
        state.player.score = 35;
        state.difficulty.game_time_secs = 7;
        state.enemies.push(Enemy {
            x: state.player.x,
            y: state.player.y,
            width: 70.0,
            height: 70.0,
            sprite: SpriteId::Enemy(0),
            points: 5,
            shoot_cooldown: 10,
        });

        let mut rng = StdRng::seed_from_u64(7);
        let state = tick(&state, &InputState::default(), &[], 0, &mut rng);
        assert_eq!(state.status, GameStatus::GameOver);
        let summary = game_over_summary(&state).unwrap();
        assert_eq!(summary.results_link(), "gameover.html?score=35&time=7");

        let (tx, rx) = mpsc::channel();
        tx.send(key(KeyCode::Char(' '), KeyEventKind::Release)).unwrap();
        tx.send(press(KeyCode::Char('r'))).unwrap();
        let mut out = Vec::new();
        let quit = results_screen(&mut out, &summary, &rx, &view()).unwrap();
        assert!(!quit);

        let fresh = reset_session(&state);
        assert_eq!(fresh, init_state(800.0, 600.0));
        assert_eq!(fresh.status, GameStatus::Playing);
    }
}
