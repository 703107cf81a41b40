//! Preloader counter shown before the game starts.
//!
//! Every Enter press bumps the counter and starts a chain of automatic
//! increments, each one scheduled a random 10–199 ms after the last. When the
//! counter reaches [`COUNTER_TARGET`] the counter is hidden, the preloader
//! turns active, and every pending increment is cancelled. Nothing here knows
//! about the game session.

use std::cell::Cell;
use std::rc::Rc;

use rand::Rng;

pub const COUNTER_TARGET: u32 = 100;
pub const MIN_DELAY_MS: u64 = 10;
pub const MAX_DELAY_MS: u64 = 200;

/// Shared flag that stops a scheduled increment from firing.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// An automatic increment waiting for its due time.
#[derive(Clone, Debug)]
pub struct ScheduledIncrement {
    pub due_ms: u64,
    pub token: CancelToken,
}

#[derive(Debug, Default)]
pub struct Preloader {
    counter: u32,
    active: bool,
    pending: Vec<ScheduledIncrement>,
}

impl Preloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn counter_text(&self) -> String {
        self.counter.to_string()
    }

    /// The counter is hidden once the target is reached.
    pub fn counter_visible(&self) -> bool {
        !self.active
    }

    /// `true` once the preloader has moved to its ready state.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Increments still waiting to fire.
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledIncrement> {
        self.pending.iter().filter(|t| !t.token.is_cancelled())
    }

    /// Enter key: counts up and starts a new auto-increment chain. Returns the
    /// token of the scheduled follow-up, if one was scheduled.
    pub fn press_enter(&mut self, now_ms: u64, rng: &mut impl Rng) -> Option<CancelToken> {
        if self.counter >= COUNTER_TARGET {
            return None;
        }
        self.increment(now_ms, rng)
    }

    /// Fire every increment due at `now_ms`; follow-ups land in `pending`.
    /// Returns how many fired.
    pub fn poll(&mut self, now_ms: u64, rng: &mut impl Rng) -> usize {
        let mut fired = 0;
        loop {
            self.pending.retain(|t| !t.token.is_cancelled());
            let due = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due_ms <= now_ms)
                .min_by_key(|(_, t)| t.due_ms)
                .map(|(i, _)| i);
            let Some(index) = due else {
                break;
            };
            let task = self.pending.remove(index);
            fired += 1;
            // Follow-ups are anchored to the due time so a slow poll catches up.
            self.increment(task.due_ms, rng);
        }
        fired
    }

    /// Cancel every outstanding increment.
    pub fn cancel_pending(&mut self) {
        for task in self.pending.drain(..) {
            task.token.cancel();
        }
    }

    fn increment(&mut self, now_ms: u64, rng: &mut impl Rng) -> Option<CancelToken> {
        if self.counter >= COUNTER_TARGET {
            return None;
        }
        self.counter += 1;

        if self.counter >= COUNTER_TARGET {
            self.active = true;
            self.cancel_pending();
            log::info!("preloader complete");
            return None;
        }

        let token = CancelToken::new();
        self.pending.push(ScheduledIncrement {
            due_ms: now_ms + rng.gen_range(MIN_DELAY_MS..MAX_DELAY_MS),
            token: token.clone(),
        });
        Some(token)
    }
}
