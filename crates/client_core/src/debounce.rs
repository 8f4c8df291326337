//! Trailing-edge debouncing driven by an injectable clock.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Collapses bursts of values into the last one, released once `delay` has
/// passed since the most recent push. Superseded values are dropped.
pub struct Debouncer<T> {
    delay: Duration,
    clock: Arc<dyn Clock>,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            delay,
            clock,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending value and restarts the window.
    pub fn push(&mut self, value: T) {
        self.pending = Some((value, self.clock.now()));
    }

    /// The pending value, if its window has elapsed.
    pub fn poll(&mut self) -> Option<T> {
        let ready = match &self.pending {
            Some((_, pushed_at)) => self.clock.now().saturating_duration_since(*pushed_at) >= self.delay,
            None => false,
        };
        if ready {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    /// Time left before [`poll`](Self::poll) would yield, if anything is pending.
    pub fn remaining(&self) -> Option<Duration> {
        self.pending.as_ref().map(|(_, pushed_at)| {
            self.delay
                .saturating_sub(self.clock.now().saturating_duration_since(*pushed_at))
        })
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending value without waiting for the window.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
