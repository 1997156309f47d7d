//! Clock abstraction
//!
//! Trials measure elapsed time on a monotonic clock and stamp records with a
//! wall clock. Both come from a [`Clock`] so tests can drive time by hand.

use chrono::{Local, NaiveDateTime};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Monotonic instant used for elapsed-time measurement and cache ages.
    fn now(&self) -> Instant;

    /// Local wall-clock time used for record timestamps.
    fn wall(&self) -> NaiveDateTime;
}

/// Real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Hand-driven clock for tests and simulations.
///
/// Monotonic time is `base + offset`; `rewind` saturates at `base`, which
/// lets tests reproduce a clock that appears to run backwards.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    state: Mutex<ManualState>,
}

#[derive(Debug)]
struct ManualState {
    offset: Duration,
    wall: NaiveDateTime,
}

impl ManualClock {
    /// Create a clock frozen at `wall`.
    #[must_use]
    pub fn new(wall: NaiveDateTime) -> Self {
        Self {
            base: Instant::now(),
            state: Mutex::new(ManualState {
                offset: Duration::ZERO,
                wall,
            }),
        }
    }

    /// Move both clocks forward.
    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        state.offset += by;
        state.wall += chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
    }

    /// Move the monotonic clock backwards (saturating). Wall time is untouched.
    pub fn rewind(&self, by: Duration) {
        let mut state = self.lock();
        state.offset = state.offset.saturating_sub(by);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        // A poisoned clock is still a valid clock.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.lock().offset
    }

    fn wall(&self) -> NaiveDateTime {
        self.lock().wall
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn wall(&self) -> NaiveDateTime {
        (**self).wall()
    }
}
