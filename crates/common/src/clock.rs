use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// In-world time, in seconds.
pub type GameTime = u64;

/// Source of "now" for scheduling and expiry comparisons.
///
/// Implementations must be monotonically non-decreasing.
pub trait GameClock: Send + Sync {
    fn now(&self) -> GameTime;
}

/// Game clock driven by the host's monotonic clock.
#[derive(Debug, Clone)]
pub struct SystemClock {
    base: GameTime,
    started: Instant,
}

impl SystemClock {
    /// Start counting from `base` seconds (e.g. the value saved at last shutdown).
    pub fn starting_at(base: GameTime) -> Self {
        Self {
            base,
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::starting_at(0)
    }
}

impl GameClock for SystemClock {
    fn now(&self) -> GameTime {
        self.base + self.started.elapsed().as_secs()
    }
}

/// Externally driven clock for simulations and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: GameTime) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Move the clock forward. Never moves it backwards.
    pub fn advance(&self, secs: GameTime) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Set the clock, ignoring values earlier than the current time.
    pub fn set(&self, now: GameTime) {
        self.now.fetch_max(now, Ordering::SeqCst);
    }
}

impl GameClock for ManualClock {
    fn now(&self) -> GameTime {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_never_goes_backwards() {
        let clock = ManualClock::new(100);
        clock.set(50);
        assert_eq!(clock.now(), 100);
        clock.advance(600);
        assert_eq!(clock.now(), 700);
        clock.set(900);
        assert_eq!(clock.now(), 900);
    }

    #[test]
    fn system_clock_starts_at_base() {
        let clock = SystemClock::starting_at(1_000);
        assert!(clock.now() >= 1_000);
    }
}
