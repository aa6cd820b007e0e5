use std::cell::Cell;
use std::time::Instant;

/// Milliseconds since the Unix epoch (or since an arbitrary origin for test clocks).
pub type Timestamp = u64;

/// Source of the current time handed to the core on every call.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Monotonic clock reporting epoch milliseconds.
///
/// The wall time is read once at construction; after that only the elapsed
/// `Instant` counts, so a wall clock step cannot stall or rewind the game.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Timestamp,
    anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: chrono::Utc::now().timestamp_millis().max(0) as Timestamp,
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        self.origin + self.anchor.elapsed().as_millis() as Timestamp
    }
}

/// Hand-driven clock for tests and headless runs
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, at: Timestamp) {
        self.now.set(at);
    }

    /// Moves the clock forward and returns the new time.
    pub fn advance(&self, ms: u64) -> Timestamp {
        let next = self.now.get() + ms;
        self.now.set(next);
        next
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(5_000);
        assert_eq!(clock.now(), 5_000);
        assert_eq!(clock.advance(250), 5_250);
        assert_eq!(clock.now(), 5_250);
        clock.set(0);
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn system_clock_never_goes_back() {
        let clock = SystemClock::new();
        let mut last = clock.now();
        assert!(last > 0);
        for _ in 0..1_000 {
            let next = clock.now();
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn system_clock_tracks_elapsed_time() {
        let clock = SystemClock::new();
        let a = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(clock.now() >= a + 20);
    }
}
