//! Recurring timers for the cooperative game loop.
//!
//! A [`RecurringTask`] never runs anything by itself. The owner asks it when
//! it is due, performs the work at that instant and then calls
//! [`RecurringTask::reschedule`], which re-arms it with a freshly sampled
//! delay counted from the instant it fired. A cancelled task has no due time
//! and therefore can never fire again until it is re-armed.

use rand::Rng;

use crate::clock::Timestamp;

/// How long to wait between two runs of a task
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    /// Fixed period in milliseconds.
    Every(u64),
    /// Uniformly sampled delay in `[min, max]` milliseconds, drawn again for every run.
    Between(u64, u64),
}

impl Cadence {
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        match *self {
            Cadence::Every(period) => period,
            Cadence::Between(min, max) if min >= max => min,
            Cadence::Between(min, max) => rng.gen_range(min..=max),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecurringTask {
    cadence: Cadence,
    due_at: Option<Timestamp>,
}

impl RecurringTask {
    pub fn new(cadence: Cadence) -> Self {
        Self {
            cadence,
            due_at: None,
        }
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Arms the task so its first run happens one delay after `now`.
    pub fn arm<R: Rng + ?Sized>(&mut self, now: Timestamp, rng: &mut R) {
        self.due_at = Some(now + self.cadence.next_delay(rng));
    }

    pub fn cancel(&mut self) {
        self.due_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.due_at.is_some()
    }

    pub fn due_at(&self) -> Option<Timestamp> {
        self.due_at
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        matches!(self.due_at, Some(due) if due <= now)
    }

    /// Re-arms the task one fresh delay after its last due time.
    /// Returns the instant that just fired, or `None` if the task was cancelled.
    pub fn reschedule<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Timestamp> {
        let fired = self.due_at?;
        // A zero-length delay would make the caller spin on the same instant.
        let delay = self.cadence.next_delay(rng).max(1);
        self.due_at = Some(fired + delay);
        Some(fired)
    }
}
