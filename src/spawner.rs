//! Decides which holes have a mole in them and for how long.
//!
//! Two independent recurring tasks drive the board while a session is live:
//! a slow, jittered activation task that pops a mole into a random empty
//! hole, and a fast fixed-rate sweep that retires moles whose time is up.
//! Hits come in from the player and are reported back as [`SpawnEvent::Hit`];
//! the scheduler never touches the score itself.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::clock::Timestamp;
use crate::config::Settings;
use crate::schedule::{Cadence, RecurringTask};
use crate::slot::{build_grid, SlotId, SpawnSlot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnEvent {
    Activated { slot: SlotId, until: Timestamp },
    Expired { slot: SlotId },
    Hit { slot: SlotId, points: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Job {
    Sweep,
    Activate,
}

#[derive(Clone, Debug)]
pub struct SpawnScheduler {
    slots: Vec<SpawnSlot>,
    activation: RecurringTask,
    sweep: RecurringTask,
    active_ms_min: u64,
    active_ms_max: u64,
    points_per_hit: u32,
}

impl SpawnScheduler {
    pub fn new(settings: &Settings) -> Self {
        Self {
            slots: build_grid(settings.grid_size),
            activation: RecurringTask::new(Cadence::Between(
                settings.spawn_delay_ms_min,
                settings.spawn_delay_ms_max,
            )),
            sweep: RecurringTask::new(Cadence::Every(settings.sweep_interval_ms)),
            active_ms_min: settings.active_ms_min,
            active_ms_max: settings.active_ms_max,
            points_per_hit: settings.points_per_hit,
        }
    }

    pub fn slots(&self) -> &[SpawnSlot] {
        &self.slots
    }

    pub fn slot(&self, id: SlotId) -> Option<&SpawnSlot> {
        self.slots.get(id)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    pub fn is_running(&self) -> bool {
        self.activation.is_armed() || self.sweep.is_armed()
    }

    /// Starts both recurring tasks. Does nothing if already running.
    pub fn start<R: Rng + ?Sized>(&mut self, now: Timestamp, rng: &mut R) {
        if self.is_running() {
            tracing::trace!("spawn scheduler already running");
            return;
        }
        self.activation.arm(now, rng);
        self.sweep.arm(now, rng);
        tracing::debug!(
            first_spawn_at = ?self.activation.due_at(),
            "spawn scheduler started"
        );
    }

    /// Cancels every pending task and empties the board. Safe to call repeatedly.
    pub fn stop(&mut self) {
        let was_running = self.is_running();
        self.activation.cancel();
        self.sweep.cancel();
        for slot in &mut self.slots {
            slot.deactivate();
        }
        if was_running {
            tracing::debug!("spawn scheduler stopped");
        }
    }

    /// Earliest instant at which one of the recurring tasks wants to run.
    pub fn next_due(&self) -> Option<Timestamp> {
        match (self.sweep.due_at(), self.activation.due_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn next_job(&self, now: Timestamp) -> Option<Job> {
        let due = self.next_due().filter(|due| *due <= now)?;
        // Sweep wins ties so a hole freed at this instant can be reused.
        if self.sweep.due_at() == Some(due) {
            Some(Job::Sweep)
        } else {
            Some(Job::Activate)
        }
    }

    /// Runs the single earliest task that is due at or before `now`.
    /// The task runs at its own due time, not at `now`.
    pub fn run_next<R: Rng + ?Sized>(&mut self, now: Timestamp, rng: &mut R) -> Vec<SpawnEvent> {
        match self.next_job(now) {
            Some(Job::Sweep) => match self.sweep.reschedule(rng) {
                Some(at) => self.sweep_expired(at),
                None => Vec::new(),
            },
            Some(Job::Activate) => match self.activation.reschedule(rng) {
                Some(at) => self.attempt_activate(at, rng).into_iter().collect(),
                None => Vec::new(),
            },
            None => Vec::new(),
        }
    }

    /// Runs every task occurrence due at or before `now`, in time order.
    pub fn run_due<R: Rng + ?Sized>(&mut self, now: Timestamp, rng: &mut R) -> Vec<SpawnEvent> {
        let mut events = Vec::new();
        while self.next_job(now).is_some() {
            events.extend(self.run_next(now, rng));
        }
        events
    }

    /// Pops a mole into a uniformly chosen empty hole, up for a uniformly
    /// chosen duration. A full board is left untouched.
    pub fn attempt_activate<R: Rng + ?Sized>(
        &mut self,
        now: Timestamp,
        rng: &mut R,
    ) -> Option<SpawnEvent> {
        let idle: Vec<SlotId> = self
            .slots
            .iter()
            .filter(|s| !s.is_active())
            .map(|s| s.id)
            .collect();

        let Some(&id) = idle.choose(rng) else {
            tracing::trace!("board full, skipping spawn");
            return None;
        };

        let duration = if self.active_ms_min >= self.active_ms_max {
            self.active_ms_min
        } else {
            rng.gen_range(self.active_ms_min..=self.active_ms_max)
        };
        self.activate(id, now, duration)
    }

    /// Puts a mole in hole `id` for `duration_ms`. Unknown or occupied holes,
    /// and any call while the scheduler is stopped, are ignored.
    pub fn activate(&mut self, id: SlotId, now: Timestamp, duration_ms: u64) -> Option<SpawnEvent> {
        if !self.is_running() {
            return None;
        }
        let slot = self.slots.get_mut(id).filter(|s| !s.is_active())?;
        let until = now + duration_ms;
        slot.activate(until);
        tracing::debug!(slot = id, until, "mole up");
        Some(SpawnEvent::Activated { slot: id, until })
    }

    /// Retires every mole whose time ran out before `now`.
    pub fn sweep_expired(&mut self, now: Timestamp) -> Vec<SpawnEvent> {
        let mut events = Vec::new();
        for slot in self.slots.iter_mut().filter(|s| s.has_expired(now)) {
            slot.deactivate();
            tracing::trace!(slot = slot.id, now, "mole down");
            events.push(SpawnEvent::Expired { slot: slot.id });
        }
        events
    }

    /// Knocks the mole out of hole `id`. Empty or unknown holes are ignored.
    pub fn register_hit(&mut self, id: SlotId) -> Option<SpawnEvent> {
        let slot = self.slots.get_mut(id).filter(|s| s.is_active())?;
        slot.deactivate();
        tracing::debug!(slot = id, "mole hit");
        Some(SpawnEvent::Hit {
            slot: id,
            points: self.points_per_hit,
        })
    }
}
