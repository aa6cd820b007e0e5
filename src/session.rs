//! The session controller: phase, countdown, score and the completion record.
//!
//! A session moves `waiting -> playing -> finished`, and `restart` brings it
//! back to `waiting`. Every operation takes the current time; pending timer
//! work up to that instant is applied first, so the order in which the front
//! end polls and forwards input cannot reorder what happened.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

use crate::clock::Timestamp;
use crate::completion::{CompletionRecord, CompletionSink};
use crate::config::{Settings, COUNTDOWN_INTERVAL_MS};
use crate::schedule::{Cadence, RecurringTask};
use crate::slot::{SlotId, SpawnSlot};
use crate::spawner::{SpawnEvent, SpawnScheduler};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Waiting,
    Playing,
    Finished,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub score: u32,
    pub time_remaining_secs: u32,
    pub started_at: Option<Timestamp>,
}

impl SessionState {
    fn fresh(settings: &Settings) -> Self {
        Self {
            phase: Phase::Waiting,
            score: 0,
            time_remaining_secs: settings.session_secs,
            started_at: None,
        }
    }

    /// True while playing with `threshold` seconds or less on the clock.
    pub fn is_hurry(&self, threshold: u32) -> bool {
        self.phase == Phase::Playing && self.time_remaining_secs <= threshold
    }
}

pub struct Session<R = StdRng> {
    settings: Settings,
    state: SessionState,
    spawner: SpawnScheduler,
    countdown: RecurringTask,
    rng: R,
    completion: Option<CompletionRecord>,
    sinks: Vec<Box<dyn CompletionSink>>,
}

impl Session<StdRng> {
    pub fn new(settings: Settings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    pub fn seeded(settings: Settings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Session<R> {
    pub fn with_rng(settings: Settings, rng: R) -> Self {
        Self {
            state: SessionState::fresh(&settings),
            spawner: SpawnScheduler::new(&settings),
            countdown: RecurringTask::new(Cadence::Every(COUNTDOWN_INTERVAL_MS)),
            settings,
            rng,
            completion: None,
            sinks: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn time_remaining_secs(&self) -> u32 {
        self.state.time_remaining_secs
    }

    pub fn is_hurry(&self) -> bool {
        self.state.is_hurry(self.settings.hurry_threshold_secs)
    }

    pub fn slots(&self) -> &[SpawnSlot] {
        self.spawner.slots()
    }

    pub fn spawner(&self) -> &SpawnScheduler {
        &self.spawner
    }

    /// Puts a mole in hole `id` for `duration_ms`, outside the random cadence.
    /// Only honoured while playing; pending timers up to `now` run first.
    pub fn force_activate(
        &mut self,
        id: SlotId,
        now: Timestamp,
        duration_ms: u64,
    ) -> Option<SpawnEvent> {
        if self.state.phase != Phase::Playing {
            tracing::trace!(slot = id, phase = %self.state.phase, "force activate ignored");
            return None;
        }

        self.advance(now);
        if self.state.phase != Phase::Playing {
            return None;
        }
        self.spawner.activate(id, now, duration_ms)
    }

    /// Record of the last finished session, until the next restart.
    pub fn completion(&self) -> Option<&CompletionRecord> {
        self.completion.as_ref()
    }

    /// Registers a listener for completion records.
    pub fn subscribe(&mut self, sink: Box<dyn CompletionSink>) {
        self.sinks.push(sink);
    }

    /// Begins play from `waiting`. Ignored in any other phase.
    pub fn start(&mut self, now: Timestamp) -> bool {
        if self.state.phase != Phase::Waiting {
            tracing::trace!(phase = %self.state.phase, "start ignored");
            return false;
        }

        self.state = SessionState {
            phase: Phase::Playing,
            score: 0,
            time_remaining_secs: self.settings.session_secs,
            started_at: Some(now),
        };
        self.completion = None;
        self.spawner.start(now, &mut self.rng);
        self.countdown.arm(now, &mut self.rng);
        tracing::info!(started_at = now, secs = self.settings.session_secs, "session started");
        true
    }

    /// Runs every timer that fell due up to `now`, oldest first.
    ///
    /// At equal due times the spawn scheduler runs before the countdown, so
    /// whatever it does at that instant lands before the end-of-time check.
    pub fn advance(&mut self, now: Timestamp) -> Vec<SpawnEvent> {
        self.run_timers(now, true)
    }

    /// With `countdown_inclusive` unset, a countdown tick due exactly at `now`
    /// is left pending so a strike at that instant lands first.
    fn run_timers(&mut self, now: Timestamp, countdown_inclusive: bool) -> Vec<SpawnEvent> {
        let mut events = Vec::new();

        while self.state.phase == Phase::Playing {
            let (spawn_due, tick_due) = (self.spawner.next_due(), self.countdown.due_at());
            let scheduler_first = match (spawn_due, tick_due) {
                (Some(s), Some(t)) => s <= t,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let due = if scheduler_first { spawn_due } else { tick_due };
            let blocked = match due {
                Some(at) if scheduler_first || countdown_inclusive => at > now,
                Some(at) => at >= now,
                None => true,
            };
            if blocked {
                break;
            }

            if scheduler_first {
                events.extend(self.spawner.run_next(now, &mut self.rng));
            } else if let Some(at) = self.countdown.reschedule(&mut self.rng) {
                self.tick(at);
            }
        }

        events
    }

    fn tick(&mut self, at: Timestamp) {
        self.state.time_remaining_secs = self.state.time_remaining_secs.saturating_sub(1);
        tracing::trace!(at, remaining = self.state.time_remaining_secs, "tick");
        if self.state.time_remaining_secs == 0 {
            self.finish(at);
        }
    }

    /// Forwards a player strike on hole `id`. Returns whether it scored.
    ///
    /// Strikes outside `playing`, on empty holes or on unknown holes are dropped.
    /// A strike at the very instant the clock runs out still counts.
    pub fn register_hit(&mut self, id: SlotId, now: Timestamp) -> bool {
        if self.state.phase != Phase::Playing {
            tracing::trace!(slot = id, phase = %self.state.phase, "late hit discarded");
            return false;
        }

        self.run_timers(now, false);
        if self.state.phase != Phase::Playing {
            tracing::trace!(slot = id, "hit landed after time ran out");
            return false;
        }

        let scored = match self.spawner.register_hit(id) {
            Some(SpawnEvent::Hit { points, .. }) => {
                self.state.score = self.state.score.saturating_add(points);
                tracing::debug!(slot = id, score = self.state.score, "scored");
                true
            }
            _ => false,
        };
        self.advance(now);
        scored
    }

    /// Ends a playing session right away. Returns whether this call ended it.
    pub fn force_end(&mut self, now: Timestamp) -> bool {
        if self.state.phase != Phase::Playing {
            tracing::trace!(phase = %self.state.phase, "force end ignored");
            return false;
        }

        self.advance(now);
        if self.state.phase != Phase::Playing {
            return false;
        }
        self.finish(now);
        true
    }

    /// Back to `waiting` with a clean slate. Ignored while playing.
    pub fn restart(&mut self) -> bool {
        if self.state.phase == Phase::Playing {
            tracing::trace!("restart ignored while playing");
            return false;
        }

        self.spawner.stop();
        self.countdown.cancel();
        self.state = SessionState::fresh(&self.settings);
        self.completion = None;
        tracing::info!("session reset");
        true
    }

    fn finish(&mut self, at: Timestamp) {
        self.state.phase = Phase::Finished;
        self.spawner.stop();
        self.countdown.cancel();

        let record =
            CompletionRecord::new(self.state.score, self.state.started_at, at, &self.settings);
        tracing::info!(
            score = record.score,
            secs = record.time_spent_seconds,
            accuracy = record.accuracy,
            "session finished"
        );

        for sink in &mut self.sinks {
            if let Err(err) = sink.deliver(&record) {
                tracing::warn!(%err, "completion sink failed");
            }
        }
        self.completion = Some(record);
    }
}

impl<R> fmt::Debug for Session<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("spawner", &self.spawner)
            .field("countdown", &self.countdown)
            .field("completion", &self.completion)
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::SinkError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session() -> Session {
        Session::seeded(Settings::default(), 7)
    }

    fn recording(session: &mut Session) -> Rc<RefCell<Vec<CompletionRecord>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink_seen = Rc::clone(&seen);
        session.subscribe(Box::new(
            move |r: &CompletionRecord| -> Result<(), SinkError> {
                sink_seen.borrow_mut().push(r.clone());
                Ok(())
            },
        ));
        seen
    }

    #[test]
    fn starts_waiting_with_full_clock() {
        let s = session();
        assert_eq!(s.phase(), Phase::Waiting);
        assert_eq!(s.score(), 0);
        assert_eq!(s.time_remaining_secs(), 30);
        assert_eq!(s.state().started_at, None);
        assert!(!s.spawner().is_running());
        assert!(s.completion().is_none());
    }

    #[test]
    fn start_enters_playing_and_runs_scheduler() {
        let mut s = session();
        assert!(s.start(1_000));
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.state().started_at, Some(1_000));
        assert!(s.spawner().is_running());
    }

    #[test]
    fn second_start_changes_nothing() {
        let mut s = session();
        s.start(0);
        s.force_activate(3, 0, 2_000);
        s.register_hit(3, 500);
        let before = s.state().clone();
        let due = s.spawner().next_due();

        assert!(!s.start(700));
        assert_eq!(s.state(), &before);
        assert_eq!(s.spawner().next_due(), due);
    }

    #[test]
    fn hit_scores_ten_and_clears_slot() {
        let mut s = session();
        s.start(0);
        s.force_activate(3, 0, 3_000);
        assert!(s.register_hit(3, 50));
        assert_eq!(s.score(), 10);
        assert!(!s.slots()[3].is_active());
    }

    #[test]
    fn hit_on_empty_hole_scores_nothing() {
        let mut s = session();
        s.start(0);
        assert!(!s.register_hit(4, 10));
        assert!(!s.register_hit(400, 10));
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn countdown_decrements_once_per_second() {
        let mut s = session();
        s.start(0);
        s.advance(999);
        assert_eq!(s.time_remaining_secs(), 30);
        s.advance(1_000);
        assert_eq!(s.time_remaining_secs(), 29);
        s.advance(5_500);
        assert_eq!(s.time_remaining_secs(), 25);
        assert!(!s.is_hurry());
        s.advance(20_000);
        assert!(s.is_hurry());
    }

    #[test]
    fn finishes_exactly_at_duration() {
        let mut s = session();
        let seen = recording(&mut s);
        s.start(10_000);
        s.advance(39_999);
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.time_remaining_secs(), 1);

        s.advance(40_000);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.time_remaining_secs(), 0);
        assert!(!s.spawner().is_running());
        assert_eq!(s.spawner().active_count(), 0);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].time_spent_seconds, 30);
    }

    #[test]
    fn one_big_jump_catches_up_and_finishes_on_time() {
        let mut s = session();
        let seen = recording(&mut s);
        s.start(0);
        s.advance(600_000);
        assert_eq!(s.phase(), Phase::Finished);
        let record = s.completion().unwrap();
        assert_eq!(record.time_spent_seconds, 30);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn force_end_stops_everything_and_emits_once() {
        let mut s = session();
        let seen = recording(&mut s);
        s.start(0);
        assert!(s.force_end(10_000));
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.completion().unwrap().time_spent_seconds, 10);
        assert_eq!(s.spawner().next_due(), None);

        assert!(!s.force_end(11_000));
        s.advance(100_000);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(s.spawner().active_count(), 0);
    }

    #[test]
    fn force_end_outside_play_is_ignored() {
        let mut s = session();
        assert!(!s.force_end(0));
        assert_eq!(s.phase(), Phase::Waiting);
    }

    #[test]
    fn late_hits_are_discarded() {
        let mut s = session();
        let seen = recording(&mut s);
        s.start(0);
        s.force_activate(0, 29_500, 3_000);
        // Time ran out at 30 s; the strike at 30.2 s arrives too late.
        assert!(!s.register_hit(0, 30_200));
        assert_eq!(s.score(), 0);
        assert_eq!(s.phase(), Phase::Finished);

        assert!(!s.register_hit(0, 30_300));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn restart_resets_to_waiting_only_when_not_playing() {
        let mut s = session();
        s.start(0);
        s.force_activate(1, 0, 2_000);
        s.register_hit(1, 10);
        assert!(!s.restart());
        assert_eq!(s.phase(), Phase::Playing);

        s.force_end(5_000);
        assert!(s.restart());
        assert_eq!(s.phase(), Phase::Waiting);
        assert_eq!(s.score(), 0);
        assert_eq!(s.time_remaining_secs(), 30);
        assert_eq!(s.state().started_at, None);
        assert!(s.completion().is_none());
    }

    #[test]
    fn start_from_finished_requires_restart() {
        let mut s = session();
        s.start(0);
        s.force_end(1_000);
        assert!(!s.start(2_000));
        assert_eq!(s.phase(), Phase::Finished);
        s.restart();
        assert!(s.start(3_000));
        assert_eq!(s.state().started_at, Some(3_000));
    }

    #[test]
    fn failing_sink_does_not_corrupt_state() {
        let mut s = session();
        s.subscribe(Box::new(|_: &CompletionRecord| -> Result<(), SinkError> {
            Err(SinkError::Disconnected)
        }));
        let seen = recording(&mut s);
        s.start(0);
        s.force_end(2_000);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.completion().unwrap().time_spent_seconds, 2);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn score_never_drops_and_stays_a_multiple_of_ten() {
        let mut s = session();
        s.start(0);
        let mut last = 0;
        for t in (0..30_000).step_by(37) {
            s.advance(t);
            let up: Vec<SlotId> = s
                .slots()
                .iter()
                .filter(|slot| slot.is_active())
                .map(|slot| slot.id)
                .collect();
            for id in up {
                s.register_hit(id, t);
            }
            assert!(s.score() >= last);
            assert_eq!(s.score() % 10, 0);
            last = s.score();
        }
        assert!(last > 0);
    }

    #[test]
    fn strike_on_the_final_instant_counts() {
        let mut s = session();
        let seen = recording(&mut s);
        s.start(0);
        s.advance(29_000);
        let id = s.slots().iter().find(|slot| !slot.is_active()).unwrap().id;
        assert!(s.force_activate(id, 29_000, 3_000).is_some());
        assert!(s.register_hit(id, 30_000));
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.score(), 10);
        assert_eq!(seen.borrow()[0].final_score, 10);
        assert_eq!(seen.borrow()[0].time_spent_seconds, 30);
    }

    #[test]
    fn force_activate_only_while_playing() {
        let mut s = session();
        assert_eq!(s.force_activate(3, 0, 2_000), None);

        s.start(0);
        s.force_end(1_000);
        assert_eq!(s.force_activate(3, 2_000, 3_000), None);
        assert_eq!(s.spawner().active_count(), 0);
        assert!(!s.spawner().is_running());
    }

    #[test]
    fn force_activate_after_time_ran_out_is_ignored() {
        let mut s = session();
        s.start(0);
        assert_eq!(s.force_activate(2, 30_000, 1_000), None);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.spawner().active_count(), 0);
    }

    #[test]
    fn huge_points_per_hit_saturates() {
        let settings = Settings {
            points_per_hit: u32::MAX,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
        let mut s = Session::seeded(settings, 7);
        s.start(0);
        s.force_activate(0, 0, 3_000);
        s.force_activate(1, 0, 3_000);
        assert!(s.register_hit(0, 10));
        assert!(s.register_hit(1, 20));
        assert_eq!(s.score(), u32::MAX);

        s.force_end(1_000);
        assert_eq!(s.completion().unwrap().final_score, u32::MAX);
    }

    #[test]
    fn phase_names() {
        assert_eq!(Phase::Waiting.to_string(), "waiting");
        assert_eq!(Phase::Finished.to_string(), "finished");
    }
}
