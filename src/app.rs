use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::rngs::StdRng;
use rand::Rng;

use crate::clock::Timestamp;
use crate::session::{Phase, Session};
use crate::slot::SlotId;

/// Fraction of the remaining distance a mole travels per tick.
const LIFT_EASING: f64 = 0.1;

/// Key that strikes hole `id`, if any. Only the first nine holes get one.
pub fn key_for_slot(id: SlotId) -> Option<char> {
    char::from_digit(id as u32 + 1, 10).filter(|c| *c != '0')
}

pub fn slot_for_key(c: char) -> Option<SlotId> {
    match c.to_digit(10) {
        Some(d) if d >= 1 => Some(d as SlotId - 1),
        _ => None,
    }
}

/// Terminal front end state: the session plus per-hole animation
#[derive(Debug)]
pub struct App<R = StdRng> {
    pub session: Session<R>,
    pub lifts: Vec<f64>,
    pub should_quit: bool,
}

impl<R: Rng> App<R> {
    pub fn new(session: Session<R>) -> Self {
        let lifts = vec![0.0; session.slots().len()];
        Self {
            session,
            lifts,
            should_quit: false,
        }
    }

    pub fn on_tick(&mut self, now: Timestamp) {
        self.session.advance(now);
        self.update_lifts();
    }

    fn update_lifts(&mut self) {
        for (lift, slot) in self.lifts.iter_mut().zip(self.session.slots()) {
            let target = if slot.is_active() { 1.0 } else { 0.0 };
            *lift += (target - *lift) * LIFT_EASING;
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Timestamp) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            // End a live session first so its record still goes out.
            self.session.force_end(now);
            self.should_quit = true;
            return;
        }

        match (self.session.phase(), key.code) {
            (Phase::Waiting, KeyCode::Enter | KeyCode::Char(' ')) => {
                self.session.start(now);
            }
            (Phase::Playing, KeyCode::Char(c)) => {
                if let Some(id) = slot_for_key(c) {
                    self.session.register_hit(id, now);
                }
            }
            (Phase::Playing, KeyCode::Esc) => {
                self.session.force_end(now);
            }
            (Phase::Finished, KeyCode::Char('r')) => {
                self.session.restart();
                self.lifts.iter_mut().for_each(|l| *l = 0.0);
            }
            (Phase::Waiting | Phase::Finished, KeyCode::Char('q') | KeyCode::Esc) => {
                self.should_quit = true;
            }
            _ => {}
        }
    }
}
