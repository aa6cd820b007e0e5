use ratatui::{buffer::Buffer, layout::Rect};

use crate::{
    app::App,
    session::Phase,
    ui::{render_finished, render_playing, render_waiting},
};
use rand::Rng;

/// A UI Screen boundary: one per session phase
pub trait Screen<R> {
    fn render(&self, app: &App<R>, area: Rect, buf: &mut Buffer);
}

/// Title card with the rules
pub struct WaitingScreen;

impl<R: Rng> Screen<R> for WaitingScreen {
    fn render(&self, app: &App<R>, area: Rect, buf: &mut Buffer) {
        render_waiting(app, area, buf);
    }
}

/// HUD and board
pub struct PlayingScreen;

impl<R: Rng> Screen<R> for PlayingScreen {
    fn render(&self, app: &App<R>, area: Rect, buf: &mut Buffer) {
        render_playing(app, area, buf);
    }
}

pub struct FinishedScreen;

impl<R: Rng> Screen<R> for FinishedScreen {
    fn render(&self, app: &App<R>, area: Rect, buf: &mut Buffer) {
        render_finished(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current phase
pub fn current_screen<R: Rng>(phase: Phase) -> Box<dyn Screen<R>> {
    match phase {
        Phase::Waiting => Box::new(WaitingScreen),
        Phase::Playing => Box::new(PlayingScreen),
        Phase::Finished => Box::new(FinishedScreen),
    }
}
