pub mod screen;

use rand::Rng;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::{
    app::{key_for_slot, App},
    completion::CompletionRecord,
    ui::screen::{current_screen, Screen},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Mole drawn bottom-up: more rows show as it rises out of the hole.
const MOLE_ART: [&str; 3] = ["(\\_/)", "(o.o)", "(> <)"];
const HOLE_ART: &str = "~~~~~";

impl<R: Rng> Widget for &App<R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        current_screen::<R>(self.session.phase()).render(self, area, buf);
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn gold_bold() -> Style {
    bold().fg(Color::Yellow)
}

fn centered_block(area: Rect, height: u16) -> Rect {
    let top = area.height.saturating_sub(height) / 2;
    Rect {
        x: area.x,
        y: area.y + top,
        width: area.width,
        height: height.min(area.height),
    }
}

pub(crate) fn render_waiting<R: Rng>(app: &App<R>, area: Rect, buf: &mut Buffer) {
    let settings = app.session.settings();
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let lines = vec![
        Line::from(Span::styled("Whack-a-Mole", gold_bold())),
        Line::default(),
        Line::from("Hit the moles as they pop up from their holes!"),
        Line::from(format!(
            "You have {} seconds to get the highest score possible.",
            settings.session_secs
        )),
        Line::from(format!(
            "Each mole is worth {} points.",
            settings.points_per_hit
        )),
        Line::default(),
        Line::from(Span::styled("(enter) start / (q)uit", italic_style)),
    ];

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(centered_block(area, height), buf);
}

pub(crate) fn render_playing<R: Rng>(app: &App<R>, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let hurry = session.is_hurry();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(1), // score and time
                Constraint::Length(1), // hurry warning
                Constraint::Min(3),    // board
                Constraint::Length(1), // legend
            ]
            .as_ref(),
        )
        .split(area);

    let time_style = if hurry {
        bold().fg(Color::Red)
    } else {
        gold_bold()
    };

    Paragraph::new(Line::from(vec![
        Span::styled("Score: ", bold()),
        Span::styled(session.score().to_string(), gold_bold()),
    ]))
    .alignment(Alignment::Left)
    .render(chunks[0], buf);

    Paragraph::new(Line::from(vec![
        Span::styled("Time: ", bold()),
        Span::styled(format!("{}s", session.time_remaining_secs()), time_style),
    ]))
    .alignment(Alignment::Right)
    .render(chunks[0], buf);

    if hurry {
        Paragraph::new(Span::styled(
            "Hurry up!",
            bold()
                .fg(Color::Red)
                .add_modifier(Modifier::SLOW_BLINK),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    }

    render_board(app, chunks[2], buf);

    Paragraph::new(Span::styled(
        "(1-9) whack / (esc) end",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[3], buf);
}

fn render_board<R: Rng>(app: &App<R>, area: Rect, buf: &mut Buffer) {
    let size = app.session.settings().grid_size.max(1);
    let share = |n: usize| vec![Constraint::Ratio(1, n as u32); n];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(share(size))
        .split(area);

    for (id, slot) in app.session.slots().iter().enumerate() {
        let (row, col) = (id / size, id % size);
        let Some(row_area) = rows.get(row) else {
            continue;
        };
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(share(size))
            .split(*row_area);
        let cell = cells[col];

        let title = key_for_slot(id).map(|k| format!(" {k} ")).unwrap_or_default();
        let border_style = if slot.is_active() {
            Style::default().fg(Color::Green)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        let block = Block::bordered().title(title).border_style(border_style);
        let inner = block.inner(cell);
        block.render(cell, buf);

        let lift = app.lifts.get(id).copied().unwrap_or(0.0);
        Paragraph::new(hole_lines(lift, inner.height))
            .alignment(Alignment::Center)
            .render(inner, buf);
    }
}

/// Lines for one hole, bottom aligned, with as much mole showing as `lift` allows.
fn hole_lines(lift: f64, height: u16) -> Vec<Line<'static>> {
    let shown = (lift.clamp(0.0, 1.0) * MOLE_ART.len() as f64).round() as usize;
    let mole_style = Style::default().fg(Color::Rgb(139, 69, 19)).add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = MOLE_ART[MOLE_ART.len() - shown..]
        .iter()
        .map(|row| Line::from(Span::styled(*row, mole_style)))
        .collect();
    lines.push(Line::from(Span::styled(
        HOLE_ART,
        Style::default().fg(Color::DarkGray),
    )));

    let pad = (height as usize).saturating_sub(lines.len());
    let mut padded = vec![Line::default(); pad];
    padded.extend(lines);
    padded
}

pub(crate) fn render_finished<R: Rng>(app: &App<R>, area: Rect, buf: &mut Buffer) {
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let score = app.session.score();

    let mut lines = vec![
        Line::from(Span::styled("Game Over!", gold_bold())),
        Line::default(),
        Line::from(Span::styled(format!("Final Score: {score}"), gold_bold())),
    ];
    if let Some(record) = app.session.completion() {
        lines.push(Line::from(record.rating().to_string()));
        lines.push(Line::from(Span::styled(summary(record), bold())));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("(r) play again / (q)uit", italic_style)));

    let height = lines.len() as u16;
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(centered_block(area, height), buf);
}

fn summary(record: &CompletionRecord) -> String {
    format!(
        "{}% acc   {}s   max {}",
        (record.accuracy * 100.0).round(),
        record.time_spent_seconds,
        record.max_score
    )
}
