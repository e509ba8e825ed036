use crate::shared::{Instrument, NUM_INSTRUMENTS, NUM_STEPS};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

const LABEL_WIDTH: u16 = 7;

// one row per instrument, one cell per step. the playhead column is
// highlighted, the edit cursor is drawn inverted
pub fn draw_step_grid(
    frame: &mut Frame,
    area: Rect,
    steps: &[[bool; NUM_STEPS]; NUM_INSTRUMENTS],
    playing_step: Option<u8>,
    cursor: (usize, usize),
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, NUM_INSTRUMENTS as u32); NUM_INSTRUMENTS])
        .split(area);

    for (row_idx, row_area) in rows.iter().enumerate() {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(LABEL_WIDTH), Constraint::Min(0)])
            .split(*row_area);
        let label = Paragraph::new(Instrument::ALL[row_idx].label())
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(label, split[0]);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, NUM_STEPS as u32); NUM_STEPS])
            .split(split[1]);

        for (step, cell_area) in cols.iter().enumerate() {
            let on = steps[row_idx][step];
            let under_playhead = playing_step == Some(step as u8);
            let mut style = match (on, under_playhead) {
                (true, true) => Style::default().bg(Color::LightMagenta),
                (true, false) => Style::default().bg(Color::Magenta),
                (false, true) => Style::default().bg(Color::DarkGray),
                (false, false) if step % 4 == 0 => Style::default().bg(Color::Rgb(40, 40, 48)),
                (false, false) => Style::default().bg(Color::Rgb(24, 24, 28)),
            };
            if cursor == (row_idx, step) {
                style = style.fg(Color::White).bg(Color::Cyan);
            }
            frame.render_widget(Block::default().style(style), inset(*cell_area));
        }
    }
}

// leave a one column gap between cells
fn inset(area: Rect) -> Rect {
    Rect { width: area.width.saturating_sub(1), ..area }
}
