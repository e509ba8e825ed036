use crate::shared::DisplayState;
use super::grid::draw_step_grid;
use super::mode::TuiState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Sparkline};
use ratatui::Frame;

const HELP: &str = "space play  b rec  enter step  -/= tempo  1-4 q-i audition  0 clear  p generate  esc quit";

pub fn render(
    frame: &mut Frame,
    area: Rect,
    state: &DisplayState,
    ts: &TuiState,
    spectrum: &[u8],
    blink_on: bool,
) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(8),    // step grid
            Constraint::Length(8), // spectrum
            Constraint::Length(1), // status
            Constraint::Length(1), // help
        ])
        .split(area);

    draw_header(frame, sections[0], state, blink_on);
    let grid_block = Block::default().borders(Borders::ALL).title(state.pattern_name.as_str());
    let grid_area = grid_block.inner(sections[1]);
    frame.render_widget(grid_block, sections[1]);
    draw_step_grid(frame, grid_area, &state.steps, state.playing_step, (ts.cursor_row, ts.cursor_step));
    draw_spectrum(frame, sections[2], spectrum);
    frame.render_widget(Paragraph::new(state.status.as_str()), sections[3]);
    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        sections[4],
    );
}

fn draw_header(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let transport = if state.playing {
        Span::styled("PLAYING", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("STOPPED", Style::default().fg(Color::Gray))
    };
    let rec = if state.recording && blink_on {
        Span::styled(" REC ", Style::default().fg(Color::White).bg(Color::Red))
    } else {
        Span::raw("     ")
    };
    let step = match state.playing_step {
        Some(s) => format!("{:>2}", s + 1),
        None => String::from("--"),
    };
    let line = Line::from(vec![
        transport,
        Span::raw(format!("  BPM {:>3.0}  step {step}  ", state.tempo)),
        rec,
    ]);
    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("beatbox")),
        area,
    );
}

// only the lower half of the bins carries anything interesting at 44.1k
fn draw_spectrum(frame: &mut Frame, area: Rect, spectrum: &[u8]) {
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let shown = &spectrum[..spectrum.len() / 2];
    let bars = downsample(shown, inner_width);
    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title("spectrum"))
        .max(255)
        .data(bars)
        .style(Style::default().fg(Color::Magenta));
    frame.render_widget(sparkline, area);
}

// peak of each group, so short transients stay visible
fn downsample(bins: &[u8], width: usize) -> Vec<u64> {
    if bins.is_empty() {
        return vec![];
    }
    let chunk = bins.len().div_ceil(width).max(1);
    bins.chunks(chunk)
        .map(|c| c.iter().copied().max().unwrap_or(0) as u64)
        .collect()
}
