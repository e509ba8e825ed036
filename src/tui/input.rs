use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crate::shared::{InputEvent, Instrument};
use super::mode::TuiState;

// semitone offsets for the synth audition row, one octave of a major scale
const SCALE_KEYS: [(char, i32); 8] = [
    ('q', 0), ('w', 2), ('e', 4), ('r', 5),
    ('t', 7), ('y', 9), ('u', 11), ('i', 12),
];

// poll for a key press, move the cursor locally, and resolve
// everything else into input events for the middle layer
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, ts));
    }
    Ok(vec![])
}

pub fn handle_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],
        KeyCode::Char('b') => vec![InputEvent::RecordPress],
        KeyCode::Char('0') => vec![InputEvent::ClearPattern],
        KeyCode::Char('p') => vec![InputEvent::GeneratePattern],

        // cursor
        KeyCode::Left => { ts.move_by(0, -1); vec![] }
        KeyCode::Right => { ts.move_by(0, 1); vec![] }
        KeyCode::Up => { ts.move_by(-1, 0); vec![] }
        KeyCode::Down => { ts.move_by(1, 0); vec![] }
        KeyCode::Enter => vec![InputEvent::ToggleStep(ts.instrument(), ts.cursor_step as u8)],

        // tempo, shifted = coarse
        KeyCode::Char('-') => vec![InputEvent::AdjustTempo(-1.0)],
        KeyCode::Char('=') => vec![InputEvent::AdjustTempo(1.0)],
        KeyCode::Char('_') => vec![InputEvent::AdjustTempo(-10.0)],
        KeyCode::Char('+') => vec![InputEvent::AdjustTempo(10.0)],

        KeyCode::Char(c @ '1'..='4') => {
            let idx = c as usize - '1' as usize;
            vec![InputEvent::Audition(Instrument::ALL[idx], 0)]
        }
        KeyCode::Char(c) => match SCALE_KEYS.iter().find(|(k, _)| *k == c) {
            Some((_, semitones)) => vec![InputEvent::Audition(Instrument::Synth, *semitones)],
            None => vec![],
        },

        _ => vec![],
    }
}
