use crate::shared::{Instrument, NUM_INSTRUMENTS, NUM_STEPS};

// state local to the tui: where the edit cursor sits on the grid.
// everything else is read from DisplayState each frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TuiState {
    pub cursor_row: usize, // instrument index
    pub cursor_step: usize,
}

impl TuiState {
    pub fn instrument(&self) -> Instrument {
        Instrument::ALL[self.cursor_row]
    }

    // the cursor wraps around both axes
    pub fn move_by(&mut self, rows: isize, steps: isize) {
        self.cursor_row = (self.cursor_row as isize + rows).rem_euclid(NUM_INSTRUMENTS as isize) as usize;
        self.cursor_step = (self.cursor_step as isize + steps).rem_euclid(NUM_STEPS as isize) as usize;
    }
}
