use crate::shared::{Instrument, NUM_INSTRUMENTS, NUM_STEPS};

pub type Track = [bool; NUM_STEPS];

// One track per instrument, indexed by `Instrument::index`, so every
// instrument always has exactly sixteen steps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    tracks: [Track; NUM_INSTRUMENTS],
}

impl Pattern {
    pub fn track(&self, instrument: Instrument) -> &Track {
        &self.tracks[instrument.index()]
    }

    pub fn set_track(&mut self, instrument: Instrument, track: Track) {
        self.tracks[instrument.index()] = track;
    }

    pub fn is_active(&self, instrument: Instrument, step: usize) -> bool {
        self.tracks[instrument.index()][step]
    }

    /// Flip one step and return its new state.
    pub fn toggle(&mut self, instrument: Instrument, step: usize) -> bool {
        let cell = &mut self.tracks[instrument.index()][step];
        *cell = !*cell;
        *cell
    }

    pub fn clear(&mut self) {
        self.tracks = [[false; NUM_STEPS]; NUM_INSTRUMENTS];
    }

    /// Instruments that fire on `step`, in the fixed instrument order.
    pub fn active_at(&self, step: usize) -> impl Iterator<Item = Instrument> + '_ {
        Instrument::ALL
            .into_iter()
            .filter(move |inst| self.is_active(*inst, step))
    }

    pub fn grid(&self) -> [[bool; NUM_STEPS]; NUM_INSTRUMENTS] {
        self.tracks
    }
}

/// Pad with `false` / truncate to exactly sixteen steps. `None` entries
/// (nulls in generated input) count as inactive.
pub fn sanitize_track(raw: &[Option<bool>]) -> Track {
    std::array::from_fn(|i| raw.get(i).copied().flatten().unwrap_or(false))
}
