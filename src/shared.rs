// The control-side vocabulary shared by the sequencer, the middle layer and the TUI.
//
// Keys (see tui/input.rs):
//   Left / Right / Up / Down   //  move the edit cursor over the 4 x 16 grid
//   Enter                      //  ToggleStep under the cursor
//   Space                      //  PlayPress
//   b                          //  RecordPress
//   - / =                      //  AdjustTempo(-1 / +1)
//   _ / +                      //  AdjustTempo(-10 / +10)
//   1 2 3 4                    //  Audition(kick, snare, hihat, synth)
//   q w e r t y u i            //  Audition(synth, major scale 0..=12 semitones)
//   0                          //  ClearPattern
//   p                          //  GeneratePattern (from the configured prompt)
//   Esc                        //  Quit
//
// The TUI never touches engine state; it renders the DisplayState snapshot
// that `Middle::display_state` hands it every frame.

use serde::{Deserialize, Serialize};

pub const NUM_STEPS: usize = 16;
pub const NUM_INSTRUMENTS: usize = 4;

pub const LOOKAHEAD_SECS: f64 = 0.1;
pub const MIN_TEMPO: f64 = 60.0;
pub const MAX_TEMPO: f64 = 200.0;
pub const DEFAULT_TEMPO: f64 = 128.0;
pub const GENERATED_TEMPO_FALLBACK: f64 = 120.0;
pub const GENERATED_NAME_FALLBACK: &str = "AI Groove";

pub const DEFAULT_MASTER_GAIN: f32 = 0.5;
pub const CAPTURE_BLOCK_SIZE: usize = 4096;

/// The closed set of voices the synthesizer knows how to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Instrument {
    Kick,
    Snare,
    Hihat,
    Synth,
}

impl Instrument {
    pub const ALL: [Instrument; NUM_INSTRUMENTS] = [
        Instrument::Kick,
        Instrument::Snare,
        Instrument::Hihat,
        Instrument::Synth,
    ];

    pub fn index(self) -> usize {
        match self {
            Instrument::Kick => 0,
            Instrument::Snare => 1,
            Instrument::Hihat => 2,
            Instrument::Synth => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Instrument::Kick => "KICK",
            Instrument::Snare => "SNARE",
            Instrument::Hihat => "HIHAT",
            Instrument::Synth => "SYNTH",
        }
    }
}

/// Clamp any tempo request into the playable range. NaN falls back to the default.
pub fn clamp_tempo(bpm: f64) -> f64 {
    if bpm.is_nan() {
        return DEFAULT_TEMPO;
    }
    bpm.clamp(MIN_TEMPO, MAX_TEMPO)
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PlayPress,
    RecordPress,
    ToggleStep(Instrument, u8),
    ClearPattern,
    AdjustTempo(f64),
    Audition(Instrument, i32), // instrument + pitch offset in semitones
    GeneratePattern,
    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub steps: [[bool; NUM_STEPS]; NUM_INSTRUMENTS],
    pub playing_step: Option<u8>, // the step most recently scheduled, None when stopped
    pub playing: bool,
    pub recording: bool,
    pub tempo: f64,
    pub pattern_name: String,
    pub status: String, // last notice for the status line (saved clip, generator failure, ...)
}
