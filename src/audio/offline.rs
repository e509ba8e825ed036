use std::cell::RefCell;

use crate::audio_api::{AudioBackend, AudioCommand};

use super::analyser::Analyser;
use super::clock::AudioClock;
use super::engine::Engine;

/// Renders the engine on demand on the calling thread instead of from a device
/// callback. Commands are applied immediately; time only moves in `render`.
pub struct OfflineBackend {
    engine: RefCell<Engine>,
    clock: AudioClock,
}

impl OfflineBackend {
    pub fn new(sample_rate: u32, master_gain: f32) -> (Self, Analyser) {
        let (engine, clock, analyser) = super::build_engine(sample_rate, master_gain);
        let backend = Self {
            engine: RefCell::new(engine),
            clock,
        };
        (backend, analyser)
    }

    /// Advance the clock by `frames`, returning the mono mix.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.engine.borrow_mut().render_mono(&mut out);
        out
    }

    pub fn active_voices(&self) -> usize {
        self.engine.borrow().active_voices()
    }

    pub fn pending_voices(&self) -> usize {
        self.engine.borrow().pending_voices()
    }
}

impl AudioBackend for OfflineBackend {
    fn send(&self, cmd: AudioCommand) {
        self.engine.borrow_mut().handle_cmd(cmd);
    }

    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }
}
