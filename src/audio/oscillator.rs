use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
}

/// Naive phase-accumulator oscillator. Phase lives in [0, 1).
#[derive(Clone, Debug)]
pub struct Oscillator {
    waveform: Waveform,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn next(&mut self, freq: f32, sample_rate: f32) -> f32 {
        let out = match self.waveform {
            Waveform::Sine => (std::f32::consts::TAU * self.phase).sin(),
            Waveform::Square => {
                if self.phase < 0.5 { 1.0 } else { -1.0 }
            }
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
        };
        self.phase += freq / sample_rate;
        self.phase -= self.phase.floor(); // wrap, also copes with freq > sample_rate
        out
    }
}

// Uniform white noise in [-1, 1). Each voice gets its own generator so the
// render loop never has to share one.
#[derive(Clone, Debug)]
pub struct WhiteNoise {
    rng: SmallRng,
}

impl WhiteNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn next(&mut self) -> f32 {
        self.rng.gen_range(-1.0..1.0)
    }
}
