//! Second-order filters (RBJ cookbook biquads).

use std::f32::consts::TAU;

// 1 dB of resonance, the usual default for browser-style biquads.
pub const DEFAULT_Q: f32 = 1.122_018_5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    LowPass,
    HighPass,
}

#[derive(Clone, Debug)]
pub struct Biquad {
    mode: FilterMode,
    q: f32,
    cutoff: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    pub fn new(mode: FilterMode, cutoff: f32, q: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            mode,
            q,
            cutoff: f32::NAN,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        filter.set_cutoff(cutoff, sample_rate);
        filter
    }

    pub fn set_cutoff(&mut self, cutoff: f32, sample_rate: f32) {
        if cutoff == self.cutoff {
            return;
        }
        self.cutoff = cutoff;

        let freq = cutoff.clamp(1.0, sample_rate * 0.49);
        let w0 = TAU * freq / sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * self.q);
        let a0 = 1.0 + alpha;

        let (b0, b1, b2) = match self.mode {
            FilterMode::LowPass => ((1.0 - cos) * 0.5, 1.0 - cos, (1.0 - cos) * 0.5),
            FilterMode::HighPass => ((1.0 + cos) * 0.5, -(1.0 + cos), (1.0 + cos) * 0.5),
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = -2.0 * cos / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2 - self.a1 * self.y1 - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}
