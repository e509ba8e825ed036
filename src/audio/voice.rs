use crate::audio_api::TriggerParams;
use crate::shared::Instrument;

use super::envelope::ExpRamp;
use super::filter::{Biquad, DEFAULT_Q, FilterMode};
use super::oscillator::{Oscillator, WhiteNoise, Waveform};

// Exponential ramps head toward this instead of zero.
pub const RAMP_FLOOR: f32 = 0.01;

const SYNTH_BASE_FREQ: f32 = 110.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Source {
    Tone(Waveform),
    Noise,
}

/// A start value and the value an exponential ramp reaches after `ramp_secs`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sweep {
    pub from: f32,
    pub to: f32,
    pub ramp_secs: f32,
}

impl Sweep {
    fn fixed(value: f32) -> Self {
        Self { from: value, to: value, ramp_secs: 0.0 }
    }

    fn to_ramp(self, sample_rate: f32) -> ExpRamp {
        if self.from == self.to || self.ramp_secs <= 0.0 {
            ExpRamp::constant(self.from)
        } else {
            ExpRamp::new(self.from, self.to, self.ramp_secs, sample_rate)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterSpec {
    pub mode: FilterMode,
    pub cutoff: Sweep,
}

/// Everything needed to build one voice: the fixed per-instrument sound design.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recipe {
    pub source: Source,
    pub duration_secs: f32,
    pub frequency: Sweep,
    pub gain: Sweep,
    pub filter: Option<FilterSpec>,
}

impl Recipe {
    pub fn for_instrument(instrument: Instrument, pitch_offset: f32) -> Self {
        match instrument {
            Instrument::Kick => Recipe {
                source: Source::Tone(Waveform::Sine),
                duration_secs: 0.5,
                frequency: Sweep { from: 150.0, to: RAMP_FLOOR, ramp_secs: 0.5 },
                gain: Sweep { from: 1.0, to: RAMP_FLOOR, ramp_secs: 0.5 },
                filter: None,
            },
            // the noise burst is shorter than its gain ramp, so the tail is cut at 0.1s
            Instrument::Snare => Recipe {
                source: Source::Noise,
                duration_secs: 0.1,
                frequency: Sweep::fixed(0.0),
                gain: Sweep { from: 1.0, to: RAMP_FLOOR, ramp_secs: 0.2 },
                filter: Some(FilterSpec {
                    mode: FilterMode::HighPass,
                    cutoff: Sweep::fixed(1000.0),
                }),
            },
            Instrument::Hihat => Recipe {
                source: Source::Tone(Waveform::Square),
                duration_secs: 0.05,
                frequency: Sweep::fixed(10_000.0),
                gain: Sweep { from: 0.3, to: RAMP_FLOOR, ramp_secs: 0.05 },
                filter: None,
            },
            Instrument::Synth => {
                let freq = synth_frequency(pitch_offset);
                Recipe {
                    source: Source::Tone(Waveform::Sawtooth),
                    duration_secs: 0.4,
                    frequency: Sweep { from: freq, to: freq * 1.5, ramp_secs: 0.2 },
                    gain: Sweep { from: 0.2, to: RAMP_FLOOR, ramp_secs: 0.4 },
                    filter: Some(FilterSpec {
                        mode: FilterMode::LowPass,
                        cutoff: Sweep { from: 2000.0, to: 100.0, ramp_secs: 0.4 },
                    }),
                }
            }
        }
    }
}

pub fn synth_frequency(pitch_offset: f32) -> f32 {
    SYNTH_BASE_FREQ * 2.0_f32.powf(pitch_offset / 12.0)
}

#[derive(Clone, Debug)]
enum Generator {
    Tone(Oscillator),
    Noise(WhiteNoise),
}

#[derive(Clone, Debug)]
struct VoiceFilter {
    biquad: Biquad,
    cutoff: ExpRamp,
}

/// One self-terminating sound. It renders silence and flags itself inactive
/// once its fixed duration has elapsed.
#[derive(Clone, Debug)]
pub struct Voice {
    pub instrument: Instrument,
    start_sample: u64,
    length: u32,
    elapsed: u32,
    sample_rate: f32,
    generator: Generator,
    frequency: ExpRamp,
    gain: ExpRamp,
    filter: Option<VoiceFilter>,
    pub active: bool,
}

impl Voice {
    pub fn new(params: TriggerParams, sample_rate: u32, seed: u64) -> Self {
        let sr = sample_rate as f32;
        let recipe = Recipe::for_instrument(params.instrument, params.pitch_offset);

        let generator = match recipe.source {
            Source::Tone(waveform) => Generator::Tone(Oscillator::new(waveform)),
            Source::Noise => Generator::Noise(WhiteNoise::new(seed)),
        };
        let filter = recipe.filter.map(|spec| {
            let cutoff = spec.cutoff.to_ramp(sr);
            VoiceFilter {
                biquad: Biquad::new(spec.mode, cutoff.value(), DEFAULT_Q, sr),
                cutoff,
            }
        });

        // a start time in the past means "as soon as possible"
        let start_sample = (params.start_time.max(0.0) * sample_rate as f64).round() as u64;

        Self {
            instrument: params.instrument,
            start_sample,
            length: (recipe.duration_secs * sr).round() as u32,
            elapsed: 0,
            sample_rate: sr,
            generator,
            frequency: recipe.frequency.to_ramp(sr),
            gain: recipe.gain.to_ramp(sr),
            filter,
            active: true,
        }
    }

    pub fn start_sample(&self) -> u64 {
        self.start_sample
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn next_sample(&mut self) -> f32 {
        if !self.active {
            return 0.0;
        }
        if self.elapsed >= self.length {
            self.active = false;
            return 0.0;
        }

        let freq = self.frequency.next();
        let raw = match &mut self.generator {
            Generator::Tone(osc) => osc.next(freq, self.sample_rate),
            Generator::Noise(noise) => noise.next(),
        };
        let shaped = match &mut self.filter {
            Some(f) => {
                let cutoff = f.cutoff.next();
                f.biquad.set_cutoff(cutoff, self.sample_rate);
                f.biquad.process(raw)
            }
            None => raw,
        };

        self.elapsed += 1;
        shaped * self.gain.next()
    }
}
