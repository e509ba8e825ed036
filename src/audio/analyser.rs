//! Frequency-domain view of the live mix.
//!
//! The audio thread pushes post-gain samples into a ring buffer; the UI pulls
//! from it once per animation frame and gets byte magnitudes per FFT bin.

use std::sync::Arc;

use ringbuf::HeapCons;
use ringbuf::traits::{Consumer, Observer};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

pub const FFT_SIZE: usize = 2048;

/// Ring capacity between audio and UI thread; enough for a few frames of slack.
pub const TAP_CAPACITY: usize = FFT_SIZE * 8;

const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;
const SMOOTHING: f32 = 0.8;

pub struct Analyser {
    consumer: HeapCons<f32>,
    window: Vec<f32>, // circular, newest sample at write_pos - 1
    write_pos: usize,
    fft: Arc<dyn Fft<f32>>,
    hann: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
    drain: Vec<f32>,
}

impl Analyser {
    pub fn new(consumer: HeapCons<f32>) -> Self {
        let fft = FftPlanner::<f32>::new().plan_fft_forward(FFT_SIZE);
        let hann = (0..FFT_SIZE)
            .map(|n| 0.5 - 0.5 * (std::f32::consts::TAU * n as f32 / FFT_SIZE as f32).cos())
            .collect();
        Self {
            consumer,
            window: vec![0.0; FFT_SIZE],
            write_pos: 0,
            fft,
            hann,
            buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            smoothed: vec![0.0; FFT_SIZE / 2],
            bytes: vec![0; FFT_SIZE / 2],
            drain: vec![0.0; 1024],
        }
    }

    pub fn bin_count(&self) -> usize {
        FFT_SIZE / 2
    }

    /// Pull whatever the audio thread produced since the last call and return
    /// the magnitude of each bin mapped onto 0..=255 (-100 dB .. -30 dB).
    pub fn frequency_data(&mut self) -> &[u8] {
        self.pull();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = self.window[(self.write_pos + i) % FFT_SIZE];
            *slot = Complex::new(sample * self.hann[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let scale = 1.0 / FFT_SIZE as f32;
        for (bin, (smoothed, byte)) in self.smoothed.iter_mut().zip(self.bytes.iter_mut()).enumerate() {
            let magnitude = self.buffer[bin].norm() * scale;
            *smoothed = SMOOTHING * *smoothed + (1.0 - SMOOTHING) * magnitude;
            let db = 20.0 * smoothed.max(1e-12).log10();
            let normalized = (db - MIN_DB) / (MAX_DB - MIN_DB);
            *byte = (normalized.clamp(0.0, 1.0) * 255.0) as u8;
        }
        &self.bytes
    }

    fn pull(&mut self) {
        while self.consumer.occupied_len() > 0 {
            let read = self.consumer.pop_slice(&mut self.drain);
            if read == 0 {
                break;
            }
            for &s in &self.drain[..read] {
                self.window[self.write_pos] = s;
                self.write_pos = (self.write_pos + 1) % FFT_SIZE;
            }
        }
    }
}
