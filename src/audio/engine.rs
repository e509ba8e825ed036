use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::audio_api::{AudioCommand, TriggerParams};

use super::clock::AudioClock;
use super::mixbus::MixBus;
use super::voice::Voice;

const MAX_VOICES: usize = 64; // hard cap so we wont malloc in audio callback
const MAX_PENDING: usize = 256; // look-ahead queue, a few steps worth of every instrument

/// Everything the audio callback owns. Commands come in, samples go out.
pub struct Engine {
    sample_rate: u32,
    clock: AudioClock,
    frame: u64,
    // ordered by start sample, ties keep arrival order
    pending: VecDeque<Voice>,
    voices: Vec<Voice>,
    bus: MixBus,
    rng: SmallRng,
}

impl Engine {
    pub fn new(clock: AudioClock, bus: MixBus) -> Self {
        Self {
            sample_rate: clock.sample_rate(),
            clock,
            frame: 0,
            pending: VecDeque::with_capacity(MAX_PENDING),
            voices: Vec::with_capacity(MAX_VOICES),
            bus,
            rng: SmallRng::seed_from_u64(0x5eed),
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Trigger(t) => self.schedule_voice(t),
            AudioCommand::StartCapture(tx) => self.bus.start_capture(tx),
            AudioCommand::StopCapture => self.bus.stop_capture(),
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }

    pub fn pending_voices(&self) -> usize {
        self.pending.len()
    }

    fn schedule_voice(&mut self, t: TriggerParams) {
        if self.pending.len() == MAX_PENDING {
            return; // queue is full, drop rather than allocate
        }
        let voice = Voice::new(t, self.sample_rate, self.rng.r#gen());
        let at = self
            .pending
            .iter()
            .position(|p| p.start_sample() > voice.start_sample())
            .unwrap_or(self.pending.len());
        self.pending.insert(at, voice);
    }

    fn start_due_voices(&mut self) {
        while self.pending.front().is_some_and(|v| v.start_sample() <= self.frame) {
            let Some(voice) = self.pending.pop_front() else { break };
            if self.voices.len() == MAX_VOICES {
                // steal the oldest slot
                self.voices.remove(0);
            }
            self.voices.push(voice);
        }
    }

    /// Render one mono sample per frame into `out`.
    pub fn render_mono(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            self.start_due_voices();
            let sum: f32 = self.voices.iter_mut().map(|v| v.next_sample()).sum();
            *sample = self.bus.process(sum);
            self.frame += 1;
        }
        self.voices.retain(|v| v.active);
        self.clock.publish(self.frame);
    }

    /// Render into an interleaved device buffer, same mix on every channel.
    pub fn render_block(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in data.chunks_mut(channels) {
            self.start_due_voices();
            let sum: f32 = self.voices.iter_mut().map(|v| v.next_sample()).sum();
            let out = self.bus.process(sum);
            frame.fill(out);
            self.frame += 1;
        }
        self.voices.retain(|v| v.active);
        self.clock.publish(self.frame);
    }
}
