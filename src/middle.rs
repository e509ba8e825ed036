// The middle layer: owns the pattern, the sequencer and the recorder, turns
// host input into audio commands, and is the only thing that talks to the
// audio backend. Built once in main and passed around by reference.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::audio_api::{AudioBackend, AudioCommand, TriggerParams};
use crate::capture::{CaptureError, EncodedClip, Recorder};
use crate::pipeline::{GenerateError, GeneratedPattern, Pattern, PatternGenerator, Sequencer};
use crate::shared::{DisplayState, InputEvent, Instrument};

type GenerationResult = Result<GeneratedPattern, GenerateError>;

pub struct Middle<B: AudioBackend> {
    backend: B,
    pub pattern: Pattern,
    pattern_name: String,
    sequencer: Sequencer,
    recorder: Recorder,
    generator: Option<Arc<dyn PatternGenerator>>,
    prompt: String,
    generation: Option<Receiver<GenerationResult>>,
    finished_clips: Vec<EncodedClip>,
    status: String,
}

impl<B: AudioBackend> Middle<B> {
    pub fn new(backend: B, tempo: f64, capture_stop_timeout: Duration) -> Self {
        Self {
            backend,
            pattern: Pattern::default(),
            pattern_name: String::from("Untitled"),
            sequencer: Sequencer::new(tempo),
            recorder: Recorder::new(capture_stop_timeout),
            generator: None,
            prompt: String::new(),
            generation: None,
            finished_clips: Vec::new(),
            status: String::new(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn PatternGenerator>, prompt: impl Into<String>) -> Self {
        self.generator = Some(generator);
        self.prompt = prompt.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_running()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_active()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PlayPress => {
                if self.is_playing() {
                    self.stop();
                } else {
                    self.start();
                }
            }
            InputEvent::RecordPress => {
                if self.is_recording() {
                    self.stop_capture();
                } else if let Err(e) = self.start_capture() {
                    self.status = e.to_string();
                }
            }
            InputEvent::ToggleStep(instrument, step) => {
                self.pattern.toggle(instrument, step as usize);
            }
            InputEvent::ClearPattern => self.pattern.clear(),
            InputEvent::AdjustTempo(delta) => {
                let tempo = self.sequencer.tempo() + delta;
                self.set_tempo(tempo);
            }
            InputEvent::Audition(instrument, semitones) => {
                self.audition(instrument, semitones as f32);
            }
            InputEvent::GeneratePattern => self.request_pattern(),
            InputEvent::Quit => self.stop(),
        }
    }

    pub fn start(&mut self) {
        let now = self.backend.now();
        self.sequencer.start(now);
    }

    /// Stopping playback also closes any open capture, before the transport
    /// stops, so the host never sees playback stopped with capture still on.
    pub fn stop(&mut self) {
        if self.recorder.is_active() {
            self.stop_capture();
        }
        self.sequencer.stop();
    }

    pub fn set_tempo(&mut self, bpm: f64) -> f64 {
        let applied = self.sequencer.set_tempo(bpm);
        tracing::debug!(requested = bpm, applied, "tempo changed");
        applied
    }

    pub fn start_capture(&mut self) -> Result<(), CaptureError> {
        self.recorder.start(&self.backend)?;
        self.status = String::from("recording");
        Ok(())
    }

    /// Close the capture (if any) and queue the resulting clip for the host.
    pub fn stop_capture(&mut self) -> Option<&EncodedClip> {
        match self.recorder.stop(&self.backend) {
            Ok(Some(clip)) => {
                self.status = format!("captured {:.1}s", clip.duration_secs());
                self.finished_clips.push(clip);
                self.finished_clips.last()
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("capture failed: {e}");
                self.status = e.to_string();
                None
            }
        }
    }

    pub fn take_finished_clips(&mut self) -> Vec<EncodedClip> {
        std::mem::take(&mut self.finished_clips)
    }

    pub fn audition(&mut self, instrument: Instrument, pitch_offset: f32) {
        self.backend.send(AudioCommand::Trigger(TriggerParams {
            instrument,
            start_time: self.backend.now(),
            pitch_offset,
        }));
    }

    /// Ask the generator for a new pattern on a worker thread. The answer is
    /// picked up by `tick`.
    pub fn request_pattern(&mut self) {
        if self.generation.is_some() {
            return; // one request at a time
        }
        let Some(generator) = self.generator.clone() else {
            self.status = String::from("no pattern generator configured");
            return;
        };
        let prompt = self.prompt.clone();
        let (tx, rx) = crossbeam_channel::bounded(1);
        std::thread::spawn(move || {
            let _ = tx.send(generator.generate(&prompt));
        });
        self.generation = Some(rx);
        self.status = String::from("generating...");
        tracing::info!(prompt = %self.prompt, "pattern requested");
    }

    /// Swap in a generated pattern wholesale and take its tempo.
    pub fn apply_generated(&mut self, generated: GeneratedPattern) {
        self.pattern = generated.pattern;
        let tempo = self.set_tempo(generated.tempo);
        self.status = format!("loaded \"{}\" at {tempo:.0} BPM", generated.name);
        tracing::info!(name = %generated.name, requested_tempo = generated.tempo, tempo, "generated pattern applied");
        self.pattern_name = generated.name;
    }

    fn poll_generation(&mut self) {
        let Some(rx) = &self.generation else { return };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(GenerateError::Transport(String::from(
                "generator thread exited without an answer",
            ))),
        };
        self.generation = None;
        match result {
            Ok(generated) => self.apply_generated(generated),
            Err(e) => {
                // the current pattern and tempo stay as they were
                tracing::warn!("pattern generation failed: {e}");
                self.status = e.to_string();
            }
        }
    }

    /// One pass of the control loop: collect background results, move captured
    /// audio off the tap, and schedule every step that fell into the look-ahead
    /// window. All instruments on a step share the same start time.
    pub fn tick(&mut self) {
        self.poll_generation();
        self.recorder.pump();

        let now = self.backend.now();
        for due in self.sequencer.poll(now) {
            for instrument in self.pattern.active_at(due.step as usize) {
                self.backend.send(AudioCommand::Trigger(TriggerParams {
                    instrument,
                    start_time: due.time,
                    pitch_offset: 0.0,
                }));
            }
        }
    }

    pub fn display_state(&self) -> DisplayState {
        DisplayState {
            steps: self.pattern.grid(),
            playing_step: self.sequencer.playing_step(),
            playing: self.is_playing(),
            recording: self.is_recording(),
            tempo: self.sequencer.tempo(),
            pattern_name: self.pattern_name.clone(),
            status: self.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OfflineBackend;
    use crate::shared::NUM_STEPS;
    use std::cell::RefCell;
    use std::time::Instant;

    // Remembers every command instead of rendering; the clock is set by hand.
    struct RecordingBackend {
        sent: RefCell<Vec<AudioCommand>>,
        now: RefCell<f64>,
    }

    impl RecordingBackend {
        fn new() -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                now: RefCell::new(0.0),
            }
        }

        fn triggers(&self) -> Vec<TriggerParams> {
            self.sent
                .borrow()
                .iter()
                .filter_map(|c| match c {
                    AudioCommand::Trigger(t) => Some(*t),
                    _ => None,
                })
                .collect()
        }
    }

    impl AudioBackend for RecordingBackend {
        fn send(&self, cmd: AudioCommand) {
            self.sent.borrow_mut().push(cmd);
        }
        fn now(&self) -> f64 {
            *self.now.borrow()
        }
        fn sample_rate(&self) -> u32 {
            44100
        }
    }

    struct FixedGenerator(GenerationResult);

    impl PatternGenerator for FixedGenerator {
        fn generate(&self, _prompt: &str) -> GenerationResult {
            self.0.clone()
        }
    }

    fn middle() -> Middle<RecordingBackend> {
        Middle::new(RecordingBackend::new(), 120.0, Duration::from_millis(10))
    }

    fn wait_for_generation<B: AudioBackend>(m: &mut Middle<B>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while m.generation.is_some() && Instant::now() < deadline {
            m.tick();
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn instruments_on_one_step_share_a_start_time() {
        let mut m = middle();
        m.handle_input(InputEvent::ToggleStep(Instrument::Kick, 0));
        m.handle_input(InputEvent::ToggleStep(Instrument::Hihat, 0));
        m.handle_input(InputEvent::ToggleStep(Instrument::Snare, 1));
        *m.backend.now.borrow_mut() = 2.0;
        m.handle_input(InputEvent::PlayPress);
        m.tick();

        let triggers = m.backend().triggers();
        assert_eq!(triggers.len(), 2);
        assert!(triggers.iter().all(|t| t.start_time == 2.0));
        assert_eq!(triggers[0].instrument, Instrument::Kick);
        assert_eq!(triggers[1].instrument, Instrument::Hihat);

        *m.backend.now.borrow_mut() = 2.05;
        m.tick();
        let triggers = m.backend().triggers();
        assert_eq!(triggers.len(), 3);
        assert_eq!(triggers[2].instrument, Instrument::Snare);
        assert_eq!(triggers[2].start_time, 2.125);
    }

    #[test]
    fn stopped_engine_triggers_nothing() {
        let mut m = middle();
        m.pattern.set_track(Instrument::Kick, [true; NUM_STEPS]);
        m.tick();
        assert!(m.backend().triggers().is_empty());
        assert_eq!(m.display_state().playing_step, None);
    }

    #[test]
    fn stopping_playback_stops_capture_first() {
        let (backend, _analyser) = OfflineBackend::new(44100, 0.5);
        let mut m = Middle::new(backend, 120.0, Duration::from_millis(10));
        m.handle_input(InputEvent::PlayPress);
        m.handle_input(InputEvent::RecordPress);
        assert!(m.is_recording());
        m.backend().render(1000);

        m.handle_input(InputEvent::PlayPress);
        assert!(!m.is_playing());
        assert!(!m.is_recording());
        let clips = m.take_finished_clips();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].sample_count, 1000);
    }

    #[test]
    fn recording_without_playback_is_allowed() {
        let (backend, _analyser) = OfflineBackend::new(44100, 0.5);
        let mut m = Middle::new(backend, 120.0, Duration::from_millis(10));
        m.handle_input(InputEvent::RecordPress);
        assert!(m.is_recording());
        assert!(matches!(m.start_capture(), Err(CaptureError::AlreadyActive)));
        assert!(m.is_recording());
        m.handle_input(InputEvent::RecordPress);
        assert!(!m.is_recording());
        assert_eq!(m.take_finished_clips().len(), 1);
    }

    #[test]
    fn tempo_nudges_are_clamped() {
        let mut m = middle();
        m.handle_input(InputEvent::AdjustTempo(100.0));
        assert_eq!(m.display_state().tempo, 200.0);
        m.handle_input(InputEvent::AdjustTempo(-500.0));
        assert_eq!(m.display_state().tempo, 60.0);
    }

    #[test]
    fn audition_fires_now_with_pitch() {
        let mut m = middle();
        *m.backend.now.borrow_mut() = 3.5;
        m.handle_input(InputEvent::Audition(Instrument::Synth, 7));
        let triggers = m.backend().triggers();
        assert_eq!(
            triggers,
            vec![TriggerParams { instrument: Instrument::Synth, start_time: 3.5, pitch_offset: 7.0 }]
        );
    }

    #[test]
    fn generated_pattern_replaces_everything() {
        let mut generated_pattern = Pattern::default();
        generated_pattern.toggle(Instrument::Synth, 3);
        let generator = FixedGenerator(Ok(GeneratedPattern {
            name: String::from("Stadium"),
            tempo: 250.0,
            pattern: generated_pattern.clone(),
        }));
        let mut m = middle().with_generator(Arc::new(generator), "anthem");
        m.pattern.toggle(Instrument::Kick, 0);

        m.handle_input(InputEvent::GeneratePattern);
        wait_for_generation(&mut m);

        assert_eq!(m.pattern, generated_pattern);
        let display = m.display_state();
        assert_eq!(display.pattern_name, "Stadium");
        assert_eq!(display.tempo, 200.0);
    }

    #[test]
    fn failed_generation_keeps_pattern_and_tempo() {
        let generator = FixedGenerator(Err(GenerateError::Transport(String::from("offline"))));
        let mut m = middle().with_generator(Arc::new(generator), "anthem");
        m.pattern.toggle(Instrument::Kick, 0);
        let before = m.pattern.clone();

        m.handle_input(InputEvent::GeneratePattern);
        wait_for_generation(&mut m);

        assert_eq!(m.pattern, before);
        assert_eq!(m.display_state().tempo, 120.0);
        assert!(m.status().contains("offline"));
    }

    #[test]
    fn missing_generator_is_reported() {
        let mut m = middle();
        m.handle_input(InputEvent::GeneratePattern);
        assert_eq!(m.status(), "no pattern generator configured");
    }
}
