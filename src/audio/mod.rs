use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::HeapRb;
use ringbuf::traits::Split;

use crate::audio_api::{AudioBackend, AudioCommand};

mod analyser;
mod clock;
mod engine;
mod envelope;
mod filter;
mod mixbus;
mod offline;
mod oscillator;
mod voice;

pub use analyser::{Analyser, FFT_SIZE};
pub use clock::AudioClock;
pub use engine::Engine;
pub use mixbus::MixBus;
pub use offline::OfflineBackend;
pub use voice::{Recipe, Voice, synth_frequency};

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("no default output device")]
    NoOutputDevice,

    #[error("no default output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported sample format {0} (only f32 supported for now)")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to build output stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("failed to play output stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

/// Engine plus the control-side readers that go with it.
pub fn build_engine(sample_rate: u32, master_gain: f32) -> (Engine, AudioClock, Analyser) {
    let clock = AudioClock::new(sample_rate);
    let (spectrum_tx, spectrum_rx) = HeapRb::<f32>::new(analyser::TAP_CAPACITY).split();
    let bus = MixBus::new(master_gain).with_spectrum_tap(spectrum_tx);
    let engine = Engine::new(clock.clone(), bus);
    (engine, clock, Analyser::new(spectrum_rx))
}

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    clock: AudioClock,
    _output_stream: cpal::Stream,
}

impl AudioBackend for AudioHandle {
    fn send(&self, cmd: AudioCommand) {
        if self.tx.try_send(cmd).is_err() {
            tracing::warn!("audio command queue full, command dropped");
        }
    }

    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn sample_rate(&self) -> u32 {
        self.clock.sample_rate()
    }
}

/// Open the default output device. Any failure here is fatal to the caller:
/// there is no silent fallback mode.
pub fn start_audio(master_gain: f32) -> Result<(AudioHandle, Analyser), AudioError> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);

    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(AudioError::NoOutputDevice)?;
    let config = device.default_output_config()?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let (engine, clock, analyser) = build_engine(sample_rate, master_gain);
            let output_stream = build_output_stream_f32(&device, &config.into(), rx, engine, channels)?;
            output_stream.play()?;

            tracing::info!(sample_rate, channels, "audio output started");
            Ok((
                AudioHandle {
                    tx,
                    clock,
                    _output_stream: output_stream,
                },
                analyser,
            ))
        }
        other => Err(AudioError::UnsupportedFormat(other)),
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    mut engine: Engine,
    channels: usize,
) -> Result<cpal::Stream, AudioError> {
    let err_fn = |err| tracing::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() { // no logging or locking in here
                engine.handle_cmd(cmd);
            }
            engine.render_block(data, channels);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
