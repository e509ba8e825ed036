use crossbeam_channel::Sender;

use crate::shared::Instrument;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerParams {
    pub instrument: Instrument,
    pub start_time: f64,   // seconds on the audio clock
    pub pitch_offset: f32, // semitones, only the synth voice reads it
}

/// What the audio thread hands back to a capture session.
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureMessage {
    Block(Vec<f32>),
    // Sent once after the last block of a session; the tap is gone after this.
    Finished,
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // Voices are fire-and-forget: once enqueued nothing on the control side
    // can reach them again.
    Trigger(TriggerParams),

    // The audio thread owns the tap; the control side only owns the receiving end.
    StartCapture(Sender<CaptureMessage>),
    StopCapture,
}

/// The seam between the control thread and whatever renders audio.
///
/// `AudioHandle` talks to a live cpal stream, `OfflineBackend` renders on demand.
pub trait AudioBackend {
    fn send(&self, cmd: AudioCommand);

    /// Current position of the audio clock in seconds.
    fn now(&self) -> f64;

    fn sample_rate(&self) -> u32;
}
