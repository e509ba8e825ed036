use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::audio_api::{AudioBackend, AudioCommand, CaptureMessage};

use super::wav::{self, WAV_MIME};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("a capture session is already active")]
    AlreadyActive,

    #[error("failed to encode capture: {0}")]
    Encode(#[from] hound::Error),
}

/// A finished capture, ready to be written out.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedClip {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub sample_rate: u32,
    pub sample_count: usize,
}

impl EncodedClip {
    pub fn duration_secs(&self) -> f64 {
        self.sample_count as f64 / self.sample_rate as f64
    }
}

// The control-side half of a capture: the receiving end of the tap plus every
// block taken off it so far, in arrival order.
#[derive(Debug)]
pub struct CaptureSession {
    rx: Receiver<CaptureMessage>,
    blocks: Vec<Vec<f32>>,
    sample_rate: u32,
    finished: bool,
}

impl CaptureSession {
    fn new(rx: Receiver<CaptureMessage>, sample_rate: u32) -> Self {
        Self {
            rx,
            blocks: Vec::new(),
            sample_rate,
            finished: false,
        }
    }

    pub fn captured_samples(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    fn accept(&mut self, msg: CaptureMessage) {
        match msg {
            CaptureMessage::Block(block) => self.blocks.push(block),
            CaptureMessage::Finished => self.finished = true,
        }
    }

    fn drain_available(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.accept(msg);
        }
    }

    // Wait for the audio thread to flush its partial block and sign off.
    fn drain_until_finished(&mut self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while !self.finished {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(msg) => self.accept(msg),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        captured = self.captured_samples(),
                        "audio thread did not close the capture in time, keeping what arrived"
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn into_samples(self) -> Vec<f32> {
        let mut samples = Vec::with_capacity(self.captured_samples());
        for block in self.blocks {
            samples.extend_from_slice(&block);
        }
        samples
    }
}

/// Owns at most one capture session at a time.
#[derive(Debug)]
pub struct Recorder {
    session: Option<CaptureSession>,
    stop_timeout: Duration,
}

impl Recorder {
    pub fn new(stop_timeout: Duration) -> Self {
        Self {
            session: None,
            stop_timeout,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn captured_samples(&self) -> usize {
        self.session.as_ref().map_or(0, CaptureSession::captured_samples)
    }

    /// Open a session and arm the tap. Refuses (and leaves the running
    /// session alone) if one is already open.
    pub fn start(&mut self, backend: &impl AudioBackend) -> Result<(), CaptureError> {
        if self.session.is_some() {
            return Err(CaptureError::AlreadyActive);
        }
        let (tx, rx) = crossbeam_channel::unbounded();
        self.session = Some(CaptureSession::new(rx, backend.sample_rate()));
        backend.send(AudioCommand::StartCapture(tx));
        tracing::info!(sample_rate = backend.sample_rate(), "capture started");
        Ok(())
    }

    /// Move blocks the audio thread has already produced into the session.
    /// Called every control tick so the channel stays short.
    pub fn pump(&mut self) {
        if let Some(session) = &mut self.session {
            session.drain_available();
        }
    }

    /// Close the session and encode everything it captured. `Ok(None)` when
    /// there was no session; an empty session still yields a header-only clip.
    pub fn stop(&mut self, backend: &impl AudioBackend) -> Result<Option<EncodedClip>, CaptureError> {
        let Some(mut session) = self.session.take() else {
            return Ok(None);
        };
        backend.send(AudioCommand::StopCapture);
        session.drain_until_finished(self.stop_timeout);

        let sample_rate = session.sample_rate;
        let samples = session.into_samples();
        let bytes = wav::encode_wav(&samples, sample_rate)?;
        tracing::info!(samples = samples.len(), bytes = bytes.len(), "capture stopped");

        Ok(Some(EncodedClip {
            bytes,
            mime: WAV_MIME,
            sample_rate,
            sample_count: samples.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OfflineBackend;
    use crate::audio_api::TriggerParams;
    use crate::shared::{CAPTURE_BLOCK_SIZE, Instrument};

    fn recorder() -> Recorder {
        Recorder::new(Duration::from_millis(50))
    }

    #[test]
    fn stop_without_session_is_a_no_op() {
        let (backend, _analyser) = OfflineBackend::new(44100, 0.5);
        let mut rec = recorder();
        assert!(rec.stop(&backend).unwrap().is_none());
    }

    #[test]
    fn second_start_is_rejected_and_keeps_the_first_session() {
        let (backend, _analyser) = OfflineBackend::new(44100, 0.5);
        let mut rec = recorder();
        rec.start(&backend).unwrap();
        backend.render(100);
        assert!(matches!(rec.start(&backend), Err(CaptureError::AlreadyActive)));
        backend.render(100);

        let clip = rec.stop(&backend).unwrap().unwrap();
        assert_eq!(clip.sample_count, 200);
        assert!(!rec.is_active());
    }

    #[test]
    fn empty_session_gives_header_only_clip() {
        let (backend, _analyser) = OfflineBackend::new(44100, 0.5);
        let mut rec = recorder();
        rec.start(&backend).unwrap();
        let clip = rec.stop(&backend).unwrap().unwrap();
        assert_eq!(clip.bytes.len(), wav::HEADER_LEN);
        assert_eq!(clip.sample_count, 0);
        assert_eq!(clip.mime, "audio/wav");
    }

    #[test]
    fn silent_capture_of_two_blocks() {
        let (backend, _analyser) = OfflineBackend::new(44100, 0.5);
        let mut rec = recorder();
        rec.start(&backend).unwrap();
        backend.render(CAPTURE_BLOCK_SIZE * 2);
        rec.pump();
        assert_eq!(rec.captured_samples(), 8192);

        let clip = rec.stop(&backend).unwrap().unwrap();
        assert_eq!(clip.bytes.len(), 16428);
        assert!(clip.bytes[wav::HEADER_LEN..].iter().all(|b| *b == 0));
    }

    #[test]
    fn captured_samples_match_rendered_output_in_order() {
        let (backend, _analyser) = OfflineBackend::new(8000, 0.5);
        backend.send(AudioCommand::Trigger(TriggerParams {
            instrument: Instrument::Kick,
            start_time: 0.0,
            pitch_offset: 0.0,
        }));
        let mut rec = recorder();
        rec.start(&backend).unwrap();
        let rendered: Vec<f32> = (0..3).flat_map(|_| backend.render(1500)).collect();
        let clip = rec.stop(&backend).unwrap().unwrap();

        assert_eq!(clip.sample_count, rendered.len());
        let body = &clip.bytes[wav::HEADER_LEN..];
        for (i, s) in rendered.iter().enumerate() {
            let q = i16::from_le_bytes([body[2 * i], body[2 * i + 1]]);
            assert_eq!(q, wav::quantize(*s), "sample {i}");
        }
    }
}
