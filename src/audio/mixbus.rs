use crossbeam_channel::Sender;
use ringbuf::HeapProd;
use ringbuf::traits::Producer;

use crate::audio_api::CaptureMessage;
use crate::shared::CAPTURE_BLOCK_SIZE;

/// The single summing point. Every voice is summed before this, the gain is
/// applied once, and both taps see exactly what goes to the output.
pub struct MixBus {
    gain: f32,
    spectrum: Option<HeapProd<f32>>,
    capture: Option<CaptureTap>,
}

impl MixBus {
    pub fn new(gain: f32) -> Self {
        Self {
            gain,
            spectrum: None,
            capture: None,
        }
    }

    pub fn with_spectrum_tap(mut self, producer: HeapProd<f32>) -> Self {
        self.spectrum = Some(producer);
        self
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn process(&mut self, sum: f32) -> f32 {
        let out = sum * self.gain;
        if let Some(spectrum) = &mut self.spectrum {
            // a slow reader just misses samples, the output never waits on it
            let _ = spectrum.try_push(out);
        }
        if let Some(tap) = &mut self.capture {
            tap.push(out);
        }
        out
    }

    pub fn start_capture(&mut self, tx: Sender<CaptureMessage>) {
        // the control side never overlaps sessions, but close a stale tap cleanly anyway
        if let Some(old) = self.capture.take() {
            old.finish();
        }
        self.capture = Some(CaptureTap::new(tx));
    }

    pub fn stop_capture(&mut self) {
        if let Some(tap) = self.capture.take() {
            tap.finish();
        }
    }
}

// Collects post-gain samples into fixed-size blocks and hands each full block
// to the control thread.
struct CaptureTap {
    tx: Sender<CaptureMessage>,
    block: Vec<f32>,
}

impl CaptureTap {
    fn new(tx: Sender<CaptureMessage>) -> Self {
        Self {
            tx,
            block: Vec::with_capacity(CAPTURE_BLOCK_SIZE),
        }
    }

    fn push(&mut self, sample: f32) {
        self.block.push(sample);
        if self.block.len() == CAPTURE_BLOCK_SIZE {
            let full = std::mem::replace(&mut self.block, Vec::with_capacity(CAPTURE_BLOCK_SIZE));
            let _ = self.tx.send(CaptureMessage::Block(full));
        }
    }

    // The partial tail goes out too, so the session ends on the last rendered sample.
    fn finish(self) {
        if !self.block.is_empty() {
            let _ = self.tx.send(CaptureMessage::Block(self.block));
        }
        let _ = self.tx.send(CaptureMessage::Finished);
    }
}
