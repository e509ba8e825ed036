//! 16-bit mono PCM WAV encoding.
//!
//! Layout is the canonical 44-byte header (RIFF / "fmt " of 16 bytes / data)
//! followed by little-endian i16 samples in capture order.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

pub const WAV_MIME: &str = "audio/wav";
pub const HEADER_LEN: usize = 44;

/// Clamp to [-1, 1] then scale negatives by 0x8000 and the rest by 0x7FFF,
/// truncating toward zero.
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Vec::with_capacity(HEADER_LEN + samples.len() * 2);
    {
        let mut writer = WavWriter::new(Cursor::new(&mut buffer), spec)?;
        for &s in samples {
            writer.write_sample(quantize(s))?;
        }
        // finalize patches the RIFF and data sizes
        writer.finalize()?;
    }
    Ok(buffer)
}
