mod session;
pub mod wav;

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub use session::{CaptureError, CaptureSession, EncodedClip, Recorder};

/// Write a clip as `beatbox-<unix millis>.wav` under `dir`, creating it if needed.
pub fn save_clip(dir: &Path, clip: &EncodedClip) -> std::io::Result<PathBuf> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("beatbox-{millis}.wav"));
    std::fs::write(&path, &clip.bytes)?;
    tracing::info!(path = %path.display(), secs = clip.duration_secs(), "clip saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_clip_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let samples = [0.0, 0.5, -0.5, 1.0];
        let clip = EncodedClip {
            bytes: wav::encode_wav(&samples, 44100).unwrap(),
            mime: wav::WAV_MIME,
            sample_rate: 44100,
            sample_count: samples.len(),
        };
        let path = save_clip(&dir.path().join("takes"), &clip).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("beatbox-") && name.ends_with(".wav"));
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 4);
    }
}
