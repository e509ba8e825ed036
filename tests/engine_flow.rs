use std::time::Duration;

use approx::assert_relative_eq;
use beatbox::audio::OfflineBackend;
use beatbox::capture::wav::quantize;
use beatbox::middle::Middle;
use beatbox::shared::{InputEvent, Instrument};

const SAMPLE_RATE: u32 = 48000;
const BLOCK: usize = 800; // one control tick per block, roughly 60 Hz

fn middle() -> Middle<OfflineBackend> {
    let (backend, _analyser) = OfflineBackend::new(SAMPLE_RATE, 0.5);
    Middle::new(backend, 120.0, Duration::from_millis(50))
}

// tick, then render one block, until `frames` have been rendered
fn run(m: &mut Middle<OfflineBackend>, frames: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames);
    while out.len() < frames {
        m.tick();
        out.extend(m.backend().render(BLOCK.min(frames - out.len())));
    }
    out
}

#[test]
fn steps_land_on_exact_sample_positions() {
    let mut m = middle();
    m.handle_input(InputEvent::ToggleStep(Instrument::Hihat, 1));
    m.handle_input(InputEvent::ToggleStep(Instrument::Hihat, 3));
    m.handle_input(InputEvent::PlayPress);

    // 120 BPM at 48 kHz is 6000 samples per step
    let out = run(&mut m, 24000);
    assert!(out[..6000].iter().all(|s| *s == 0.0));
    assert_relative_eq!(out[6000], 0.15, epsilon = 1e-6);
    // the hihat rings for 50 ms
    assert!(out[6000 + 2400..18000].iter().all(|s| *s == 0.0));
    assert_relative_eq!(out[18000], 0.15, epsilon = 1e-6);
}

#[test]
fn stopping_playback_closes_the_capture() {
    let mut m = middle();
    m.handle_input(InputEvent::PlayPress);
    m.handle_input(InputEvent::RecordPress);
    run(&mut m, 8192);
    m.handle_input(InputEvent::PlayPress);

    assert!(!m.is_playing());
    assert!(!m.is_recording());
    let clips = m.take_finished_clips();
    assert_eq!(clips.len(), 1);
    let clip = &clips[0];
    assert_eq!(clip.mime, "audio/wav");
    assert_eq!(clip.sample_count, 8192);
    assert_eq!(clip.bytes.len(), 16428);
    assert!(clip.bytes[44..].iter().all(|b| *b == 0));
}

#[test]
fn captured_audio_matches_the_mix() {
    let mut m = middle();
    m.handle_input(InputEvent::ToggleStep(Instrument::Kick, 0));
    m.handle_input(InputEvent::ToggleStep(Instrument::Synth, 2));
    m.handle_input(InputEvent::RecordPress);
    m.handle_input(InputEvent::PlayPress);
    let out = run(&mut m, 20000);
    m.handle_input(InputEvent::RecordPress);
    assert!(m.is_playing());

    let clips = m.take_finished_clips();
    let mut reader = hound::WavReader::new(clips[0].bytes.as_slice()).unwrap();
    assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
    let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    let expected: Vec<i16> = out.iter().map(|s| quantize(*s)).collect();
    assert_eq!(decoded, expected);
    assert!(decoded.iter().any(|s| *s != 0));
}

#[test]
fn generated_tempo_is_clamped_on_apply() {
    let mut m = middle();
    m.apply_generated(beatbox::pipeline::GeneratedPattern {
        name: String::from("Too Fast"),
        tempo: 300.0,
        pattern: Default::default(),
    });
    let ds = m.display_state();
    assert_eq!(ds.tempo, 200.0);
    assert_eq!(ds.pattern_name, "Too Fast");
}
