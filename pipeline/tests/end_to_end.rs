//! End-to-end runs with the built-in backends.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use voxclone_audio::{wav, Pcm};
use voxclone_encoding::TransportData;
use voxclone_pipeline::{
    checkpoint, CloneError, CloneRequest, DeviceSelection, Pipeline, PipelineConfig, ReferenceAudio, Stage,
};

struct Env {
    _dir: TempDir,
    pipeline: Arc<Pipeline>,
}

fn env() -> Env {
    let dir = TempDir::new().unwrap();
    let cfg = PipelineConfig {
        output_dir: dir.path().join("outputs"),
        work_dir: dir.path().join("work"),
        checkpoint_dir: dir.path().join("checkpoints"),
        device: DeviceSelection::Cpu,
        max_concurrent_conversions: Some(2),
        slot_timeout: Duration::from_secs(30),
        protected_paths: Vec::new(),
    };
    checkpoint::init(&cfg.checkpoint_dir).unwrap();
    let pipeline = Pipeline::from_config(&cfg).unwrap();
    Env {
        _dir: dir,
        pipeline: Arc::new(pipeline),
    }
}

/// A bright, higher-pitched voice-like signal: harmonic series with a
/// slow vibrato and syllable-rate amplitude modulation.
fn reference_voice(secs: f32, sample_rate: u32) -> Vec<u8> {
    let n = (secs * sample_rate as f32) as usize;
    let samples = (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let f0 = 210.0 * (1.0 + 0.02 * (2.0 * std::f32::consts::PI * 5.0 * t).sin());
            let voice: f32 = (1..=12)
                .map(|h| (2.0 * std::f32::consts::PI * f0 * h as f32 * t).sin() / (h as f32).powf(0.6))
                .sum();
            let syllables = 0.6 + 0.4 * (2.0 * std::f32::consts::PI * 4.0 * t).sin().abs();
            voice * syllables * 0.12
        })
        .collect();
    wav::encode(&Pcm::new(sample_rate, samples)).unwrap()
}

fn transport(bytes: &[u8]) -> ReferenceAudio {
    ReferenceAudio::Transport(TransportData::new(bytes.to_vec()).encode())
}

fn is_empty(dir: &std::path::Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

#[test]
fn hello_world() {
    let env = env();
    let req = CloneRequest::new("Hello world", transport(&reference_voice(3.0, 24000)))
        .with_speed(1.0)
        .with_language("en");

    let result = env.pipeline.clone_voice(&req).unwrap();
    assert!(result.duration_seconds > 0.0);
    assert!(result.output_path.exists());
    assert!(result.output_path.starts_with(env.pipeline.output_dir()));
    assert!(is_empty(env.pipeline.work_dir()));

    // The transport payload decodes back to the same audio.
    let decoded = TransportData::decode(&result.audio.encode()).unwrap();
    let pcm = wav::read_bytes(decoded.as_bytes()).unwrap();
    let secs = pcm.duration().as_secs_f64();
    assert!((secs - result.duration_seconds).abs() < 0.01);
    assert!(pcm.peak() <= 0.95 + 1e-3);
}

#[test]
fn speed_changes_duration() {
    let env = env();
    let reference = reference_voice(2.0, 16000);
    let normal = env
        .pipeline
        .clone_voice(&CloneRequest::new("Hello world", transport(&reference)))
        .unwrap();
    let fast = env
        .pipeline
        .clone_voice(&CloneRequest::new("Hello world", transport(&reference)).with_speed(2.0))
        .unwrap();
    let ratio = normal.duration_seconds / fast.duration_seconds;
    assert!((ratio - 2.0).abs() < 0.05, "ratio {ratio}");
}

#[test]
fn chinese_text() {
    let env = env();
    let req = CloneRequest::new("你好世界", transport(&reference_voice(2.0, 22050))).with_language("zh-CN");
    let result = env.pipeline.clone_voice(&req).unwrap();
    assert!(result.duration_seconds > 0.5);
}

#[test]
fn unsupported_language_fails_at_synthesis() {
    let env = env();
    let req = CloneRequest::new("Bonjour", transport(&reference_voice(2.0, 16000))).with_language("fr");
    let err = env.pipeline.clone_voice(&req).unwrap_err();
    assert!(matches!(err, CloneError::Synthesis(_)));
    assert!(is_empty(env.pipeline.work_dir()));
    assert!(is_empty(env.pipeline.output_dir()));
}

#[test]
fn short_reference_fails_at_extraction() {
    let env = env();
    let req = CloneRequest::new("Hello", transport(&reference_voice(0.2, 16000)));
    let err = env.pipeline.clone_voice(&req).unwrap_err();
    assert_eq!(err.stage(), Stage::Extracting);
    assert!(is_empty(env.pipeline.work_dir()));
    assert!(is_empty(env.pipeline.output_dir()));
}

#[test]
fn silent_reference_fails_at_extraction() {
    let env = env();
    let silence = wav::encode(&Pcm::silence(16000, Duration::from_secs(2))).unwrap();
    let err = env
        .pipeline
        .clone_voice(&CloneRequest::new("Hello", transport(&silence)))
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Extracting);
    assert!(is_empty(env.pipeline.work_dir()));
}

#[test]
fn malformed_reference_writes_nothing() {
    let env = env();
    let req = CloneRequest::new("Hello", ReferenceAudio::Transport("not*base64".to_string()));
    let err = env.pipeline.clone_voice(&req).unwrap_err();
    assert_eq!(err.stage(), Stage::Decoding);
    assert!(is_empty(env.pipeline.work_dir()));
    assert!(is_empty(env.pipeline.output_dir()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_async_requests() {
    let env = env();
    let reference = reference_voice(1.5, 16000);

    let a = env
        .pipeline
        .clone_voice_async(CloneRequest::new("First voice", transport(&reference)).with_output_name("a"));
    let b = env
        .pipeline
        .clone_voice_async(CloneRequest::new("Second voice", transport(&reference)).with_output_name("b"));
    let (a, b) = tokio::join!(a, b);
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.output_path, b.output_path);
    assert!(wav::probe_file(&a.output_path).is_ok());
    assert!(wav::probe_file(&b.output_path).is_ok());
    assert!(is_empty(env.pipeline.work_dir()));
}
