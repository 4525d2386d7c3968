//! Integration tests for the built-in backends.

use super::*;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use voxclone_audio::{wav, Pcm};
use voxclone_voiceprint::{EmbeddingExtractor, FbankExtractor, SpeakerEmbedding};

// ============================================================================
// Helpers
// ============================================================================

fn checkpoints() -> TempDir {
    let dir = TempDir::new().unwrap();
    FormantSynthesizer::write_default_checkpoint(dir.path()).unwrap();
    SpectralConverter::write_default_checkpoint(dir.path()).unwrap();
    dir
}

fn synthesize(dir: &Path, text: &str, name: &str) -> AudioArtifact {
    let tts = FormantSynthesizer::open(dir, Device::Cpu).unwrap();
    tts.synthesize(text, 1.0, "en", &dir.join(name)).unwrap()
}

// ============================================================================
// Checkpoints
// ============================================================================

#[test]
fn test_default_checkpoint_layout() {
    let dir = checkpoints();
    assert!(dir.path().join("base_speakers/EN/config.json").is_file());
    assert!(dir.path().join("base_speakers/ZH/config.json").is_file());
    assert!(dir.path().join("converter/config.json").is_file());

    let conv = SpectralConverter::open(dir.path(), Device::Cpu).unwrap();
    assert_eq!(conv.config(), &ConverterConfig::default());
}

#[test]
fn test_missing_checkpoints() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        FormantSynthesizer::open(dir.path(), Device::Cpu),
        Err(SynthesisError::Checkpoint { .. })
    ));
    assert!(matches!(
        SpectralConverter::open(dir.path(), Device::Cpu),
        Err(ConversionError::Checkpoint { .. })
    ));
}

#[test]
fn test_malformed_checkpoint() {
    let dir = checkpoints();
    fs::write(dir.path().join("converter/config.json"), "{not json").unwrap();
    assert!(matches!(
        SpectralConverter::open(dir.path(), Device::Cpu),
        Err(ConversionError::Checkpoint { .. })
    ));

    fs::write(
        dir.path().join("base_speakers/EN/config.json"),
        r#"{"language": "chinese"}"#,
    )
    .unwrap();
    assert!(matches!(
        FormantSynthesizer::open(dir.path(), Device::Cpu),
        Err(SynthesisError::Checkpoint { .. })
    ));
}

#[test]
fn test_partial_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let en = dir.path().join("base_speakers/EN");
    fs::create_dir_all(&en).unwrap();
    fs::write(en.join("config.json"), r#"{"pitch_hz": 150.0}"#).unwrap();

    let tts = FormantSynthesizer::open(dir.path(), Device::Cpu).unwrap();
    let speaker = tts.speaker("english").unwrap();
    assert_eq!(speaker.pitch_hz, 150.0);
    assert_eq!(speaker.sample_rate, 22050);
    assert!(tts.speaker("zh").is_err());
}

// ============================================================================
// Synthesis
// ============================================================================

#[test]
fn test_synthesize_writes_wav() {
    let dir = checkpoints();
    let artifact = synthesize(dir.path(), "Hello world", "base.wav");

    assert_eq!(artifact.path, dir.path().join("base.wav"));
    assert_eq!(artifact.format.sample_rate, 22050);
    assert!(artifact.duration > Duration::from_millis(500));

    let probed = AudioArtifact::from_file(&artifact.path).unwrap();
    assert_eq!(probed, artifact);
}

#[test]
fn test_synthesize_chinese() {
    let dir = checkpoints();
    let tts = FormantSynthesizer::open(dir.path(), Device::Cpu).unwrap();
    let out = dir.path().join("zh.wav");
    let artifact = tts.synthesize("你好，世界。", 1.0, "zh-CN", &out).unwrap();
    // Four syllables of 180 ms plus pauses.
    assert!(artifact.duration >= Duration::from_millis(720));
}

#[test]
fn test_synthesize_failure_writes_nothing() {
    let dir = checkpoints();
    let tts = FormantSynthesizer::open(dir.path(), Device::Cpu).unwrap();
    let out = dir.path().join("none.wav");
    assert!(tts.synthesize("Hello", 1.0, "fr", &out).is_err());
    assert!(tts.synthesize("   ", 1.0, "en", &out).is_err());
    assert!(!out.exists());
}

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn test_convert_moves_toward_target() {
    let dir = checkpoints();
    let base = synthesize(dir.path(), "Hello world, this is a test.", "base.wav");

    let extractor = FbankExtractor::default();
    let source = extractor.extract(&base.path).unwrap();

    // A brighter target: raise the upper half of the envelope.
    let target = SpeakerEmbedding::new(
        source
            .values()
            .iter()
            .enumerate()
            .map(|(i, v)| if i >= 20 { v + 1.5 } else { v - 0.5 })
            .collect(),
    )
    .unwrap();

    let conv = SpectralConverter::open(dir.path(), Device::Cpu).unwrap();
    let out = dir.path().join("converted.wav");
    let converted = conv.convert(&base, &source, &target, &out).unwrap();

    assert_eq!(converted.path, out);
    assert_eq!(converted.format, base.format);
    assert_eq!(converted.duration, base.duration);

    // Upper bands rise relative to lower bands by roughly strength * 2.0.
    let tilt = |e: &SpeakerEmbedding| {
        let v = e.values();
        v[20..].iter().sum::<f32>() / 20.0 - v[..20].iter().sum::<f32>() / 20.0
    };
    let result = extractor.extract(&out).unwrap();
    let gained = tilt(&result) - tilt(&source);
    assert!(gained > 0.8, "tilt gained {gained}");
}

#[test]
fn test_convert_unreadable_base() {
    let dir = checkpoints();
    let bogus = dir.path().join("bogus.wav");
    fs::write(&bogus, b"not a wav").unwrap();
    let base = AudioArtifact {
        path: bogus,
        format: voxclone_audio::Format::mono(22050),
        duration: Duration::from_secs(1),
    };
    let e = SpeakerEmbedding::new(vec![0.0; 40]).unwrap();

    let conv = SpectralConverter::open(dir.path(), Device::Cpu).unwrap();
    let out = dir.path().join("out.wav");
    let err = conv.convert(&base, &e, &e, &out).unwrap_err();
    assert!(matches!(err, ConversionError::UnreadableBase(_)));
    assert!(!out.exists());
}

#[test]
fn test_convert_dimension_mismatch() {
    let dir = checkpoints();
    let base = synthesize(dir.path(), "Hello", "base.wav");
    let source = SpeakerEmbedding::new(vec![0.0; 40]).unwrap();
    let target = SpeakerEmbedding::new(vec![0.0; 256]).unwrap();

    let conv = SpectralConverter::open(dir.path(), Device::Cpu).unwrap();
    let err = conv
        .convert(&base, &source, &target, &dir.path().join("out.wav"))
        .unwrap_err();
    assert!(matches!(err, ConversionError::Embedding(_)));
}

#[test]
fn test_convert_over_budget() {
    let dir = TempDir::new().unwrap();
    let base_path = dir.path().join("long.wav");
    wav::write_file(&base_path, &Pcm::silence(8000, Duration::from_secs(3))).unwrap();
    let base = AudioArtifact::from_file(&base_path).unwrap();

    let cfg = ConverterConfig {
        max_input_secs: 2.0,
        ..Default::default()
    };
    let conv = SpectralConverter::new(cfg, Device::Cpu).unwrap();
    let e = SpeakerEmbedding::new(vec![0.0; 40]).unwrap();
    let err = conv
        .convert(&base, &e, &e, &dir.path().join("out.wav"))
        .unwrap_err();
    assert!(matches!(err, ConversionError::ResourceExhausted(_)));
}
