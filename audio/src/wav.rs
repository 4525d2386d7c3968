//! RIFF/WAVE reading and writing.
//!
//! Everything the pipeline exchanges on disk is WAV. Reading accepts any
//! integer depth up to 32 bits and 32-bit float, and downmixes to mono.
//! Writing always produces 16-bit PCM mono.

use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::{AudioError, Format, Pcm};

/// Header-level description of a WAV payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub format: Format,
    pub bits_per_sample: u16,
    pub float: bool,
    /// Number of sample frames (samples per channel).
    pub frames: u32,
}

impl WavInfo {
    pub fn duration(&self) -> Duration {
        self.format.duration(self.frames as usize)
    }
}

fn info_from<R: Read>(reader: &WavReader<R>) -> WavInfo {
    let spec = reader.spec();
    WavInfo {
        format: Format::new(spec.sample_rate, spec.channels),
        bits_per_sample: spec.bits_per_sample,
        float: spec.sample_format == SampleFormat::Float,
        frames: reader.duration(),
    }
}

/// Parses the header of an in-memory WAV payload.
pub fn probe(bytes: &[u8]) -> Result<WavInfo, AudioError> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let info = info_from(&reader);
    if info.format.channels == 0 || info.format.sample_rate == 0 {
        return Err(AudioError::InvalidWav("zero channels or sample rate".into()));
    }
    Ok(info)
}

/// Parses the header of a WAV file.
pub fn probe_file(path: impl AsRef<Path>) -> Result<WavInfo, AudioError> {
    let reader = WavReader::open(path)?;
    Ok(info_from(&reader))
}

/// Returns the duration of a WAV file in seconds.
pub fn file_duration(path: impl AsRef<Path>) -> Result<f64, AudioError> {
    let info = probe_file(path)?;
    if info.format.sample_rate == 0 {
        return Err(AudioError::InvalidWav("zero sample rate".into()));
    }
    Ok(info.frames as f64 / info.format.sample_rate as f64)
}

/// Reads a WAV file into a mono buffer.
pub fn read_file(path: impl AsRef<Path>) -> Result<Pcm, AudioError> {
    let reader = WavReader::open(path)?;
    decode(reader)
}

/// Reads an in-memory WAV payload into a mono buffer.
pub fn read_bytes(bytes: &[u8]) -> Result<Pcm, AudioError> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    decode(reader)
}

fn decode<R: Read>(mut reader: WavReader<R>) -> Result<Pcm, AudioError> {
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(AudioError::UnsupportedFormat {
                    kind: "float",
                    bits: spec.bits_per_sample,
                });
            }
            reader.samples::<f32>().collect::<Result<_, _>>()?
        }
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::UnsupportedFormat {
                    kind: "int",
                    bits: spec.bits_per_sample,
                });
            }
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(Pcm::new(spec.sample_rate, mono))
}

fn spec_for(pcm: &Pcm) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: pcm.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn write_to<W: std::io::Write + Seek>(w: W, pcm: &Pcm) -> Result<(), AudioError> {
    if pcm.sample_rate() == 0 {
        return Err(AudioError::InvalidWav("sample rate must be > 0".into()));
    }
    let mut writer = WavWriter::new(w, spec_for(pcm))?;
    for s in pcm.to_i16() {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Writes a buffer as a 16-bit PCM mono WAV file.
pub fn write_file(path: impl AsRef<Path>, pcm: &Pcm) -> Result<(), AudioError> {
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_to(file, pcm)
}

/// Encodes a buffer as an in-memory 16-bit PCM mono WAV payload.
pub fn encode(pcm: &Pcm) -> Result<Vec<u8>, AudioError> {
    let mut buf = Cursor::new(Vec::new());
    write_to(&mut buf, pcm)?;
    Ok(buf.into_inner())
}
