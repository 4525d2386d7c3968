//! Whole-buffer sample rate conversion backed by rubato.

use rubato::{FftFixedInOut, Resampler};

use crate::{AudioError, Pcm};

/// Frames per processing block.
const CHUNK_SIZE: usize = 1024;

/// Converts a mono buffer to `target_rate`.
///
/// Returns a copy when the rates already match. The final partial block is
/// zero-padded and the output trimmed to the ideal length, so the duration
/// is preserved to within one output sample.
pub fn resample(pcm: &Pcm, target_rate: u32) -> Result<Pcm, AudioError> {
    if target_rate == 0 || pcm.sample_rate() == 0 {
        return Err(AudioError::Resample("sample rate must be > 0".into()));
    }
    if pcm.sample_rate() == target_rate {
        return Ok(pcm.clone());
    }

    let mut resampler = FftFixedInOut::<f32>::new(
        pcm.sample_rate() as usize,
        target_rate as usize,
        CHUNK_SIZE,
        1,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let expected =
        (pcm.len() as f64 * target_rate as f64 / pcm.sample_rate() as f64).round() as usize;
    let mut out = Vec::with_capacity(expected + CHUNK_SIZE);
    let mut input = vec![Vec::with_capacity(CHUNK_SIZE)];
    let mut output = vec![Vec::new()];
    let samples = pcm.samples();
    let mut pos = 0;

    // Keep feeding (zero padding past the end) until the ideal length is covered.
    while out.len() < expected {
        let need = resampler.input_frames_next();
        input[0].clear();
        let end = (pos + need).min(samples.len());
        if pos < end {
            input[0].extend_from_slice(&samples[pos..end]);
        }
        input[0].resize(need, 0.0);
        pos += need;

        output[0].clear();
        output[0].resize(resampler.output_frames_next(), 0.0);
        let (_, written) = resampler
            .process_into_buffer(&input, &mut output, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        out.extend_from_slice(&output[0][..written]);
    }

    out.truncate(expected);
    Ok(Pcm::new(target_rate, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(sample_rate: u32, n: usize) -> Pcm {
        let samples = (0..n)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 300.0 * i as f32 / sample_rate as f32).sin())
            .collect();
        Pcm::new(sample_rate, samples)
    }

    #[test]
    fn same_rate_is_identity() {
        let pcm = tone(16000, 1600);
        assert_eq!(resample(&pcm, 16000).unwrap(), pcm);
    }

    #[test]
    fn downsample_preserves_duration() {
        let pcm = tone(22050, 22050);
        let out = resample(&pcm, 16000).unwrap();
        assert_eq!(out.sample_rate(), 16000);
        assert_eq!(out.len(), 16000);
    }

    #[test]
    fn upsample_preserves_level() {
        let pcm = tone(16000, 32000);
        let out = resample(&pcm, 24000).unwrap();
        assert_eq!(out.len(), 48000);
        // Skip the filter's leading delay when measuring level.
        let steady = &out.samples()[4000..44000];
        assert!((crate::rms(steady) - 0.3535).abs() < 0.03);
    }

    #[test]
    fn zero_rate_is_error() {
        assert!(resample(&tone(16000, 100), 0).is_err());
    }
}
