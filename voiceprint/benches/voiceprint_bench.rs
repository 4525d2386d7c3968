use criterion::{black_box, criterion_group, criterion_main, Criterion};
use voxclone_audio::Pcm;
use voxclone_voiceprint::{Fbank, FbankConfig, FbankExtractor};

fn make_voice(f0: f32, n_samples: usize, sample_rate: u32) -> Pcm {
    let samples = (0..n_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (1..=8)
                .map(|h| (2.0 * std::f32::consts::PI * f0 * h as f32 * t).sin() / h as f32)
                .sum::<f32>()
                * 0.2
        })
        .collect();
    Pcm::new(sample_rate, samples)
}

fn bench_fbank_1s(c: &mut Criterion) {
    let fbank = Fbank::new(FbankConfig::default());
    let pcm = make_voice(140.0, 16000, 16000);

    c.bench_function("voiceprint_fbank_1s", |b| {
        b.iter(|| {
            let _ = black_box(fbank.compute(black_box(pcm.samples())));
        });
    });
}

fn bench_embed_3s(c: &mut Criterion) {
    let extractor = FbankExtractor::default();
    let pcm = make_voice(140.0, 48000, 16000);

    c.bench_function("voiceprint_embed_3s", |b| {
        b.iter(|| {
            let _ = black_box(extractor.embed(black_box(&pcm)));
        });
    });
}

fn bench_embed_3s_resampled(c: &mut Criterion) {
    let extractor = FbankExtractor::default();
    let pcm = make_voice(140.0, 66150, 22050);

    c.bench_function("voiceprint_embed_3s_22k", |b| {
        b.iter(|| {
            let _ = black_box(extractor.embed(black_box(&pcm)));
        });
    });
}

criterion_group!(benches, bench_fbank_1s, bench_embed_3s, bench_embed_3s_resampled);
criterion_main!(benches);
