//! Benchmark for fractal heightfield generation.
//!
//! TARGET: one full 243x243 chunk field well under a frame budget
//!
//! Run with: cargo bench --package tellus_procedural --bench noise_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tellus_procedural::noise::{self, GradientNoise, NoiseParameters, NormalizeMode, TerrainSeed};

fn chunk_params() -> NoiseParameters {
    NoiseParameters {
        seed: TerrainSeed::new(42),
        scale: 27.5,
        octaves: 4,
        persistence: 0.5,
        lacunarity: 2.0,
        offset: glam::Vec2::ZERO,
        normalize_mode: NormalizeMode::Global,
    }
}

fn benchmark_single_sample(c: &mut Criterion) {
    let noise = GradientNoise::new(TerrainSeed::new(42));

    c.bench_function("single_noise_sample", |b| {
        let mut x = 0.0_f32;
        b.iter(|| {
            x += 0.1;
            black_box(noise.sample(black_box(x), black_box(x * 0.7)))
        });
    });
}

fn benchmark_chunk_field(c: &mut Criterion) {
    let params = chunk_params();

    let mut group = c.benchmark_group("chunk_field");
    group.throughput(Throughput::Elements(243 * 243));
    group.sample_size(20);

    group.bench_function("generate_243x243_4_octaves", |b| {
        b.iter(|| black_box(noise::generate(243, 243, &params)));
    });

    group.finish();
}

fn benchmark_octave_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("octave_scaling");
    group.sample_size(20);

    for octaves in [1_u32, 4, 8] {
        let mut params = chunk_params();
        params.octaves = octaves;
        group.bench_function(format!("generate_121x121_{octaves}_octaves"), |b| {
            b.iter(|| black_box(noise::generate(121, 121, &params)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_sample,
    benchmark_chunk_field,
    benchmark_octave_scaling
);
criterion_main!(benches);
