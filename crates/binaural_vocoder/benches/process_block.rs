use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use binaural_vocoder::*;

const BLOCK_SIZE: usize = 512;

fn unit_impulse_store() -> HrirStore {
    let mut samples = vec![0.0f32; config::HRIR_LENGTH];
    samples[0] = 1.0;
    HrirStore::from_impulse_responses(
        (0..config::HRIR_COUNT)
            .map(|_| Some(ImpulseResponse::from_channels(vec![samples.clone(), samples.clone()])))
            .collect(),
    )
}

pub fn process_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_block");
    group.throughput(Throughput::Elements(BLOCK_SIZE as u64));

    let input = (0..BLOCK_SIZE)
        .map(|i| (i as f32 * 0.05).sin())
        .collect::<Vec<_>>();

    for mode in [
        EffectMode::PassThrough,
        EffectMode::Robotisation,
        EffectMode::Whisperisation,
    ] {
        group.bench_with_input(
            criterion::BenchmarkId::from_parameter(format!("{mode:?}")),
            &mode,
            |b, mode| {
                let mut engine = BinauralEngine::default();
                engine.set_hrir_store(unit_impulse_store());
                engine.prepare(48000.0, BLOCK_SIZE).unwrap();

                let mut left = vec![0.0f32; BLOCK_SIZE];
                let mut right = vec![0.0f32; BLOCK_SIZE];
                let controls = Controls {
                    azimuth: 0.7,
                    elevation: 20.0,
                    distance: 3.0,
                    effect_mode: *mode,
                    ..Default::default()
                };

                b.iter(|| {
                    engine.process(&[&input[..]], [&mut left[..], &mut right[..]], controls);
                    black_box(&left);
                    black_box(&right);
                });
            },
        );
    }
}

pub fn blend(c: &mut Criterion) {
    let store = unit_impulse_store();
    let mut blender = SpectralBlender::new(config::HRIR_LENGTH);
    let mut out = BlendedImpulseResponse::new(config::HRIR_LENGTH);

    c.bench_function("blend_stereo", |b| {
        b.iter(|| {
            let quad = select(black_box(0.7), black_box(20.0));
            blender.blend_stereo(quad.ids().map(|id| store.get(id)), &mut out);
            black_box(&out);
        });
    });
}

criterion_group!(benches, process_block, blend);
criterion_main!(benches);
