//! Post-effect pipeline benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench postfx
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench postfx -- tick

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Vec3, Vec4};
use rein_postfx::{
    CpuBlitter, DepthCircleArea, DepthCircleController, DepthCircleScan, EffectKind, FrameClock,
    Image, PostFxManager, PostFxSettings, TimeStep, Tween, Tweener,
};

fn blitter() -> CpuBlitter {
    let mut blitter = CpuBlitter::new();
    for kind in [EffectKind::DepthCircleScan, EffectKind::DepthCircleArea] {
        blitter.register(kind.lookup_name(), |src, dst, _, _| {
            for (out, px) in dst.pixels_mut().iter_mut().zip(src.pixels()) {
                *out = [px[0] * 0.5, px[1], px[2], px[3]];
            }
        });
    }
    blitter
}

fn manager(size: u32) -> PostFxManager<CpuBlitter> {
    PostFxManager::new(blitter(), PostFxSettings::new().size(size, size))
}

// ---------------------------------------------------------------------------
// Frame composition
// ---------------------------------------------------------------------------

fn bench_tick(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("tick/pass_through");
        for &n in &[64, 256] {
            let mut fx = manager(n);
            let source = Image::filled(n, n, [0.2, 0.4, 0.6, 1.0]);
            let mut destination = Image::new(n, n);
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| {
                    fx.tick(&source, &mut destination);
                    fx.blitter_mut().clear_history();
                });
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("tick/scan_and_area");
        for &n in &[64, 256] {
            let mut fx = manager(n);
            fx.get_or_create::<DepthCircleArea>();
            fx.get_or_create::<DepthCircleScan>();
            let source = Image::filled(n, n, [0.2, 0.4, 0.6, 1.0]);
            let mut destination = Image::new(n, n);
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| {
                    fx.tick(&source, &mut destination);
                    fx.blitter_mut().clear_history();
                });
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

fn bench_tweener(c: &mut Criterion) {
    let mut group = c.benchmark_group("tweener/step");
    for &n in &[1usize, 16, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let mut tweener = Tweener::<f32>::new();
                    for i in 0..n {
                        tweener.start(
                            format!("channel {i}"),
                            Tween::new(0.0, 1.0, 10.0, |sum: &mut f32, v| *sum += v),
                        );
                    }
                    (tweener, 0.0f32)
                },
                |(mut tweener, mut sum)| {
                    for _ in 0..60 {
                        tweener.step(&mut sum, TimeStep::new(1.0 / 60.0));
                    }
                    sum
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_controller(c: &mut Criterion) {
    c.bench_function("controller/scan_frame", |b| {
        let mut fx = manager(64);
        let mut controller = DepthCircleController::default();
        let mut clock = FrameClock::new();
        let source = Image::filled(64, 64, [0.2, 0.4, 0.6, 1.0]);
        let mut destination = Image::new(64, 64);

        b.iter(|| {
            if !controller.is_animating() {
                controller.start_scan(&mut fx, Vec3::ZERO, Vec4::new(0.0, 1.0, 1.0, 1.0));
            }
            controller.update(&mut fx, clock.advance(1.0 / 60.0));
            fx.tick(&source, &mut destination);
            fx.blitter_mut().clear_history();
        });
    });
}

criterion_group!(benches, bench_tick, bench_tweener, bench_controller);
criterion_main!(benches);
