//! Benchmarks for the CPU side of a frame.
//!
//! Run with: `cargo bench`

use ambient_field::engine::find_links;
use ambient_field::prelude::*;
use ambient_field::spatial::SpatialGrid;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn seeded_on<C: Canvas2d>(canvas: &mut C, width: f32, height: f32, cap: usize) -> Engine {
    let mut config = EngineConfig::default().with_seed(3);
    config.max_particles_narrow = cap;
    config.max_particles_wide = cap;
    config.area_per_particle = 1.0;

    let mut engine = Engine::new(Theme::Light, config);
    engine.resize(canvas, width, height, 1.0);
    engine
}

fn seeded_engine(width: f32, height: f32, cap: usize) -> (Engine, RecordingCanvas) {
    let mut canvas = RecordingCanvas::new();
    let engine = seeded_on(&mut canvas, width, height, cap);
    (engine, canvas)
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_step");

    for count in [60usize, 500, 2000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let (mut engine, _) = seeded_engine(1920.0, 1080.0, count);
            b.iter(|| {
                engine.step();
                black_box(engine.links().len())
            })
        });
    }

    group.finish();
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_grid");
    let (engine, _) = seeded_engine(1920.0, 1080.0, 500);
    let positions: Vec<Vec2> = engine.particles().iter().map(|p| p.position).collect();

    group.bench_function("rebuild_500", |b| {
        let mut grid = SpatialGrid::new(150.0);
        b.iter(|| grid.rebuild(black_box(positions.iter().copied())))
    });

    group.bench_function("find_links_500", |b| {
        let mut grid = SpatialGrid::new(150.0);
        grid.rebuild(positions.iter().copied());
        let mut links = Vec::new();
        b.iter(|| {
            find_links(engine.particles(), &grid, 150.0, 0.4, &mut links);
            black_box(links.len())
        })
    });

    group.finish();
}

fn bench_paint(c: &mut Criterion) {
    let mut group = c.benchmark_group("paint");

    group.bench_function("recording_60", |b| {
        let (mut engine, mut canvas) = seeded_engine(1280.0, 720.0, 60);
        engine.step();
        b.iter(|| {
            canvas.clear();
            engine.paint(&mut canvas);
            black_box(canvas.calls().len())
        })
    });

    group.bench_function("raster_60_720p", |b| {
        let mut canvas = PixelCanvas::new(0, 0);
        let mut engine = seeded_on(&mut canvas, 1280.0, 720.0, 60);
        engine.step();
        b.iter(|| {
            engine.paint(&mut canvas);
            black_box(canvas.pixel(0, 0))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_step, bench_grid, bench_paint);
criterion_main!(benches);
