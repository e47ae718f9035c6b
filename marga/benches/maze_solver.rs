//! Planning Benchmarks
//!
//! - Maze solving: open grid, single block, wall with a gap
//! - Segmentation of a long path through scattered blocks
//!
//! Run with: `cargo bench`
//! View HTML reports in: `target/criterion/`

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

use marga::core::{Capsule, WorldPoint};
use marga::maze::{MazeLimits, solve_maze};
use marga::path::segment_path;
use marga::query::{ProbeConfig, Prober, RetryPolicy};
use marga::sim::{SimBox, SimWorld};

// ============================================================================
// Fixtures
// ============================================================================

fn pt(x: f32, y: f32) -> WorldPoint {
    WorldPoint::new(x, y, 0.0)
}

fn probe_config() -> ProbeConfig {
    ProbeConfig {
        retry: RetryPolicy::immediate(1),
        ..ProbeConfig::default()
    }
}

/// Wall across the path at x = 10 with a 2 m gap at y = 6.
fn gap_wall_world() -> SimWorld {
    let mut world = SimWorld::flat(0.0);
    world.add_box(SimBox::obstacle(
        WorldPoint::new(9.5, -12.0, 0.0),
        WorldPoint::new(10.5, 5.0, 3.0),
    ));
    world.add_box(SimBox::obstacle(
        WorldPoint::new(9.5, 7.0, 0.0),
        WorldPoint::new(10.5, 12.0, 3.0),
    ));
    world
}

/// Blocks every 8 m along the x axis.
fn scattered_world() -> SimWorld {
    let mut world = SimWorld::flat(0.0);
    for i in 1..8 {
        world.add_box(SimBox::centred(i as f32 * 8.0, 0.0, 2.0, 2.0, 3.0));
    }
    world
}

// ============================================================================
// Maze
// ============================================================================

fn bench_maze(c: &mut Criterion) {
    let mut group = c.benchmark_group("maze");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(3));
    group.warm_up_time(Duration::from_secs(1));

    let capsule = Capsule::new(1.0, 2.0);
    let limits = MazeLimits::default();

    let open = SimWorld::flat(0.0);
    group.bench_function("open/10m", |b| {
        let prober = Prober::new(&open, capsule, probe_config());
        b.iter(|| solve_maze(&prober, black_box(pt(0.0, 0.0)), black_box(pt(10.0, 0.0)), &limits))
    });

    let mut block = SimWorld::flat(0.0);
    block.add_box(SimBox::centred(10.0, 0.0, 4.0, 4.0, 4.0));
    group.bench_function("block/7m", |b| {
        let prober = Prober::new(&block, capsule, probe_config());
        b.iter(|| solve_maze(&prober, black_box(pt(7.0, 0.0)), black_box(pt(14.0, 0.0)), &limits))
    });

    let gap = gap_wall_world();
    group.bench_function("gap_wall/16m", |b| {
        let prober = Prober::new(&gap, capsule, probe_config());
        b.iter(|| solve_maze(&prober, black_box(pt(2.0, 0.0)), black_box(pt(18.0, 0.0)), &limits))
    });

    group.finish();
}

// ============================================================================
// Segmentation
// ============================================================================

fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(3));
    group.warm_up_time(Duration::from_secs(1));

    let world = scattered_world();
    let prober = Prober::new(&world, Capsule::new(1.0, 2.0), probe_config());
    let path = [pt(0.0, 0.0), pt(64.0, 0.0)];
    group.bench_function("scattered/64m", |b| {
        b.iter(|| segment_path(&prober, black_box(&path)))
    });

    group.finish();
}

criterion_group!(benches, bench_maze, bench_segmentation);
criterion_main!(benches);
