/*
 * Flocking Benchmark
 *
 * Measures the hot paths of a simulation step: the spatial grid query, a
 * full fixed step (sequential and parallel read phase) and flock grouping.
 */

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use flocking::grouping::compute_groups;
use flocking::{LayerMask, NeighborBuffer, SimulationParams, Simulation, SpatialGrid, SpatialQuery};

const SIZES: [usize; 4] = [150, 500, 1000, 2000];

// Keep the density of the 150-boid reference scene as the population grows
fn params_for(num_boids: usize, parallel: bool) -> SimulationParams {
    SimulationParams {
        num_boids,
        spawn_radius: 0.3 * (num_boids as f32 / 150.0).cbrt() * 4.0,
        enable_parallel: parallel,
        seed: Some(17),
        ..Default::default()
    }
}

fn random_positions(n: usize, extent: f32) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(5);
    (0..n)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
            )
        })
        .collect()
}

fn bench_spatial_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_grid");

    for &n in &SIZES {
        let positions = random_positions(n, 2.0);
        let mut grid = SpatialGrid::new(0.6);
        grid.rebuild(&positions);
        let mut buffer = NeighborBuffer::default();

        group.bench_with_input(BenchmarkId::new("rebuild", n), &positions, |b, positions| {
            b.iter(|| grid.rebuild(black_box(positions)));
        });

        group.bench_with_input(BenchmarkId::new("query_all", n), &positions, |b, positions| {
            b.iter(|| {
                for &p in positions {
                    grid.query_neighbors(p, 0.6, LayerMask::default(), &mut buffer);
                    black_box(buffer.len());
                }
            });
        });
    }

    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    for &n in &SIZES {
        for (label, parallel) in [("sequential", false), ("parallel", true)] {
            let params = params_for(n, parallel);
            let Ok(mut simulation) = Simulation::new(&params) else {
                continue;
            };
            let dt = params.fixed_dt();

            group.bench_function(BenchmarkId::new(label, n), |b| {
                b.iter(|| black_box(simulation.step(dt)).ok());
            });
        }
    }

    group.finish();
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");

    for &n in &SIZES {
        let params = params_for(n, true);
        let Ok(mut simulation) = Simulation::new(&params) else {
            continue;
        };
        // Let neighbor lists settle into flocks first
        for _ in 0..50 {
            if simulation.step(params.fixed_dt()).is_err() {
                break;
            }
        }

        group.bench_with_input(BenchmarkId::from_parameter(n), simulation.boids(), |b, boids| {
            b.iter(|| black_box(compute_groups(boids)).ok());
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));
    targets = bench_spatial_grid, bench_step, bench_grouping
}

criterion_main!(benches);
