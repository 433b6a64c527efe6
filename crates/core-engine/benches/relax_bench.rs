//! Single-worker relaxation step across subgrid sizes. No mesh links, so
//! this isolates the in-place stencil sweep from channel rendezvous.

use core_engine::relaxation_step;
use core_grid::{InitialValues, Subgrid};
use core_mesh::NeighborLinks;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn mean_of_neighbors(g: &Subgrid<f64>, i: usize, j: usize) -> f64 {
    0.25 * (g.get(i - 1, j) + g.get(i + 1, j) + g.get(i, j - 1) + g.get(i, j + 1))
}

fn relax_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("relaxation_step");
    for m in [16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(m), &m, |b, &m| {
            let initial = InitialValues {
                north: 1.0,
                south: 0.0,
                west: 0.0,
                east: 0.0,
                interior: 0.0,
            };
            let mut sub = Subgrid::from_initial_values(m, m, (0, 0), &initial);
            let links = NeighborLinks::default();
            b.iter(|| relaxation_step(&mut sub, &links, &mean_of_neighbors).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, relax_step);
criterion_main!(benches);
