//! Benchmarks for the wall pipeline stages.

use criterion::{criterion_group, criterion_main, Criterion};
use gridwall::algo::clean::remove_unreferenced_vertices;
use gridwall::algo::dissolve::{dissolve_coplanar, DissolveOptions};
use gridwall::algo::extrude::extrude;
use gridwall::prelude::*;

/// A floor plan of `n x n` rooms, each 8 cells wide, with a door in every
/// inner wall.
fn create_floor_plan(n: usize) -> OccupancyGrid {
    let size = n * 8 + 1;
    OccupancyGrid::from_fn(size, size, |r, c| {
        let wall_row = r % 8 == 0;
        let wall_col = c % 8 == 0;
        let door = (wall_row && c % 8 == 4) || (wall_col && r % 8 == 4);
        let outer = r == 0 || c == 0 || r == size - 1 || c == size - 1;
        (wall_row || wall_col) && (!door || outer)
    })
    .unwrap()
}

fn bench_stages(c: &mut Criterion) {
    let grid = create_floor_plan(12);
    let lattice: PolyMesh = build_quad_mesh(&grid).unwrap();
    let quads = remove_unreferenced_vertices(&lattice);
    let merged = dissolve_coplanar(&quads, &DissolveOptions::default());

    c.bench_function("build_quad_mesh_97x97", |b| {
        b.iter(|| {
            let mesh: PolyMesh = build_quad_mesh(&grid).unwrap();
            mesh
        });
    });

    c.bench_function("remove_unreferenced_97x97", |b| {
        b.iter(|| remove_unreferenced_vertices(&lattice));
    });

    c.bench_function("dissolve_coplanar_97x97", |b| {
        b.iter(|| dissolve_coplanar(&quads, &DissolveOptions::default()));
    });

    c.bench_function("extrude_97x97", |b| {
        b.iter(|| extrude(&merged, 2.0));
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let grid = create_floor_plan(24);
    let placement = Placement::new(0.05, -5.0, -5.0, 0.1);

    c.bench_function("build_wall_193x193", |b| {
        b.iter(|| {
            let model: WallModel = build_wall(&grid, &placement, &WallOptions::default()).unwrap();
            model
        });
    });
}

criterion_group!(benches, bench_stages, bench_pipeline);
criterion_main!(benches);
