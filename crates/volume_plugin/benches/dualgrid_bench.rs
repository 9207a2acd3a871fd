//! Benchmarks for the octree split and dual-grid contouring pipeline.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;

use volume_plugin::{
  DualGridGenerator, IsoSurface, MeshBuilder, OctreeNode, OctreeNodeSplitPolicy, SphereSource,
};

fn split_octree(source: &SphereSource, min_cell_size: f32, geometric_error: f32) -> OctreeNode {
  let policy = OctreeNodeSplitPolicy::new(source, min_cell_size);
  let mut root = OctreeNode::new(Vec3::ZERO, Vec3::splat(32.0));
  root.split(&policy, geometric_error);
  root
}

fn bench_octree_split(c: &mut Criterion) {
  let source = SphereSource::new(Vec3::splat(16.0), 12.0);
  let mut group = c.benchmark_group("octree_split");
  for &min_cell_size in &[2.0f32, 1.0, 0.5] {
    group.bench_with_input(
      BenchmarkId::from_parameter(min_cell_size),
      &min_cell_size,
      |b, &min_cell_size| {
        b.iter(|| split_octree(&source, min_cell_size, 1.0));
      },
    );
  }
  group.finish();
}

fn bench_dual_grid(c: &mut Criterion) {
  let source = SphereSource::new(Vec3::splat(16.0), 12.0);
  let mut group = c.benchmark_group("dual_grid");
  for &min_cell_size in &[2.0f32, 1.0] {
    let root = split_octree(&source, min_cell_size, 1.0);
    group.bench_with_input(
      BenchmarkId::from_parameter(min_cell_size),
      &root,
      |b, root| {
        let iso = IsoSurface::new(&source);
        b.iter(|| {
          let mut builder = MeshBuilder::new();
          let mut generator = DualGridGenerator::new();
          generator.generate_dual_grid(
            root,
            &iso,
            &mut builder,
            0.0,
            root.from(),
            root.to(),
            false,
          );
          builder.triangle_count()
        });
      },
    );
  }
  group.finish();
}

criterion_group!(benches, bench_octree_split, bench_dual_grid);
criterion_main!(benches);
