use glam::Vec3;

use super::*;
use crate::source::{ConstantSource, PlaneSource};

fn unit_cell() -> [Vec3; 8] {
  [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(0.0, 1.0, 1.0),
  ]
}

#[test]
fn marching_cubes_emits_nothing_for_homogeneous_cell() {
  let src = ConstantSource::new(5.0);
  let iso = IsoSurface::new(&src);
  let mut builder = crate::mesh::MeshBuilder::new();
  iso.add_marching_cubes_triangles(&unit_cell(), None, &mut builder);
  assert_eq!(builder.triangle_count(), 0);
}

#[test]
fn marching_cubes_plane_crossing() {
  // Solid below z = 0.5: the 4 back corners are inside, the front 4 outside.
  let src = PlaneSource::new(Vec3::Z, 0.5);
  let iso = IsoSurface::new(&src);
  let mut builder = crate::mesh::MeshBuilder::new();
  iso.add_marching_cubes_triangles(&unit_cell(), None, &mut builder);
  assert!(builder.triangle_count() >= 2, "a quad's worth of triangles");

  let mesh = builder.generate_buffers();
  for vertex in &mesh.vertices {
    assert!(
      (vertex.position.z - 0.5).abs() < 1e-5,
      "plane intersection must land at z = 0.5, got {}",
      vertex.position.z
    );
    assert!(vertex.position.x >= 0.0 && vertex.position.x <= 1.0);
    assert!(vertex.position.y >= 0.0 && vertex.position.y <= 1.0);
    // Normal points out of the solid, towards +z.
    assert!(vertex.normal.z > 0.9);
  }
}

#[test]
fn marching_cubes_uses_cached_values_over_source() {
  // Cached samples say "all inside" although the source says otherwise; the
  // cache must win.
  let src = PlaneSource::new(Vec3::Z, 0.5);
  let iso = IsoSurface::new(&src);
  let cached: [Option<crate::types::VolumeSample>; 8] =
    std::array::from_fn(|_| Some(crate::types::VolumeSample::new(Vec3::Z, 1.0)));
  let mut builder = crate::mesh::MeshBuilder::new();
  iso.add_marching_cubes_triangles(&unit_cell(), Some(&cached), &mut builder);
  assert_eq!(builder.triangle_count(), 0);
}

#[test]
fn marching_squares_emits_in_plane_skirt() {
  // Solid where x < 0.5. Bottom face ring crosses the surface twice.
  let src = PlaneSource::new(Vec3::X, 0.5);
  let iso = IsoSurface::new(&src);
  let mut builder = crate::mesh::MeshBuilder::new();
  iso.add_marching_squares_triangles(
    &unit_cell(),
    None,
    DualCellFace::Bottom,
    10.0,
    &mut builder,
  );
  assert!(builder.triangle_count() >= 1);

  let mesh = builder.generate_buffers();
  for vertex in &mesh.vertices {
    assert_eq!(vertex.position.y, 0.0, "skirt stays on the face plane");
    assert!(vertex.position.x <= 0.5 + 1e-5, "skirt covers the solid side only");
  }
}

#[test]
fn marching_squares_respects_max_distance() {
  let src = PlaneSource::new(Vec3::X, 50.0);
  let iso = IsoSurface::new(&src);
  let mut builder = crate::mesh::MeshBuilder::new();
  // Face is ~49.5 away from the surface, budget is 1: no seam.
  iso.add_marching_squares_triangles(&unit_cell(), None, DualCellFace::Bottom, 1.0, &mut builder);
  assert_eq!(builder.triangle_count(), 0);
}

#[test]
fn marching_squares_is_symmetric_across_a_shared_face() {
  // Two cells stacked in z share the face z = 1. The skirt generated from
  // the back cell's Front face and the front cell's Back face must weld to
  // identical vertices.
  let src = PlaneSource::new(Vec3::X, 0.5);
  let iso = IsoSurface::new(&src);

  let back_cell = unit_cell();
  let front_cell: [Vec3; 8] = std::array::from_fn(|i| unit_cell()[i] + Vec3::Z);

  let mut builder = crate::mesh::MeshBuilder::new();
  iso.add_marching_squares_triangles(&back_cell, None, DualCellFace::Front, 10.0, &mut builder);
  let vertices_after_one_side = builder.vertex_count();
  assert!(vertices_after_one_side > 0);
  iso.add_marching_squares_triangles(&front_cell, None, DualCellFace::Back, 10.0, &mut builder);
  assert_eq!(
    builder.vertex_count(),
    vertices_after_one_side,
    "second side must weld onto the first side's vertices"
  );
}
