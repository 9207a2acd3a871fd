use glam::Vec3;

use super::*;

#[test]
fn welding_is_idempotent() {
  let mut builder = MeshBuilder::new();
  let n = Vec3::Y;
  builder.add_triangle(Vec3::ZERO, n, Vec3::X, n, Vec3::Z, n);
  builder.add_triangle(Vec3::ZERO, n, Vec3::X, n, Vec3::Z, n);
  // Same three (position, normal) pairs twice: 3 vertices, 6 indices.
  assert_eq!(builder.vertex_count(), 3);
  assert_eq!(builder.triangle_count(), 2);
  let mesh = builder.generate_buffers();
  match mesh.indices {
    IndexBuffer::U16(ref indices) => {
      assert_eq!(indices.len() % 3, 0);
      assert_eq!(&indices[0..3], &indices[3..6]);
    }
    IndexBuffer::U32(_) => panic!("small mesh must use 16-bit indices"),
  }
}

#[test]
fn different_normal_means_different_vertex() {
  let mut builder = MeshBuilder::new();
  builder.add_triangle(Vec3::ZERO, Vec3::Y, Vec3::X, Vec3::Y, Vec3::Z, Vec3::Y);
  builder.add_triangle(Vec3::ZERO, Vec3::X, Vec3::X, Vec3::Y, Vec3::Z, Vec3::Y);
  // Position Vec3::ZERO appears with two distinct normals.
  assert_eq!(builder.vertex_count(), 4);
}

#[test]
fn indices_always_in_range() {
  let mut builder = MeshBuilder::new();
  for i in 0..10 {
    let offset = Vec3::splat(i as f32);
    builder.add_triangle(
      offset,
      Vec3::Y,
      offset + Vec3::X,
      Vec3::Y,
      offset + Vec3::Z,
      Vec3::Y,
    );
  }
  let mesh = builder.generate_buffers();
  let vertex_count = mesh.vertices.len();
  match mesh.indices {
    IndexBuffer::U16(indices) => {
      assert!(indices.iter().all(|&i| (i as usize) < vertex_count));
    }
    IndexBuffer::U32(indices) => {
      assert!(indices.iter().all(|&i| (i as usize) < vertex_count));
    }
  }
}

#[test]
fn bounding_box_matches_inserted_positions() {
  let mut builder = MeshBuilder::new();
  builder.add_triangle(
    Vec3::new(-1.0, 2.0, 0.5),
    Vec3::Y,
    Vec3::new(3.0, -4.0, 1.0),
    Vec3::Y,
    Vec3::new(0.0, 0.0, 7.0),
    Vec3::Y,
  );
  let bounds = builder.bounding_box();
  assert_eq!(bounds.min, Vec3::new(-1.0, -4.0, 0.5));
  assert_eq!(bounds.max, Vec3::new(3.0, 2.0, 7.0));
}

#[test]
fn untouched_builder_has_empty_bounds_and_mesh() {
  let builder = MeshBuilder::new();
  assert!(builder.bounding_box().is_empty());
  let mesh = builder.generate_buffers();
  assert!(mesh.is_empty());
  assert_eq!(mesh.triangle_count(), 0);
}

struct CountingCallback(std::sync::atomic::AtomicUsize);

impl MeshBuilderCallback for CountingCallback {
  fn on_level_ready(
    &self,
    owner: &MeshOwner,
    vertices: &[Vertex],
    indices: &[u32],
    level: usize,
    in_flight: usize,
  ) {
    assert_eq!(owner.chunk_id, 7);
    assert_eq!(owner.from, Vec3::ZERO);
    assert_eq!(owner.to, Vec3::ONE);
    assert_eq!(vertices.len(), 3);
    assert_eq!(indices.len(), 3);
    assert_eq!(level, 2);
    assert_eq!(in_flight, 1);
    self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
  }
}

#[test]
fn callback_receives_owner_and_accumulated_geometry() {
  let mut builder = MeshBuilder::new();
  builder.add_triangle(Vec3::ZERO, Vec3::Y, Vec3::X, Vec3::Y, Vec3::Z, Vec3::Y);
  let callback = CountingCallback(std::sync::atomic::AtomicUsize::new(0));
  let owner = MeshOwner {
    chunk_id: 7,
    from: Vec3::ZERO,
    to: Vec3::ONE,
  };
  builder.execute_callback(&callback, owner, 2, 1);
  assert_eq!(callback.0.load(std::sync::atomic::Ordering::SeqCst), 1);
}
