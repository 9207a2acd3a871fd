use std::sync::{Arc, Mutex};
use std::time::Duration;

use glam::Vec3;

use super::*;
use crate::camera::Camera;
use crate::source::{ConstantSource, PlaneSource, SphereSource};
use crate::types::Vertex;

fn sphere_parameters() -> ChunkParameters {
  ChunkParameters::new(Arc::new(SphereSource::new(Vec3::splat(0.5), 0.4)), 0.1)
}

#[test]
fn zero_base_error_is_rejected() {
  let handler = ChunkHandler::new();
  let parameters = ChunkParameters::new(Arc::new(ConstantSource::new(1.0)), 0.0);
  let result = Chunk::load(Vec3::ZERO, Vec3::ONE, 1, parameters, &handler);
  assert!(matches!(result, Err(LoadError::InvalidParameters)));
}

#[test]
fn zero_error_multiplicator_is_rejected() {
  let handler = ChunkHandler::new();
  let parameters = sphere_parameters().with_error_multiplicator(0.0);
  let result = Chunk::load(Vec3::ZERO, Vec3::ONE, 1, parameters, &handler);
  assert!(matches!(result, Err(LoadError::InvalidParameters)));
}

#[test]
fn sync_load_leaves_no_builds_in_flight() {
  let handler = ChunkHandler::new();
  let root = Chunk::load(Vec3::ZERO, Vec3::ONE, 3, sphere_parameters(), &handler).unwrap();
  assert_eq!(root.builds_in_flight(), 0);
  assert!(root.mesh().is_some());
  assert!(!root.invisible());
}

#[test]
fn constant_field_yields_no_visible_chunks() {
  let handler = ChunkHandler::new();
  let parameters = ChunkParameters::new(Arc::new(ConstantSource::new(1.0)), 0.1);
  let root = Chunk::load(Vec3::ZERO, Vec3::ONE, 1, parameters, &handler).unwrap();
  // The surface never crosses a constant field: zero triangles, invisible.
  assert!(root.invisible());
  assert!(root.mesh().is_none());
  let mut chunks = Vec::new();
  root.get_chunks_of_level(0, &mut chunks);
  assert!(chunks.is_empty());
}

#[test]
fn halfspace_produces_a_planar_quad_inside_the_cube() {
  let handler = ChunkHandler::new();
  let parameters = ChunkParameters::new(Arc::new(PlaneSource::new(Vec3::Z, 0.5)), 0.01);
  let root = Chunk::load(Vec3::ZERO, Vec3::ONE, 1, parameters, &handler).unwrap();

  let mesh = root.mesh().expect("plane chunk must hold geometry");
  assert!(mesh.triangle_count() >= 2);
  for vertex in &mesh.vertices {
    assert!((vertex.position.z - 0.5).abs() < 1e-4);
    assert!(vertex.position.x >= 0.0 && vertex.position.x <= 1.0);
    assert!(vertex.position.y >= 0.0 && vertex.position.y <= 1.0);
  }
}

#[test]
fn tree_shape_uses_octants_then_pass_through() {
  let handler = ChunkHandler::new();
  let root = Chunk::load(Vec3::ZERO, Vec3::ONE, 3, sphere_parameters(), &handler).unwrap();

  let ChunkChildren::Eight(children) = root.children() else {
    panic!("3 levels remaining must subdivide into octants");
  };
  for child in children.iter() {
    if child.invisible() && matches!(child.children(), ChunkChildren::None) {
      // Culled subtree; never built children.
      continue;
    }
    let ChunkChildren::PassThrough(grandchild) = child.children() else {
      panic!("2 levels remaining must use a single pass-through child");
    };
    assert_eq!(grandchild.from(), child.from());
    assert_eq!(grandchild.to(), child.to());
    assert_eq!(grandchild.level(), 1);
    assert!(matches!(grandchild.children(), ChunkChildren::None));
  }
}

#[test]
fn create_geometry_from_level_skips_coarse_levels() {
  let handler = ChunkHandler::new();
  let parameters = sphere_parameters().with_create_geometry_from_level(1);
  let root = Chunk::load(Vec3::ZERO, Vec3::ONE, 2, parameters, &handler).unwrap();

  // Level 2 is coarser than the threshold: placeholder without geometry.
  assert!(root.mesh().is_none());
  assert!(!root.invisible());
  let ChunkChildren::PassThrough(child) = root.children() else {
    panic!("expected pass-through child");
  };
  assert!(child.mesh().is_some());
}

fn any_visible(chunk: &Chunk) -> bool {
  chunk.visible() || chunk.children().as_slice().iter().any(any_visible)
}

fn count_visible(chunk: &Chunk) -> usize {
  usize::from(chunk.visible())
    + chunk
      .children()
      .as_slice()
      .iter()
      .map(count_visible)
      .sum::<usize>()
}

fn assert_exclusive(chunk: &Chunk) {
  if chunk.visible() {
    for child in chunk.children().as_slice() {
      assert!(
        !any_visible(child),
        "a visible chunk must have no visible descendants"
      );
    }
  } else {
    for child in chunk.children().as_slice() {
      assert_exclusive(child);
    }
  }
}

#[test]
fn lod_selection_shows_one_level_per_path() {
  let handler = ChunkHandler::new();
  let parameters = sphere_parameters().with_max_screen_space_error(20.0);
  let mut root = Chunk::load(Vec3::ZERO, Vec3::ONE, 3, parameters, &handler).unwrap();

  // Far away: a coarse level satisfies the error budget.
  let far = Camera::new(Vec3::splat(10.0), std::f32::consts::FRAC_PI_2, 1080.0);
  root.frame_started(&far);
  assert!(count_visible(&root) > 0);
  assert_exclusive(&root);

  // Up close: the budget forces descent to the finest available level.
  let near = Camera::new(Vec3::new(0.6, 0.5, 0.5), std::f32::consts::FRAC_PI_2, 1080.0);
  root.frame_started(&near);
  assert!(count_visible(&root) > 0);
  assert_exclusive(&root);
  assert!(!root.visible(), "root is too coarse this close");
}

#[test]
fn update_outside_region_preserves_geometry() {
  let handler = ChunkHandler::new();
  let parameters = ChunkParameters::new(Arc::new(PlaneSource::new(Vec3::Z, 0.5)), 0.01);
  let mut root = Chunk::load(Vec3::ZERO, Vec3::ONE, 1, parameters, &handler).unwrap();
  let triangles = root.mesh().unwrap().triangle_count();

  root.update(
    Aabb::new(Vec3::splat(5.0), Vec3::splat(6.0)),
    &handler,
  );
  assert_eq!(root.builds_in_flight(), 0);
  assert_eq!(
    root.mesh().expect("untouched chunk keeps its mesh").triangle_count(),
    triangles
  );

  // An overlapping region rebuilds to the same geometry for the same field.
  root.update(Aabb::new(Vec3::ZERO, Vec3::ONE), &handler);
  assert_eq!(root.builds_in_flight(), 0);
  assert_eq!(root.mesh().unwrap().triangle_count(), triangles);
}

#[test]
fn async_load_completes_via_process_work_queue() {
  let handler = ChunkHandler::new();
  let parameters = sphere_parameters().with_async_load(true);
  let mut root = Chunk::load(Vec3::ZERO, Vec3::ONE, 2, parameters, &handler).unwrap();

  let mut waited = Duration::ZERO;
  while root.builds_in_flight() > 0 {
    handler.process_work_queue(&mut root);
    std::thread::sleep(Duration::from_millis(5));
    waited += Duration::from_millis(5);
    assert!(waited < Duration::from_secs(10), "async load never completed");
  }
  assert!(root.mesh().is_some());
}

#[test]
fn shared_handler_keeps_per_tree_counters_balanced() {
  let handler = ChunkHandler::new();
  let parameters = sphere_parameters().with_async_load(true);
  let mut tree_a = Chunk::load(Vec3::ZERO, Vec3::ONE, 2, parameters.clone(), &handler).unwrap();
  let tree_b = Chunk::load(Vec3::ZERO, Vec3::ONE, 2, parameters, &handler).unwrap();

  // Drain everything through tree A. Completions belonging to tree B must
  // not be installed into A, and must still bring B's counter back down so
  // a pump loop on B can terminate.
  let mut waited = Duration::ZERO;
  while tree_a.builds_in_flight() > 0 || tree_b.builds_in_flight() > 0 {
    handler.process_work_queue(&mut tree_a);
    std::thread::sleep(Duration::from_millis(5));
    waited += Duration::from_millis(5);
    assert!(waited < Duration::from_secs(10), "a tree's counter never settled");
  }
  assert!(tree_a.mesh().is_some());
}

#[test]
fn update_while_builds_are_in_flight_settles_the_counter() {
  let handler = ChunkHandler::new();
  let parameters = sphere_parameters().with_async_load(true);
  let mut root = Chunk::load(Vec3::ZERO, Vec3::ONE, 3, parameters, &handler).unwrap();
  assert!(root.builds_in_flight() > 0);

  // Rebuild before any completion of the initial load was drained. The
  // stale completions must be discarded, not counted against the fresh
  // counter, or it wraps below zero and the pump loop never ends.
  root.update(Aabb::new(Vec3::ZERO, Vec3::ONE), &handler);

  let mut waited = Duration::ZERO;
  while root.builds_in_flight() > 0 {
    handler.process_work_queue(&mut root);
    std::thread::sleep(Duration::from_millis(5));
    waited += Duration::from_millis(5);
    assert!(waited < Duration::from_secs(10), "stale completions broke the counter");
  }
  assert_eq!(root.builds_in_flight(), 0);
  assert!(root.mesh().is_some());
}

struct RecordingCallback(Mutex<Vec<(ChunkId, Vec3, Vec3, usize)>>);

impl MeshBuilderCallback for RecordingCallback {
  fn on_level_ready(
    &self,
    owner: &MeshOwner,
    _vertices: &[Vertex],
    _indices: &[u32],
    level: usize,
    _in_flight: usize,
  ) {
    self
      .0
      .lock()
      .unwrap()
      .push((owner.chunk_id, owner.from, owner.to, level));
  }
}

fn box_of(chunk: &Chunk, id: ChunkId) -> Option<(Vec3, Vec3, u32)> {
  if chunk.id == id {
    return Some((chunk.from(), chunk.to(), chunk.level()));
  }
  chunk.children().as_slice().iter().find_map(|c| box_of(c, id))
}

#[test]
fn lod_callback_identifies_the_owning_chunk() {
  let handler = ChunkHandler::new();
  let callback = Arc::new(RecordingCallback(Mutex::new(Vec::new())));
  let parameters = sphere_parameters().with_lod_callback(callback.clone());
  let root = Chunk::load(Vec3::ZERO, Vec3::ONE, 2, parameters, &handler).unwrap();

  let calls = callback.0.lock().unwrap();
  assert!(!calls.is_empty());
  for (id, from, to, level) in calls.iter() {
    let (chunk_from, chunk_to, chunk_level) =
      box_of(&root, *id).expect("notification must name a chunk of this tree");
    assert_eq!(*from, chunk_from);
    assert_eq!(*to, chunk_to);
    assert_eq!(*level, chunk_level as usize);
  }
}

#[test]
fn chunks_of_level_counts_tree_depths() {
  let handler = ChunkHandler::new();
  let root = Chunk::load(Vec3::ZERO, Vec3::ONE, 3, sphere_parameters(), &handler).unwrap();

  let mut level0 = Vec::new();
  root.get_chunks_of_level(0, &mut level0);
  assert_eq!(level0.len(), 1);

  let mut level1 = Vec::new();
  root.get_chunks_of_level(1, &mut level1);
  assert!(!level1.is_empty());
  assert!(level1.len() <= 8);
}

#[test]
fn materials_propagate_per_level_and_recursively() {
  let handler = ChunkHandler::new();
  let mut root = Chunk::load(Vec3::ZERO, Vec3::ONE, 3, sphere_parameters(), &handler).unwrap();

  root.set_material("rock");
  fn all_have(chunk: &Chunk, name: &str) -> bool {
    chunk.material() == Some(name)
      && chunk.children().as_slice().iter().all(|c| all_have(c, name))
  }
  assert!(all_have(&root, "rock"));

  root.set_material_of_level(1, "rock_far");
  assert_eq!(root.material(), Some("rock"));
  for child in root.children().as_slice() {
    assert_eq!(child.material(), Some("rock_far"));
    for grandchild in child.children().as_slice() {
      assert_eq!(grandchild.material(), Some("rock"));
    }
  }
}

#[test]
fn visibility_toggles_gate_debug_line_lists() {
  let handler = ChunkHandler::new();
  let parameters = sphere_parameters()
    .with_octree_visualization(true)
    .with_dual_grid_visualization(true);
  let mut root = Chunk::load(Vec3::ZERO, Vec3::ONE, 1, parameters, &handler).unwrap();

  // Built, but hidden until toggled on.
  assert!(root.octree_visualization().is_none());
  assert!(root.dual_grid_visualization().is_none());

  root.set_octree_visible(true);
  root.set_dual_grid_visible(true);
  assert!(root.octree_visualization().is_some());
  let dual_grid = root.dual_grid_visualization().unwrap();
  assert!(dual_grid.segment_count() > 0);

  root.set_volume_visible(false);
  assert!(!root.volume_visible());
  assert!(!root.visible());
}
