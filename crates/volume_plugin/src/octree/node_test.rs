use glam::Vec3;

use super::*;
use crate::octree::OctreeNodeSplitPolicy;
use crate::source::SphereSource;
use crate::types::VolumeSample;

fn volume(node: &OctreeNode) -> f32 {
  let size = node.to() - node.from();
  size.x * size.y * size.z
}

/// Recursively check the 0-or-8 invariant and exact octant tiling.
fn check_invariants(node: &OctreeNode) {
  let Some(children) = node.children() else {
    return;
  };
  let parent_volume = volume(node);
  let child_sum: f32 = children.iter().map(volume).sum();
  assert!(
    (parent_volume - child_sum).abs() <= parent_volume * 1e-5,
    "children must tile the parent exactly: parent {parent_volume}, children {child_sum}"
  );
  // Each child box must sit inside the parent box.
  for child in children.iter() {
    assert!(child.from().cmpge(node.from()).all());
    assert!(child.to().cmple(node.to()).all());
    check_invariants(child);
  }
}

#[test]
fn split_produces_zero_or_eight_children() {
  let src = SphereSource::new(Vec3::ZERO, 0.8);
  let policy = OctreeNodeSplitPolicy::new(&src, 0.25);
  let mut root = OctreeNode::new(Vec3::splat(-1.0), Vec3::splat(1.0));
  root.split(&policy, 0.1);
  assert!(root.is_subdivided(), "surface crosses the cell, must split");
  check_invariants(&root);
}

#[test]
fn octant_positions_follow_convention() {
  let mut root = OctreeNode::new(Vec3::ZERO, Vec3::splat(2.0));
  root.subdivide_for_test();
  let children = root.children().unwrap();
  // 0 lower back left, 1 lower back right, 2 lower front right, 3 lower
  // front left, then the same ring shifted up.
  assert_eq!(children[0].from(), Vec3::ZERO);
  assert_eq!(children[1].from(), Vec3::new(1.0, 0.0, 0.0));
  assert_eq!(children[2].from(), Vec3::new(1.0, 0.0, 1.0));
  assert_eq!(children[3].from(), Vec3::new(0.0, 0.0, 1.0));
  assert_eq!(children[4].from(), Vec3::new(0.0, 1.0, 0.0));
  assert_eq!(children[5].from(), Vec3::new(1.0, 1.0, 0.0));
  assert_eq!(children[6].from(), Vec3::new(1.0, 1.0, 1.0));
  assert_eq!(children[7].from(), Vec3::new(0.0, 1.0, 1.0));
  for child in children.iter() {
    assert_eq!(child.to() - child.from(), Vec3::splat(1.0));
  }
}

#[test]
fn geometric_accessors() {
  let node = OctreeNode::new(Vec3::ZERO, Vec3::splat(2.0));
  assert_eq!(node.center(), Vec3::splat(1.0));
  assert_eq!(node.center_back(), Vec3::new(1.0, 1.0, 0.0));
  assert_eq!(node.center_front(), Vec3::new(1.0, 1.0, 2.0));
  assert_eq!(node.center_left(), Vec3::new(0.0, 1.0, 1.0));
  assert_eq!(node.center_right(), Vec3::new(2.0, 1.0, 1.0));
  assert_eq!(node.center_top(), Vec3::new(1.0, 2.0, 1.0));
  assert_eq!(node.center_bottom(), Vec3::new(1.0, 0.0, 1.0));
  assert_eq!(node.center_back_bottom(), Vec3::new(1.0, 0.0, 0.0));
  assert_eq!(node.center_left_top(), Vec3::new(0.0, 2.0, 1.0));
  assert_eq!(node.center_front_right(), Vec3::new(2.0, 1.0, 2.0));
  assert_eq!(node.corner_1(), Vec3::new(2.0, 0.0, 0.0));
  assert_eq!(node.corner_5(), Vec3::new(2.0, 2.0, 0.0));
  assert_eq!(node.corner(6), node.to());
}

#[test]
fn border_tests_against_root() {
  let mut root = OctreeNode::new(Vec3::ZERO, Vec3::splat(2.0));
  root.subdivide_for_test();
  let children = root.children().unwrap();
  assert!(children[0].is_border_back(&root));
  assert!(children[0].is_border_left(&root));
  assert!(children[0].is_border_bottom(&root));
  assert!(!children[0].is_border_front(&root));
  assert!(!children[0].is_border_right(&root));
  assert!(!children[0].is_border_top(&root));
  assert!(children[6].is_border_front(&root));
  assert!(children[6].is_border_right(&root));
  assert!(children[6].is_border_top(&root));
}

#[test]
fn iso_surface_near_uses_density_and_diagonal() {
  let mut near = OctreeNode::new(Vec3::ZERO, Vec3::splat(1.0));
  near.set_center_value_for_test(VolumeSample::new(Vec3::X, 0.5));
  assert!(near.is_iso_surface_near());

  let mut far = OctreeNode::new(Vec3::ZERO, Vec3::splat(1.0));
  far.set_center_value_for_test(VolumeSample::new(Vec3::X, 100.0));
  assert!(!far.is_iso_surface_near());

  // Unsampled nodes are never culled.
  let unsampled = OctreeNode::new(Vec3::ZERO, Vec3::splat(1.0));
  assert!(unsampled.is_iso_surface_near());
}

#[test]
fn child_or_self_substitutes_leaves() {
  let mut root = OctreeNode::new(Vec3::ZERO, Vec3::splat(2.0));
  assert!(std::ptr::eq(root.child_or_self(3), &root));
  root.subdivide_for_test();
  let child3_from = root.children().unwrap()[3].from();
  assert_eq!(root.child_or_self(3).from(), child3_from);
}

#[test]
fn octree_grid_emits_12_segments_per_node() {
  let mut root = OctreeNode::new(Vec3::ZERO, Vec3::splat(2.0));
  assert_eq!(root.octree_grid().segment_count(), 12);
  root.subdivide_for_test();
  assert_eq!(root.octree_grid().segment_count(), 12 * 9);
}
