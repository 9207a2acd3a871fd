//! Adaptive octree over one axis-aligned box of the density field.
//!
//! A node covers the half-open cell `[from, to)`. Internal nodes own exactly
//! 8 children covering the 8 octants; leaves hold a density sample taken at
//! the cell center. The octree is single-use scratch data: built by
//! [`OctreeNode::split`], consumed by the dual-grid generator, then dropped.
//!
//! # Octant convention
//!
//! Children are indexed 0..7, x growing right, y growing up, z growing to
//! the front:
//!
//! ```text
//!       4-------5        0 lower back  left    4 upper back  left
//!      /|      /|        1 lower back  right   5 upper back  right
//!     7-------6 |        2 lower front right   6 upper front right
//!     | 0-----|-1        3 lower front left    7 upper front left
//!     |/      |/
//!     3-------2      +y up, +x right, +z front
//! ```
//!
//! The corner/edge-midpoint/face-center accessors below are pure geometric
//! derivations from `from`/`to`; the dual-grid border stitching leans on
//! them heavily.

use glam::Vec3;

use crate::types::{LineList, VolumeSample};

use super::split_policy::{OctreeNodeSplitPolicy, SplitDecision};

/// One octree cell.
#[derive(Clone, Debug)]
pub struct OctreeNode {
  from: Vec3,
  to: Vec3,
  children: Option<Box<[OctreeNode; 8]>>,
  /// Center sample, only meaningful for leaves. `None` = not yet sampled.
  ///
  /// The original design reused an all-zero gradient as the "unsampled"
  /// sentinel, which collides with a legitimate flat sample; `Option` keeps
  /// the two states distinct.
  center_value: Option<VolumeSample>,
}

/// Midpoint and per-axis half-extent vectors of a cell, used to place the
/// 8 octant children.
pub fn children_dimensions(from: Vec3, to: Vec3) -> (Vec3, Vec3, Vec3, Vec3) {
  let center = (from + to) * 0.5;
  let half = center - from;
  let x_width = Vec3::new(half.x, 0.0, 0.0);
  let y_width = Vec3::new(0.0, half.y, 0.0);
  let z_width = Vec3::new(0.0, 0.0, half.z);
  (center, x_width, y_width, z_width)
}

impl OctreeNode {
  /// Create an unsplit node covering `[from, to)`.
  pub fn new(from: Vec3, to: Vec3) -> Self {
    debug_assert!(
      from.x <= to.x && from.y <= to.y && from.z <= to.z,
      "octree cell from must be <= to on all axes"
    );
    Self {
      from,
      to,
      children: None,
      center_value: None,
    }
  }

  /// True if this node has 8 children.
  #[inline]
  pub fn is_subdivided(&self) -> bool {
    self.children.is_some()
  }

  /// The 8 children, or `None` for a leaf.
  #[inline]
  pub fn children(&self) -> Option<&[OctreeNode; 8]> {
    self.children.as_deref()
  }

  /// Child `i` of a subdivided node, or the node itself when it is a leaf.
  ///
  /// This is the substitution step of the dual-contouring recursion: a leaf
  /// stands in for all of its would-be descendants.
  #[inline]
  pub fn child_or_self(&self, i: usize) -> &OctreeNode {
    match &self.children {
      Some(c) => &c[i],
      None => self,
    }
  }

  /// Cached center sample (leaves only).
  #[inline]
  pub fn center_value(&self) -> Option<VolumeSample> {
    self.center_value
  }

  /// Cheap cull for dual-cell emission: true if the surface could pass
  /// anywhere near this cell.
  ///
  /// An unsampled node counts as "near" so it is never skipped by mistake.
  pub fn is_iso_surface_near(&self) -> bool {
    match self.center_value {
      None => true,
      Some(sample) => sample.density.abs() < (self.to - self.from).length() * 2.0,
    }
  }

  // Box geometry -------------------------------------------------------------

  #[inline]
  pub fn from(&self) -> Vec3 {
    self.from
  }

  #[inline]
  pub fn to(&self) -> Vec3 {
    self.to
  }

  #[inline]
  pub fn center(&self) -> Vec3 {
    (self.from + self.to) * 0.5
  }

  // Corners. `from` is corner 0 and `to` is corner 6 of the octant ring.

  #[inline]
  pub fn corner_1(&self) -> Vec3 {
    Vec3::new(self.to.x, self.from.y, self.from.z)
  }

  #[inline]
  pub fn corner_2(&self) -> Vec3 {
    Vec3::new(self.to.x, self.from.y, self.to.z)
  }

  #[inline]
  pub fn corner_3(&self) -> Vec3 {
    Vec3::new(self.from.x, self.from.y, self.to.z)
  }

  #[inline]
  pub fn corner_4(&self) -> Vec3 {
    Vec3::new(self.from.x, self.to.y, self.from.z)
  }

  #[inline]
  pub fn corner_5(&self) -> Vec3 {
    Vec3::new(self.to.x, self.to.y, self.from.z)
  }

  #[inline]
  pub fn corner_7(&self) -> Vec3 {
    Vec3::new(self.from.x, self.to.y, self.to.z)
  }

  /// Corner `i` in octant order (0 = `from`, 6 = `to`).
  pub fn corner(&self, i: usize) -> Vec3 {
    match i {
      0 => self.from,
      1 => self.corner_1(),
      2 => self.corner_2(),
      3 => self.corner_3(),
      4 => self.corner_4(),
      5 => self.corner_5(),
      6 => self.to,
      7 => self.corner_7(),
      _ => unreachable!("corner index out of range"),
    }
  }

  // Face centers.

  #[inline]
  pub fn center_back(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(c.x, c.y, self.from.z)
  }

  #[inline]
  pub fn center_front(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(c.x, c.y, self.to.z)
  }

  #[inline]
  pub fn center_left(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(self.from.x, c.y, c.z)
  }

  #[inline]
  pub fn center_right(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(self.to.x, c.y, c.z)
  }

  #[inline]
  pub fn center_top(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(c.x, self.to.y, c.z)
  }

  #[inline]
  pub fn center_bottom(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(c.x, self.from.y, c.z)
  }

  // Edge midpoints.

  #[inline]
  pub fn center_back_top(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(c.x, self.to.y, self.from.z)
  }

  #[inline]
  pub fn center_back_bottom(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(c.x, self.from.y, self.from.z)
  }

  #[inline]
  pub fn center_back_left(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(self.from.x, c.y, self.from.z)
  }

  #[inline]
  pub fn center_back_right(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(self.to.x, c.y, self.from.z)
  }

  #[inline]
  pub fn center_front_top(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(c.x, self.to.y, self.to.z)
  }

  #[inline]
  pub fn center_front_bottom(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(c.x, self.from.y, self.to.z)
  }

  #[inline]
  pub fn center_front_left(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(self.from.x, c.y, self.to.z)
  }

  #[inline]
  pub fn center_front_right(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(self.to.x, c.y, self.to.z)
  }

  #[inline]
  pub fn center_left_top(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(self.from.x, self.to.y, c.z)
  }

  #[inline]
  pub fn center_left_bottom(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(self.from.x, self.from.y, c.z)
  }

  #[inline]
  pub fn center_right_top(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(self.to.x, self.to.y, c.z)
  }

  #[inline]
  pub fn center_right_bottom(&self) -> Vec3 {
    let c = self.center();
    Vec3::new(self.to.x, self.from.y, c.z)
  }

  // Border tests against the octree root's own faces.

  #[inline]
  pub fn is_border_back(&self, root: &OctreeNode) -> bool {
    self.from.z == root.from.z
  }

  #[inline]
  pub fn is_border_front(&self, root: &OctreeNode) -> bool {
    self.to.z == root.to.z
  }

  #[inline]
  pub fn is_border_left(&self, root: &OctreeNode) -> bool {
    self.from.x == root.from.x
  }

  #[inline]
  pub fn is_border_right(&self, root: &OctreeNode) -> bool {
    self.to.x == root.to.x
  }

  #[inline]
  pub fn is_border_top(&self, root: &OctreeNode) -> bool {
    self.to.y == root.to.y
  }

  #[inline]
  pub fn is_border_bottom(&self, root: &OctreeNode) -> bool {
    self.from.y == root.from.y
  }

  // Splitting -----------------------------------------------------------------

  /// Recursively split this node according to `policy`.
  ///
  /// Leaves end up with a sampled center value; internal nodes end up with
  /// exactly 8 children, each covering one octant.
  pub fn split(&mut self, policy: &OctreeNodeSplitPolicy<'_>, geometric_error: f32) {
    match policy.decide(self.from, self.to, geometric_error) {
      SplitDecision::Leaf(sample) => {
        if self.center_value.is_none() {
          self.center_value = Some(sample);
        }
      }
      SplitDecision::Split => {
        let (center, xw, yw, zw) = children_dimensions(self.from, self.to);
        let mut children = Box::new([
          OctreeNode::new(self.from, center),
          OctreeNode::new(self.from + xw, center + xw),
          OctreeNode::new(self.from + xw + zw, center + xw + zw),
          OctreeNode::new(self.from + zw, center + zw),
          OctreeNode::new(self.from + yw, center + yw),
          OctreeNode::new(self.from + yw + xw, center + yw + xw),
          OctreeNode::new(self.from + yw + xw + zw, center + yw + xw + zw),
          OctreeNode::new(self.from + yw + zw, center + yw + zw),
        ]);
        for child in children.iter_mut() {
          child.split(policy, geometric_error);
        }
        self.children = Some(children);
      }
    }
  }

  /// Count the leaves of this subtree.
  pub fn leaf_count(&self) -> usize {
    match &self.children {
      None => 1,
      Some(c) => c.iter().map(OctreeNode::leaf_count).sum(),
    }
  }

  /// Emit the cell edges of every node in this subtree as line segments.
  pub fn octree_grid(&self) -> LineList {
    let mut lines = LineList::new();
    self.add_grid_lines(&mut lines);
    lines
  }

  fn add_grid_lines(&self, lines: &mut LineList) {
    let corners = [
      self.from,
      self.corner_1(),
      self.corner_2(),
      self.corner_3(),
      self.corner_4(),
      self.corner_5(),
      self.to,
      self.corner_7(),
    ];
    lines.add_box(&corners);
    if let Some(children) = &self.children {
      for child in children.iter() {
        child.add_grid_lines(lines);
      }
    }
  }

  #[cfg(test)]
  pub(crate) fn set_center_value_for_test(&mut self, sample: VolumeSample) {
    self.center_value = Some(sample);
  }

  #[cfg(test)]
  pub(crate) fn subdivide_for_test(&mut self) {
    let (center, xw, yw, zw) = children_dimensions(self.from, self.to);
    self.children = Some(Box::new([
      OctreeNode::new(self.from, center),
      OctreeNode::new(self.from + xw, center + xw),
      OctreeNode::new(self.from + xw + zw, center + xw + zw),
      OctreeNode::new(self.from + zw, center + zw),
      OctreeNode::new(self.from + yw, center + yw),
      OctreeNode::new(self.from + yw + xw, center + yw + xw),
      OctreeNode::new(self.from + yw + xw + zw, center + yw + xw + zw),
      OctreeNode::new(self.from + yw + zw, center + yw + zw),
    ]));
  }

  #[cfg(test)]
  pub(crate) fn children_mut_for_test(&mut self) -> Option<&mut [OctreeNode; 8]> {
    self.children.as_deref_mut()
  }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
