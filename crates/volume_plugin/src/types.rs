//! Core data types for volume meshing.

use glam::Vec3;

/// One sample of the density field: the local gradient plus the scalar
/// density at the sampled point.
///
/// Positive density = inside the volume, negative = outside; the iso-surface
/// sits where the density crosses zero. The gradient points towards
/// increasing density, so surface normals are the *negated* normalized
/// gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeSample {
  /// Gradient of the density field at the sample point.
  pub gradient: Vec3,
  /// Scalar density at the sample point.
  pub density: f32,
}

impl VolumeSample {
  pub fn new(gradient: Vec3, density: f32) -> Self {
    Self { gradient, density }
  }
}

/// Output vertex: position plus surface normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
  pub position: Vec3,
  pub normal: Vec3,
}

impl Vertex {
  pub fn new(position: Vec3, normal: Vec3) -> Self {
    Self { position, normal }
  }
}

/// Axis-aligned bounding box, empty-aware.
///
/// `Aabb::empty()` has inverted extents so that the first `encapsulate`
/// sets both corners. An empty box is distinct from a degenerate box at the
/// origin: a mesh builder that never received a triangle reports an empty
/// box, not a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
  /// Minimum corner (inclusive).
  pub min: Vec3,
  /// Maximum corner (inclusive).
  pub max: Vec3,
}

impl Aabb {
  /// Create a new AABB from min and max corners.
  ///
  /// # Panics
  /// Debug-asserts that min <= max on all axes.
  pub fn new(min: Vec3, max: Vec3) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y && min.z <= max.z,
      "AABB min must be <= max on all axes"
    );
    Self { min, max }
  }

  /// Create an AABB with inverted extents (ready for encapsulation).
  pub fn empty() -> Self {
    Self {
      min: Vec3::INFINITY,
      max: Vec3::NEG_INFINITY,
    }
  }

  /// True if no point was ever encapsulated.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.min.x > self.max.x
  }

  /// Expand to include a point.
  #[inline]
  pub fn encapsulate(&mut self, point: Vec3) {
    self.min = self.min.min(point);
    self.max = self.max.max(point);
  }

  /// Check overlap with another box. Touching at a boundary counts.
  #[inline]
  pub fn overlaps(&self, other: &Aabb) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
      && self.min.z <= other.max.z
      && self.max.z >= other.min.z
  }

  /// Center of the box.
  #[inline]
  pub fn center(&self) -> Vec3 {
    (self.min + self.max) * 0.5
  }

  /// Size of the box (max - min).
  #[inline]
  pub fn size(&self) -> Vec3 {
    self.max - self.min
  }
}

impl Default for Aabb {
  fn default() -> Self {
    Self::empty()
  }
}

/// Index buffer with width chosen by vertex count.
///
/// 16-bit indices are used while the vertex count fits the u16 range,
/// 32-bit otherwise.
#[derive(Clone, Debug)]
pub enum IndexBuffer {
  U16(Vec<u16>),
  U32(Vec<u32>),
}

impl IndexBuffer {
  /// Number of indices.
  pub fn len(&self) -> usize {
    match self {
      IndexBuffer::U16(v) => v.len(),
      IndexBuffer::U32(v) => v.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Finished renderer-ready geometry for one chunk.
#[derive(Clone, Debug)]
pub struct MeshOutput {
  /// Deduplicated vertices.
  pub vertices: Vec<Vertex>,
  /// Triangle indices, 3 per triangle.
  pub indices: IndexBuffer,
  /// Bounds of all vertex positions.
  pub bounds: Aabb,
}

impl MeshOutput {
  /// Number of triangles.
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// True if no geometry was generated.
  pub fn is_empty(&self) -> bool {
    self.vertices.is_empty()
  }
}

/// Line-segment list for debug visualization (octree grids, dual grids).
///
/// The core only produces the segment geometry; drawing it is up to the
/// renderer.
#[derive(Clone, Debug, Default)]
pub struct LineList {
  /// Segment endpoints, 2 per segment.
  pub points: Vec<Vec3>,
}

impl LineList {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append one segment.
  #[inline]
  pub fn add_segment(&mut self, a: Vec3, b: Vec3) {
    self.points.push(a);
    self.points.push(b);
  }

  /// Append the 12 edges of a box given its 8 corners in ring order
  /// (bottom ring 0-1-2-3, top ring 4-5-6-7).
  pub fn add_box(&mut self, corners: &[Vec3; 8]) {
    const EDGES: [[usize; 2]; 12] = [
      [0, 1],
      [1, 2],
      [2, 3],
      [3, 0],
      [4, 5],
      [5, 6],
      [6, 7],
      [7, 4],
      [0, 4],
      [1, 5],
      [2, 6],
      [3, 7],
    ];
    for [a, b] in EDGES {
      self.add_segment(corners[a], corners[b]);
    }
  }

  /// Number of segments.
  pub fn segment_count(&self) -> usize {
    self.points.len() / 2
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_aabb_encapsulates_first_point() {
    let mut aabb = Aabb::empty();
    assert!(aabb.is_empty());
    aabb.encapsulate(Vec3::new(1.0, 2.0, 3.0));
    assert!(!aabb.is_empty());
    assert_eq!(aabb.min, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 3.0));
  }

  #[test]
  fn aabb_overlap_touching() {
    let a = Aabb::new(Vec3::ZERO, Vec3::splat(1.0));
    let b = Aabb::new(Vec3::splat(1.0), Vec3::splat(2.0));
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
  }

  #[test]
  fn aabb_overlap_disjoint() {
    let a = Aabb::new(Vec3::ZERO, Vec3::splat(1.0));
    let b = Aabb::new(Vec3::splat(1.5), Vec3::splat(2.0));
    assert!(!a.overlaps(&b));
  }

  #[test]
  fn line_list_box_has_12_edges() {
    let mut lines = LineList::new();
    let c = [
      Vec3::ZERO,
      Vec3::X,
      Vec3::new(1.0, 0.0, 1.0),
      Vec3::Z,
      Vec3::Y,
      Vec3::new(1.0, 1.0, 0.0),
      Vec3::ONE,
      Vec3::new(0.0, 1.0, 1.0),
    ];
    lines.add_box(&c);
    assert_eq!(lines.segment_count(), 12);
  }
}
