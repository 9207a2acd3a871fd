//! Iso-surface triangulation of dual cells.
//!
//! [`IsoSurface`] turns one 8-corner dual cell into triangles via Marching
//! Cubes, and one cell face into seam ("skirt") triangles via Marching
//! Squares. Corner samples can be supplied from the octree's cached center
//! values; missing ones are sampled from the bound source on demand.
//!
//! Normals come from the density gradient: the gradient points into the
//! solid, so the surface normal is the negated normalized gradient.

mod tables;

use glam::Vec3;
use smallvec::SmallVec;

use crate::mesh::MeshBuilder;
use crate::source::VolumeSource;
use crate::types::VolumeSample;

use tables::{EDGE_CONNECTIONS, EDGE_TABLE, TRI_TABLE};

/// Which face of a dual cell a Marching-Squares call triangulates.
///
/// Carries the 4 cell-corner indices of that face in ring order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DualCellFace {
  Back,
  Front,
  Left,
  Right,
  Top,
  Bottom,
}

impl DualCellFace {
  /// Cell-corner indices of this face, walked as a closed ring.
  pub const fn ring(self) -> [usize; 4] {
    match self {
      DualCellFace::Back => [0, 1, 5, 4],
      DualCellFace::Front => [3, 2, 6, 7],
      DualCellFace::Left => [0, 3, 7, 4],
      DualCellFace::Right => [1, 2, 6, 5],
      DualCellFace::Top => [4, 5, 6, 7],
      DualCellFace::Bottom => [0, 1, 2, 3],
    }
  }
}

/// Marching Cubes / Marching Squares triangulator bound to one source.
pub struct IsoSurface<'a> {
  source: &'a dyn VolumeSource,
}

impl<'a> IsoSurface<'a> {
  pub fn new(source: &'a dyn VolumeSource) -> Self {
    Self { source }
  }

  /// Resolve the 8 corner samples of a dual cell, sampling the source where
  /// the octree had nothing cached.
  fn resolve_samples(
    &self,
    corners: &[Vec3; 8],
    values: Option<&[Option<VolumeSample>; 8]>,
  ) -> [VolumeSample; 8] {
    std::array::from_fn(|i| {
      match values.and_then(|v| v[i]) {
        Some(sample) => sample,
        None => self.source.value_and_gradient(corners[i]),
      }
    })
  }

  /// Marching Cubes over one 8-corner dual cell.
  ///
  /// Corners are in octant ring order (bottom ring 0-3, top ring 4-7). A
  /// corner is inside the volume when its density is >= 0.
  pub fn add_marching_cubes_triangles(
    &self,
    corners: &[Vec3; 8],
    values: Option<&[Option<VolumeSample>; 8]>,
    builder: &mut MeshBuilder,
  ) {
    let samples = self.resolve_samples(corners, values);

    let mut cube_index = 0usize;
    for (i, sample) in samples.iter().enumerate() {
      if sample.density >= 0.0 {
        cube_index |= 1 << i;
      }
    }

    let edge_mask = EDGE_TABLE[cube_index];
    if edge_mask == 0 {
      return;
    }

    // Interpolate position and gradient at every crossed edge.
    let mut edge_positions = [Vec3::ZERO; 12];
    let mut edge_normals = [Vec3::ZERO; 12];
    for edge in 0..12 {
      if edge_mask & (1 << edge) != 0 {
        let [a, b] = EDGE_CONNECTIONS[edge];
        let (position, normal) =
          interpolate_crossing(corners[a], corners[b], samples[a], samples[b]);
        edge_positions[edge] = position;
        edge_normals[edge] = normal;
      }
    }

    let triangles = &TRI_TABLE[cube_index];
    let mut i = 0;
    while triangles[i] != -1 {
      let e0 = triangles[i] as usize;
      let e1 = triangles[i + 1] as usize;
      let e2 = triangles[i + 2] as usize;
      builder.add_triangle(
        edge_positions[e0],
        edge_normals[e0],
        edge_positions[e1],
        edge_normals[e1],
        edge_positions[e2],
        edge_normals[e2],
      );
      i += 3;
    }
  }

  /// Marching Squares over one face of a dual cell, emitting in-plane seam
  /// triangles covering the solid part of the face.
  ///
  /// Faces whose nearest corner density exceeds `max_distance` are assumed
  /// not to need a seam and emit nothing. The triangulation depends only on
  /// the face's own 4 ring samples, so the two cells sharing a face produce
  /// coincident seam geometry from either side.
  pub fn add_marching_squares_triangles(
    &self,
    corners: &[Vec3; 8],
    values: Option<&[Option<VolumeSample>; 8]>,
    face: DualCellFace,
    max_distance: f32,
    builder: &mut MeshBuilder,
  ) {
    let samples = self.resolve_samples(corners, values);
    let ring = face.ring();
    let positions: [Vec3; 4] = std::array::from_fn(|i| corners[ring[i]]);
    let ring_samples: [VolumeSample; 4] = std::array::from_fn(|i| samples[ring[i]]);

    // Too far from the surface for a seam to matter.
    let nearest = ring_samples
      .iter()
      .map(|s| s.density.abs())
      .fold(f32::INFINITY, f32::min);
    if nearest > max_distance {
      return;
    }

    // Walk the ring: inside corners and sign-change crossings form the
    // polygon covering the solid region of the face.
    let mut polygon: SmallVec<[(Vec3, Vec3); 6]> = SmallVec::new();
    for i in 0..4 {
      let j = (i + 1) % 4;
      let si = ring_samples[i];
      if si.density >= 0.0 {
        polygon.push((positions[i], normal_of(si.gradient)));
      }
      let sj = ring_samples[j];
      if (si.density >= 0.0) != (sj.density >= 0.0) {
        polygon.push(interpolate_crossing(positions[i], positions[j], si, sj));
      }
    }

    if polygon.len() < 3 {
      return;
    }

    // Fan triangulation; the polygon is convex on the face plane.
    for i in 1..polygon.len() - 1 {
      let (p0, n0) = polygon[0];
      let (p1, n1) = polygon[i];
      let (p2, n2) = polygon[i + 1];
      builder.add_triangle(p0, n0, p1, n1, p2, n2);
    }
  }
}

/// Zero crossing of the density along one edge: lerped position and
/// gradient-derived normal.
#[inline]
fn interpolate_crossing(
  pa: Vec3,
  pb: Vec3,
  sa: VolumeSample,
  sb: VolumeSample,
) -> (Vec3, Vec3) {
  // Branchless: near-equal densities saturate the clamp to an endpoint.
  let t = (sa.density / (sa.density - sb.density)).clamp(0.0, 1.0);
  let position = pa + (pb - pa) * t;
  let gradient = sa.gradient + (sb.gradient - sa.gradient) * t;
  (position, normal_of(gradient))
}

/// Surface normal from a density gradient.
#[inline]
fn normal_of(gradient: Vec3) -> Vec3 {
  let n = -gradient;
  n.normalize_or_zero()
}

#[cfg(test)]
#[path = "isosurface_test.rs"]
mod isosurface_test;
