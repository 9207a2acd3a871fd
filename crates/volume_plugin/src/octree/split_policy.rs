//! Error-driven octree split decision.
//!
//! A cell is subdivided when trilinear interpolation of its 8 corner
//! densities deviates too much from the actual field inside the cell. The
//! deviation is measured at 19 fixed interior points (12 edge midpoints,
//! 6 face centers, the cell center) and normalized by the local gradient
//! magnitude so the accumulated error is comparable to a world-space
//! distance.

use glam::Vec3;

use crate::source::VolumeSource;
use crate::types::VolumeSample;

/// Gradient magnitudes below this floor are clamped before normalizing the
/// interpolation error, keeping flat regions from producing infinite error.
const GRADIENT_EPSILON: f32 = 1.0e-3;

/// Outcome of one split decision.
pub enum SplitDecision {
  /// Subdivide into 8 octants.
  Split,
  /// Stop here; the cell's center sample is handed back for caching.
  Leaf(VolumeSample),
}

/// Stateless split decision function, bound to one source and one minimum
/// cell size.
///
/// Safe to share across concurrent octree builds as long as the bound source
/// tolerates concurrent sampling (which [`VolumeSource`] requires).
pub struct OctreeNodeSplitPolicy<'a> {
  source: &'a dyn VolumeSource,
  min_cell_size: f32,
}

impl<'a> OctreeNodeSplitPolicy<'a> {
  /// Create a policy. `min_cell_size` is the finest allowed cell edge
  /// length; cells at or below it never split.
  pub fn new(source: &'a dyn VolumeSource, min_cell_size: f32) -> Self {
    Self {
      source,
      min_cell_size,
    }
  }

  /// Decide whether the cell `[from, to)` should be subdivided, given the
  /// geometric error budget.
  pub fn decide(&self, from: Vec3, to: Vec3, geometric_error: f32) -> SplitDecision {
    let center = (from + to) * 0.5;

    // Finest resolution reached.
    if to.x - from.x <= self.min_cell_size {
      return SplitDecision::Leaf(self.source.value_and_gradient(center));
    }

    // Cells far from the surface can't contain it; no resolution needed.
    let center_sample = self.source.value_and_gradient(center);
    let diagonal = (to - from).length();
    if center_sample.density.abs() > diagonal * self.source.volume_space_to_world_space_factor() {
      return SplitDecision::Leaf(center_sample);
    }

    // Corner densities in octant order for trilinear reconstruction.
    let corners = [
      self.source.value(from),
      self.source.value(Vec3::new(to.x, from.y, from.z)),
      self.source.value(Vec3::new(to.x, from.y, to.z)),
      self.source.value(Vec3::new(from.x, from.y, to.z)),
      self.source.value(Vec3::new(from.x, to.y, from.z)),
      self.source.value(Vec3::new(to.x, to.y, from.z)),
      self.source.value(to),
      self.source.value(Vec3::new(from.x, to.y, to.z)),
    ];

    // Accumulate interpolation error over the 19 interior sample points,
    // bailing out as soon as the budget is spent.
    let size = to - from;
    let mut error = 0.0f32;
    for &u in &[0.0f32, 0.5, 1.0] {
      for &v in &[0.0f32, 0.5, 1.0] {
        for &w in &[0.0f32, 0.5, 1.0] {
          if u != 0.5 && v != 0.5 && w != 0.5 {
            continue; // corner, interpolation is exact there
          }
          let position = from + Vec3::new(u, v, w) * size;
          let interpolated = trilinear(&corners, u, v, w);
          let actual = self.source.value_and_gradient(position);
          let gradient_magnitude = actual.gradient.length().max(GRADIENT_EPSILON);
          error += (interpolated - actual.density).abs() / gradient_magnitude;
          if error >= geometric_error {
            return SplitDecision::Split;
          }
        }
      }
    }

    SplitDecision::Leaf(center_sample)
  }
}

/// Trilinear interpolation of 8 octant-ordered corner densities at the
/// relative cell position `(u, v, w)` in `[0, 1]^3` (u right, v up, w front).
#[inline]
fn trilinear(corners: &[f32; 8], u: f32, v: f32, w: f32) -> f32 {
  let back_bottom = corners[0] * (1.0 - u) + corners[1] * u;
  let front_bottom = corners[3] * (1.0 - u) + corners[2] * u;
  let back_top = corners[4] * (1.0 - u) + corners[5] * u;
  let front_top = corners[7] * (1.0 - u) + corners[6] * u;
  let bottom = back_bottom * (1.0 - w) + front_bottom * w;
  let top = back_top * (1.0 - w) + front_top * w;
  bottom * (1.0 - v) + top * v
}

#[cfg(test)]
#[path = "split_policy_test.rs"]
mod split_policy_test;
