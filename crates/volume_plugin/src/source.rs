//! Density sources.
//!
//! A [`VolumeSource`] is the scalar density field the octree samples and the
//! iso-surface triangulator contours. Concrete production sources (3D
//! textures, procedural noise, CSG trees) live outside this crate; the
//! analytic sources here are deterministic fields used by tests and
//! benchmarks, easy to verify against closed-form expectations.

use glam::Vec3;

use crate::types::VolumeSample;

/// Scalar density field over world space.
///
/// Positive density = inside, negative = outside, surface at zero. Sampling
/// happens concurrently from multiple worker threads with no external
/// locking, so implementations must be `Send + Sync` and treat `&self`
/// sampling as read-only.
/// Step used by the default central-difference gradient.
const CENTRAL_DIFFERENCE_EPSILON: f32 = 1e-3;

pub trait VolumeSource: Send + Sync {
  /// Density at a point.
  fn value(&self, position: Vec3) -> f32;

  /// Density plus gradient at a point.
  ///
  /// The default estimates the gradient with central differences; sources
  /// with a closed-form gradient should override it.
  fn value_and_gradient(&self, position: Vec3) -> VolumeSample {
    VolumeSample::new(
      gradient_from_value(self, position, CENTRAL_DIFFERENCE_EPSILON),
      self.value(position),
    )
  }

  /// Scale factor between volume space and world space.
  ///
  /// Used to scale density magnitudes so they are comparable to world-space
  /// distances (cell diagonals) in the far-from-surface tests.
  fn volume_space_to_world_space_factor(&self) -> f32 {
    1.0
  }
}

/// Central-difference gradient for sources that only define `value`.
pub fn gradient_from_value<S: VolumeSource + ?Sized>(src: &S, position: Vec3, epsilon: f32) -> Vec3 {
  let ex = Vec3::new(epsilon, 0.0, 0.0);
  let ey = Vec3::new(0.0, epsilon, 0.0);
  let ez = Vec3::new(0.0, 0.0, epsilon);
  Vec3::new(
    src.value(position + ex) - src.value(position - ex),
    src.value(position + ey) - src.value(position - ey),
    src.value(position + ez) - src.value(position - ez),
  ) / (2.0 * epsilon)
}

/// Sphere density source.
///
/// Density = radius - |p - center|: positive inside, surface at the radius.
#[derive(Clone)]
pub struct SphereSource {
  pub center: Vec3,
  pub radius: f32,
}

impl SphereSource {
  pub fn new(center: Vec3, radius: f32) -> Self {
    Self { center, radius }
  }
}

impl VolumeSource for SphereSource {
  fn value(&self, position: Vec3) -> f32 {
    self.radius - (position - self.center).length()
  }

  fn value_and_gradient(&self, position: Vec3) -> VolumeSample {
    let to_center = self.center - position;
    let distance = to_center.length();
    // Gradient points towards the center (increasing density).
    let gradient = if distance > f32::EPSILON {
      to_center / distance
    } else {
      Vec3::ZERO
    };
    VolumeSample::new(gradient, self.radius - distance)
  }
}

/// Halfspace density source bounded by a plane.
///
/// Density = d - dot(normal, p): positive on the side the normal points away
/// from. `PlaneSource::new(Vec3::Z, 0.5)` puts the surface at z = 0.5 with
/// solid below.
#[derive(Clone)]
pub struct PlaneSource {
  /// Unit plane normal, pointing out of the solid region.
  pub normal: Vec3,
  /// Plane offset along the normal.
  pub d: f32,
}

impl PlaneSource {
  pub fn new(normal: Vec3, d: f32) -> Self {
    Self {
      normal: normal.normalize(),
      d,
    }
  }
}

impl VolumeSource for PlaneSource {
  fn value(&self, position: Vec3) -> f32 {
    self.d - self.normal.dot(position)
  }

  fn value_and_gradient(&self, position: Vec3) -> VolumeSample {
    VolumeSample::new(-self.normal, self.d - self.normal.dot(position))
  }
}

/// Constant density everywhere. No surface anywhere.
#[derive(Clone)]
pub struct ConstantSource {
  pub density: f32,
}

impl ConstantSource {
  pub fn new(density: f32) -> Self {
    Self { density }
  }
}

impl VolumeSource for ConstantSource {
  fn value(&self, _position: Vec3) -> f32 {
    self.density
  }

  fn value_and_gradient(&self, _position: Vec3) -> VolumeSample {
    VolumeSample::new(Vec3::ZERO, self.density)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sphere_sign_convention() {
    let src = SphereSource::new(Vec3::ZERO, 2.0);
    assert!(src.value(Vec3::ZERO) > 0.0, "center is inside");
    assert!(src.value(Vec3::new(3.0, 0.0, 0.0)) < 0.0, "outside is negative");
    assert!(src.value(Vec3::new(2.0, 0.0, 0.0)).abs() < 1e-6, "surface at radius");
  }

  #[test]
  fn sphere_gradient_points_inward() {
    let src = SphereSource::new(Vec3::ZERO, 2.0);
    let sample = src.value_and_gradient(Vec3::new(1.0, 0.0, 0.0));
    // Density increases towards the center.
    assert!(sample.gradient.x < 0.0);
  }

  #[test]
  fn plane_surface_position() {
    let src = PlaneSource::new(Vec3::Z, 0.5);
    assert!(src.value(Vec3::new(0.3, 0.3, 0.0)) > 0.0, "below plane is solid");
    assert!(src.value(Vec3::new(0.3, 0.3, 1.0)) < 0.0, "above plane is air");
    assert!(src.value(Vec3::new(0.0, 0.0, 0.5)).abs() < 1e-6);
  }

  #[test]
  fn central_difference_matches_analytic_gradient() {
    let src = PlaneSource::new(Vec3::Z, 0.5);
    let numeric = gradient_from_value(&src, Vec3::splat(0.25), 1e-3);
    let analytic = src.value_and_gradient(Vec3::splat(0.25)).gradient;
    assert!((numeric - analytic).length() < 1e-3);
  }

  /// Sphere field defined by `value` alone, relying on the trait's default
  /// gradient.
  struct ValueOnlySphere {
    radius: f32,
  }

  impl VolumeSource for ValueOnlySphere {
    fn value(&self, position: Vec3) -> f32 {
      self.radius - position.length()
    }
  }

  #[test]
  fn default_gradient_is_estimated_from_values() {
    let numeric = ValueOnlySphere { radius: 2.0 };
    let analytic = SphereSource::new(Vec3::ZERO, 2.0);
    let p = Vec3::new(0.7, -0.3, 0.4);
    let a = numeric.value_and_gradient(p);
    let b = analytic.value_and_gradient(p);
    assert!((a.density - b.density).abs() < 1e-6);
    assert!((a.gradient - b.gradient).length() < 1e-3);
  }
}
