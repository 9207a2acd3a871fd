//! Camera view parameters for screen-space LOD selection.

use glam::Vec3;

/// The view state [`crate::chunk::Chunk::frame_started`] projects geometric
/// error through: world-space position, vertical field of view in radians
/// and the viewport height in pixels.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
  pub position: Vec3,
  /// Vertical field of view in radians.
  pub fov_y: f32,
  /// Viewport height in pixels.
  pub viewport_height: f32,
}

impl Camera {
  pub fn new(position: Vec3, fov_y: f32, viewport_height: f32) -> Self {
    Self {
      position,
      fov_y,
      viewport_height,
    }
  }
}
