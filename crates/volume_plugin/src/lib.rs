//! volume_plugin - Framework/engine independent volume-to-mesh extraction
//!
//! This crate turns a scalar density field into renderable triangle meshes.
//! The field is sampled through an adaptive octree whose resolution follows
//! the local interpolation error, contoured with a dual-grid Marching Cubes
//! pass (plus Marching Squares "skirts" that hide cracks between chunks of
//! different detail), and organized into a chunk tree that builds each level
//! of detail on background threads and picks the level to show per frame by
//! projected screen-space error.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use glam::Vec3;
//! use volume_plugin::{Camera, Chunk, ChunkHandler, ChunkParameters, SphereSource};
//!
//! let handler = ChunkHandler::new();
//! let parameters = ChunkParameters::new(
//!   Arc::new(SphereSource::new(Vec3::splat(16.0), 12.0)),
//!   1.5,
//! )
//! .with_max_screen_space_error(25.0);
//!
//! let mut root = Chunk::load(
//!   Vec3::ZERO,
//!   Vec3::splat(32.0),
//!   4,
//!   parameters,
//!   &handler,
//! )?;
//!
//! // Per frame: pick the LOD levels to show.
//! let camera = Camera::new(Vec3::new(0.0, 20.0, 40.0), 1.2, 1080.0);
//! root.frame_started(&camera);
//! # Ok::<(), volume_plugin::LoadError>(())
//! ```

pub mod camera;
pub mod types;

pub use camera::Camera;
pub use types::{Aabb, IndexBuffer, LineList, MeshOutput, Vertex, VolumeSample};

// Density field sampling
pub mod source;
pub use source::{ConstantSource, PlaneSource, SphereSource, VolumeSource};

// Adaptive sampling octree
pub mod octree;
pub use octree::{OctreeNode, OctreeNodeSplitPolicy};

// Dual-cell triangulation
pub mod isosurface;
pub use isosurface::IsoSurface;

// Octree dual contouring
pub mod dualgrid;
pub use dualgrid::DualGridGenerator;

// Triangle accumulation and vertex welding
pub mod mesh;
pub use mesh::{MeshBuilder, MeshBuilderCallback, MeshOwner};

// LOD chunk tree with background builds
pub mod chunk;
pub use chunk::{
  Chunk, ChunkChildren, ChunkHandler, ChunkId, ChunkParameters, ChunkRequest, LoadError,
};
