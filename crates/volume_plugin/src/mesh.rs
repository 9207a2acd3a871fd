//! Triangle accumulation with exact-equality vertex welding.
//!
//! Independent triangulation calls (adjacent dual cells, skirt faces) emit
//! vertices at bit-identical positions; welding them into one index keeps
//! the output watertight and compact. Welding is exact, not epsilon-based:
//! two vertices map to the same index iff position and normal have identical
//! bit patterns.

use std::collections::HashMap;

use glam::Vec3;

use crate::chunk::ChunkId;
use crate::types::{Aabb, IndexBuffer, MeshOutput, Vertex};

/// Bit-pattern key for exact vertex welding. NaNs never occur in emitted
/// geometry, so bit equality is the right total order here.
type VertexKey = [u32; 6];

fn vertex_key(position: Vec3, normal: Vec3) -> VertexKey {
  [
    position.x.to_bits(),
    position.y.to_bits(),
    position.z.to_bits(),
    normal.x.to_bits(),
    normal.y.to_bits(),
    normal.z.to_bits(),
  ]
}

/// Accumulates triangles into a deduplicated vertex/index buffer.
#[derive(Default)]
pub struct MeshBuilder {
  vertices: Vec<Vertex>,
  indices: Vec<u32>,
  index_of: HashMap<VertexKey, u32>,
  bounding_box: Aabb,
}

/// Identity of the chunk a mesh-ready notification belongs to.
///
/// A level usually consists of many chunks; the owner tells the listener
/// which region of the volume the geometry covers.
#[derive(Clone, Copy, Debug)]
pub struct MeshOwner {
  pub chunk_id: ChunkId,
  pub from: Vec3,
  pub to: Vec3,
}

/// Per-level mesh-ready notification, caller supplied.
///
/// `in_flight` is the number of other LOD builds still being processed
/// across the whole chunk tree at the time of the call.
pub trait MeshBuilderCallback: Send + Sync {
  fn on_level_ready(
    &self,
    owner: &MeshOwner,
    vertices: &[Vertex],
    indices: &[u32],
    level: usize,
    in_flight: usize,
  );
}

impl MeshBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append one triangle, welding each vertex against everything inserted
  /// so far. Insertion order affects vertex numbering only, never topology.
  pub fn add_triangle(&mut self, v0: Vec3, n0: Vec3, v1: Vec3, n1: Vec3, v2: Vec3, n2: Vec3) {
    for (position, normal) in [(v0, n0), (v1, n1), (v2, n2)] {
      let index = self.add_vertex(position, normal);
      self.indices.push(index);
    }
  }

  fn add_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
    let key = vertex_key(position, normal);
    if let Some(&index) = self.index_of.get(&key) {
      return index;
    }
    let index = self.vertices.len() as u32;
    self.vertices.push(Vertex::new(position, normal));
    self.index_of.insert(key, index);
    self.bounding_box.encapsulate(position);
    index
  }

  /// Number of accumulated triangles.
  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  /// Bounds accumulated during insertion. Empty if nothing was added.
  pub fn bounding_box(&self) -> Aabb {
    self.bounding_box
  }

  /// Materialize the accumulated geometry. 16-bit indices are used while
  /// the vertex count fits; 32-bit otherwise.
  pub fn generate_buffers(&self) -> MeshOutput {
    let indices = if self.vertices.len() <= u16::MAX as usize + 1 {
      IndexBuffer::U16(self.indices.iter().map(|&i| i as u16).collect())
    } else {
      IndexBuffer::U32(self.indices.clone())
    };
    MeshOutput {
      vertices: self.vertices.clone(),
      indices,
      bounds: self.bounding_box,
    }
  }

  /// Invoke a caller-supplied listener with the accumulated geometry.
  /// Purely a notification; builder state is unchanged.
  pub fn execute_callback(
    &self,
    callback: &dyn MeshBuilderCallback,
    owner: MeshOwner,
    level: usize,
    in_flight: usize,
  ) {
    callback.on_level_ready(&owner, &self.vertices, &self.indices, level, in_flight);
  }
}

#[cfg(test)]
#[path = "mesh_test.rs"]
mod mesh_test;
